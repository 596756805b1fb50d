//! Status codes and bus events
//!
//! The hardware reports the outcome of every bus operation as a 5-bit code
//! in the status register. Codes are only ever compared for equality
//! against one canonical table; there is no ordering between them.

use gauge_hal::twi::STATUS_MASK;

/// Masked hardware status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatusCode(u8);

impl BusStatusCode {
    /// Build from a raw status register value, discarding the prescaler bits
    pub const fn from_register(raw: u8) -> Self {
        Self(raw & STATUS_MASK)
    }

    /// The masked code
    pub const fn raw(self) -> u8 {
        self.0
    }
}

// Master states
const START_SENT: u8 = 0x08;
const REPEATED_START_SENT: u8 = 0x10;
const ADDRESS_WRITE_ACK: u8 = 0x18;
const ADDRESS_WRITE_NACK: u8 = 0x20;
const MASTER_DATA_SENT_ACK: u8 = 0x28;
const MASTER_DATA_SENT_NACK: u8 = 0x30;
const ARBITRATION_LOST: u8 = 0x38;
const ADDRESS_READ_ACK: u8 = 0x40;
const ADDRESS_READ_NACK: u8 = 0x48;
const MASTER_DATA_RECEIVED_ACK: u8 = 0x50;
const MASTER_DATA_RECEIVED_NACK: u8 = 0x58;
// Slave states
const SLAVE_ADDRESS_WRITE: u8 = 0x60;
const GENERAL_CALL: u8 = 0x70;
const SLAVE_DATA_RECEIVED_ACK: u8 = 0x80;
const SLAVE_DATA_RECEIVED_NACK: u8 = 0x88;
const SLAVE_STOP_OR_REPEATED_START: u8 = 0xA0;
const SLAVE_ADDRESS_READ: u8 = 0xA8;
const SLAVE_DATA_SENT_ACK: u8 = 0xB8;
const SLAVE_DATA_SENT_NACK: u8 = 0xC0;

/// Semantic meaning of a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    // Master events
    /// START condition transmitted
    StartSent,
    /// REPEATED START condition transmitted
    RepeatedStartSent,
    /// Address + write sent, slave acknowledged
    AddressWriteAckReceived,
    /// Address + write sent, no slave answered
    AddressWriteNackReceived,
    /// Address + read sent, slave acknowledged
    AddressReadAckReceived,
    /// Address + read sent, no slave answered
    AddressReadNackReceived,
    /// Data byte sent, slave acknowledged
    MasterByteSentAck,
    /// Data byte sent, slave refused it
    MasterByteSentNack,
    /// Data byte received, ACK returned
    MasterByteReceivedAckSent,
    /// Data byte received, NACK returned
    MasterByteReceivedNackSent,
    /// Another master won the bus
    ArbitrationLost,

    // Slave events
    /// Own address + write received, ACK returned
    SlaveAddressedForWrite,
    /// Own address + read received, ACK returned
    SlaveAddressedForRead,
    /// General call address received, ACK returned
    GeneralCallAddressed,
    /// Data byte received while addressed, ACK returned
    SlaveByteReceivedAckSent,
    /// Data byte received while addressed, NACK returned
    SlaveByteReceivedNackSent,
    /// Data byte transmitted, master acknowledged
    SlaveByteSentAckReceived,
    /// Data byte transmitted, master NACKed (end of read)
    SlaveByteSentNackReceived,
    /// STOP or REPEATED START seen while addressed
    SlaveStopOrRepeatedStartReceived,

    /// Status code matched nothing in the table
    Unhandled(BusStatusCode),
}

/// The one status-to-event table
const STATUS_TABLE: [(u8, BusEvent); 19] = [
    (START_SENT, BusEvent::StartSent),
    (REPEATED_START_SENT, BusEvent::RepeatedStartSent),
    (ADDRESS_WRITE_ACK, BusEvent::AddressWriteAckReceived),
    (ADDRESS_WRITE_NACK, BusEvent::AddressWriteNackReceived),
    (MASTER_DATA_SENT_ACK, BusEvent::MasterByteSentAck),
    (MASTER_DATA_SENT_NACK, BusEvent::MasterByteSentNack),
    (ARBITRATION_LOST, BusEvent::ArbitrationLost),
    (ADDRESS_READ_ACK, BusEvent::AddressReadAckReceived),
    (ADDRESS_READ_NACK, BusEvent::AddressReadNackReceived),
    (MASTER_DATA_RECEIVED_ACK, BusEvent::MasterByteReceivedAckSent),
    (MASTER_DATA_RECEIVED_NACK, BusEvent::MasterByteReceivedNackSent),
    (SLAVE_ADDRESS_WRITE, BusEvent::SlaveAddressedForWrite),
    (GENERAL_CALL, BusEvent::GeneralCallAddressed),
    (SLAVE_DATA_RECEIVED_ACK, BusEvent::SlaveByteReceivedAckSent),
    (SLAVE_DATA_RECEIVED_NACK, BusEvent::SlaveByteReceivedNackSent),
    (SLAVE_STOP_OR_REPEATED_START, BusEvent::SlaveStopOrRepeatedStartReceived),
    (SLAVE_ADDRESS_READ, BusEvent::SlaveAddressedForRead),
    (SLAVE_DATA_SENT_ACK, BusEvent::SlaveByteSentAckReceived),
    (SLAVE_DATA_SENT_NACK, BusEvent::SlaveByteSentNackReceived),
];

impl BusEvent {
    /// Classify a status code
    pub fn from_status(code: BusStatusCode) -> Self {
        STATUS_TABLE
            .iter()
            .find(|(raw, _)| *raw == code.raw())
            .map(|(_, event)| *event)
            .unwrap_or(BusEvent::Unhandled(code))
    }

    /// Status code that produces this event
    ///
    /// `Unhandled` maps back to the code it was built from.
    pub fn status_code(self) -> BusStatusCode {
        if let BusEvent::Unhandled(code) = self {
            return code;
        }
        STATUS_TABLE
            .iter()
            .find(|(_, event)| *event == self)
            .map(|(raw, _)| BusStatusCode(*raw))
            .unwrap_or(BusStatusCode(STATUS_MASK))
    }

    /// Returns true for events reported while acting as bus master
    pub fn is_master_event(&self) -> bool {
        matches!(
            self,
            BusEvent::StartSent
                | BusEvent::RepeatedStartSent
                | BusEvent::AddressWriteAckReceived
                | BusEvent::AddressWriteNackReceived
                | BusEvent::AddressReadAckReceived
                | BusEvent::AddressReadNackReceived
                | BusEvent::MasterByteSentAck
                | BusEvent::MasterByteSentNack
                | BusEvent::MasterByteReceivedAckSent
                | BusEvent::MasterByteReceivedNackSent
                | BusEvent::ArbitrationLost
        )
    }

    /// Returns true for events reported while addressed as slave
    pub fn is_slave_event(&self) -> bool {
        !self.is_master_event() && !matches!(self, BusEvent::Unhandled(_))
    }
}

/// Outcome of a bus primitive
///
/// `Deferred` is not a bus event: it only says the operation was armed and
/// its event will surface in the interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// Hardware finished, this is what it reported
    Event(BusEvent),
    /// Operation armed, completion goes to the interrupt path
    Deferred,
}

impl Completion {
    /// The event, if the operation completed synchronously
    pub fn event(self) -> Option<BusEvent> {
        match self {
            Completion::Event(event) => Some(event),
            Completion::Deferred => None,
        }
    }

    /// Check for a specific synchronous outcome
    pub fn is(self, expected: BusEvent) -> bool {
        self == Completion::Event(expected)
    }
}
