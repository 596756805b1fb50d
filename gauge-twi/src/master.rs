//! Master role: read one logical device from a peer node
//!
//! ```text
//! START, ADDR+W, <id>, RSTART, ADDR+R, <payload_length bytes>, STOP
//! ```
//!
//! Every step is blocking and checked against the one event it may produce.

use gauge_hal::twi::TwiRegisters;
use gauge_protocol::{DeviceId, DevicePayload, PayloadBytes};

use crate::engine::{AckPolicy, Direction, Mode, TwiEngine, TwiError};
use crate::status::{BusEvent, Completion};
use crate::wait::CompletionWait;

/// Step of a device read, for error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionStep {
    /// Sending START
    Start,
    /// Addressing the peer for write
    AddressWrite,
    /// Sending the device id
    DeviceSelect,
    /// Sending the repeated START
    RepeatedStart,
    /// Addressing the peer for read
    AddressRead,
    /// Receiving the payload byte at this index
    Receive(u8),
}

/// Device read failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    /// The engine rejected an argument or the hardware timed out
    Bus(TwiError),
    /// The bus reported something other than the expected event
    Unexpected {
        /// Step that went wrong
        step: TransactionStep,
        /// `None` if the step did not complete synchronously
        event: Option<BusEvent>,
    },
}

impl From<TwiError> for ReadError {
    fn from(err: TwiError) -> Self {
        ReadError::Bus(err)
    }
}

/// Read `device` from the slave at 7-bit address `peer`
///
/// Blocks for the whole transaction. Once START has been sent, STOP is
/// always sent before returning, whether the read succeeded or not. The last
/// payload byte is NACKed. No retries.
pub fn read_device<R, W>(
    engine: &mut TwiEngine<R, W>,
    peer: u8,
    device: DeviceId,
) -> Result<DevicePayload, ReadError>
where
    R: TwiRegisters,
    W: CompletionWait,
{
    if peer > 0x7F {
        return Err(ReadError::Bus(TwiError::InvalidOperation));
    }

    expect(
        engine.start(Mode::Blocking)?,
        TransactionStep::Start,
        BusEvent::StartSent,
    )?;

    let result = transfer(engine, peer, device);
    let stopped = engine.stop(Mode::Blocking);

    match result {
        Ok(payload) => {
            stopped?;
            trace!("twi: read {:?} from {=u8:#x}", device, peer);
            Ok(payload)
        }
        Err(err) => {
            warn!("twi: read {:?} from {=u8:#x} failed: {:?}", device, peer, err);
            Err(err)
        }
    }
}

/// Everything between START and STOP
fn transfer<R, W>(
    engine: &mut TwiEngine<R, W>,
    peer: u8,
    device: DeviceId,
) -> Result<DevicePayload, ReadError>
where
    R: TwiRegisters,
    W: CompletionWait,
{
    expect(
        engine.send_address(peer, Direction::Write, Mode::Blocking)?,
        TransactionStep::AddressWrite,
        BusEvent::AddressWriteAckReceived,
    )?;
    expect(
        engine.send_byte(device.to_byte(), Mode::Blocking)?,
        TransactionStep::DeviceSelect,
        BusEvent::MasterByteSentAck,
    )?;
    expect(
        engine.repeated_start(Mode::Blocking)?,
        TransactionStep::RepeatedStart,
        BusEvent::RepeatedStartSent,
    )?;
    expect(
        engine.send_address(peer, Direction::Read, Mode::Blocking)?,
        TransactionStep::AddressRead,
        BusEvent::AddressReadAckReceived,
    )?;

    let len = device.payload_length();
    let mut bytes = PayloadBytes::new();
    for index in 0..len {
        let step = TransactionStep::Receive(index as u8);
        let (ack, expected) = if index + 1 == len {
            (AckPolicy::Nack, BusEvent::MasterByteReceivedNackSent)
        } else {
            (AckPolicy::Ack, BusEvent::MasterByteReceivedAckSent)
        };
        expect(engine.receive_byte(ack, Mode::Blocking)?, step, expected)?;
        bytes
            .push(engine.data())
            .map_err(|_| ReadError::Unexpected { step, event: None })?;
    }

    DevicePayload::from_bytes(device, &bytes).ok_or(ReadError::Unexpected {
        step: TransactionStep::Receive(len.saturating_sub(1) as u8),
        event: None,
    })
}

fn expect(
    completion: Completion,
    step: TransactionStep,
    expected: BusEvent,
) -> Result<(), ReadError> {
    if completion.is(expected) {
        Ok(())
    } else {
        Err(ReadError::Unexpected {
            step,
            event: completion.event(),
        })
    }
}
