//! Bus transaction engine
//!
//! One method per primitive bus event. The engine has no transaction state
//! of its own: it composes the control word, starts the operation, and in
//! [`Mode::Blocking`] waits for the hardware and maps the status register
//! through the status table. Sequencing start, address, data and stop is
//! up to the caller (see [`crate::master`] and [`crate::slave`]).

use gauge_hal::twi::{control, TwiConfig, TwiRegisters, GENERAL_CALL_ENABLE};

use crate::status::{BusEvent, BusStatusCode, Completion};
use crate::wait::{CompletionWait, Forever};

/// Largest 7-bit bus address
const MAX_ADDRESS: u8 = 0x7F;

/// Errors from the engine itself (bus protocol outcomes are [`BusEvent`]s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TwiError {
    /// Invalid argument: ACK policy, direction or address out of range
    InvalidOperation,
    /// Bit rate cannot be reached with the given CPU clock
    InvalidConfig,
    /// The hardware did not complete within the wait budget
    Timeout,
}

/// Whether a primitive waits for the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Busy-wait and return the decoded event
    Blocking,
    /// Return immediately, the event is read in the interrupt handler
    Deferred,
}

/// Response to a received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckPolicy {
    /// Acknowledge, more bytes wanted
    Ack,
    /// Not acknowledge, this was the last byte
    Nack,
}

impl AckPolicy {
    /// Parse the ACK bit (0 = ACK, 1 = NACK)
    pub fn from_bit(bit: u8) -> Result<Self, TwiError> {
        match bit {
            0 => Ok(AckPolicy::Ack),
            1 => Ok(AckPolicy::Nack),
            _ => Err(TwiError::InvalidOperation),
        }
    }

    fn control_bits(self) -> u8 {
        match self {
            AckPolicy::Ack => control::TWEA,
            AckPolicy::Nack => 0,
        }
    }
}

/// Transfer direction carried in the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits
    Write,
    /// Master receives
    Read,
}

impl Direction {
    /// Parse the R/W bit (0 = write, 1 = read)
    pub fn from_bit(bit: u8) -> Result<Self, TwiError> {
        match bit {
            0 => Ok(Direction::Write),
            1 => Ok(Direction::Read),
            _ => Err(TwiError::InvalidOperation),
        }
    }

    /// The R/W bit
    pub fn bit(self) -> u8 {
        match self {
            Direction::Write => 0,
            Direction::Read => 1,
        }
    }
}

/// Primitive-event driver for one TWI peripheral
pub struct TwiEngine<R, W = Forever> {
    regs: R,
    wait: W,
    interrupt: bool,
}

impl<R: TwiRegisters> TwiEngine<R, Forever> {
    /// Create an engine that waits indefinitely for the hardware
    pub fn new(regs: R) -> Self {
        Self::with_wait(regs, Forever)
    }
}

impl<R: TwiRegisters, W: CompletionWait> TwiEngine<R, W> {
    /// Create an engine with an explicit wait policy
    pub fn with_wait(regs: R, wait: W) -> Self {
        Self {
            regs,
            wait,
            interrupt: false,
        }
    }

    /// Configure the bit rate for master operation
    ///
    /// Prescaler is set to 1 and the bit-rate register computed from the
    /// SCL frequency (clamped to 400 kHz).
    pub fn init_master(&mut self, config: &TwiConfig, cpu_hz: u32) -> Result<(), TwiError> {
        let bit_rate = config.bit_rate(cpu_hz).ok_or(TwiError::InvalidConfig)?;
        self.regs.write_status(0x00);
        self.regs.write_bit_rate(bit_rate);
        debug!("twi: master at {} Hz, TWBR={}", config.frequency, bit_rate);
        Ok(())
    }

    /// Program the own 7-bit slave address
    pub fn init_slave(&mut self, own_address: u8, general_call: bool) -> Result<(), TwiError> {
        if own_address > MAX_ADDRESS {
            return Err(TwiError::InvalidOperation);
        }
        let mut value = own_address << 1;
        if general_call {
            value |= GENERAL_CALL_ENABLE;
        }
        self.regs.write_own_address(value);
        debug!("twi: slave address {=u8:#x}", own_address);
        Ok(())
    }

    /// Route completions to the interrupt from the next primitive on
    pub fn enable_interrupt(&mut self) {
        self.interrupt = true;
    }

    /// Stop raising the interrupt from the next primitive on
    pub fn disable_interrupt(&mut self) {
        self.interrupt = false;
    }

    /// Whether primitives set the interrupt-enable bit
    pub fn interrupt_enabled(&self) -> bool {
        self.interrupt
    }

    /// Transmit a START condition once the bus is free
    pub fn start(&mut self, mode: Mode) -> Result<Completion, TwiError> {
        self.arm(control::TWSTA);
        self.complete(mode)
    }

    /// Transmit a REPEATED START, keeping control of the bus
    pub fn repeated_start(&mut self, mode: Mode) -> Result<Completion, TwiError> {
        self.arm(control::TWSTA);
        self.complete(mode)
    }

    /// Transmit a STOP condition and release the bus
    ///
    /// STOP has no status code. In blocking mode this waits until the
    /// hardware has sent it.
    pub fn stop(&mut self, mode: Mode) -> Result<(), TwiError> {
        self.arm(control::TWSTO);
        if mode == Mode::Blocking {
            self.wait.begin();
            while self.regs.control() & control::TWSTO != 0 {
                if !self.wait.keep_waiting() {
                    warn!("twi: stop timed out");
                    return Err(TwiError::Timeout);
                }
            }
        }
        Ok(())
    }

    /// Transmit a 7-bit slave address with the R/W bit
    pub fn send_address(
        &mut self,
        address: u8,
        direction: Direction,
        mode: Mode,
    ) -> Result<Completion, TwiError> {
        if address > MAX_ADDRESS {
            return Err(TwiError::InvalidOperation);
        }
        self.regs.write_data((address << 1) | direction.bit());
        self.arm(0);
        self.complete(mode)
    }

    /// Transmit a data byte in master transmitter mode
    pub fn send_byte(&mut self, data: u8, mode: Mode) -> Result<Completion, TwiError> {
        self.regs.write_data(data);
        self.arm(0);
        self.complete(mode)
    }

    /// Receive a data byte in master receiver mode
    ///
    /// The last byte of a read must be answered with [`AckPolicy::Nack`].
    /// The byte is available from [`data`](Self::data) once complete.
    pub fn receive_byte(&mut self, ack: AckPolicy, mode: Mode) -> Result<Completion, TwiError> {
        self.arm(ack.control_bits());
        self.complete(mode)
    }

    /// Listen for the own slave address
    pub fn listen(&mut self, mode: Mode) -> Result<Completion, TwiError> {
        self.arm(control::TWEA);
        self.complete(mode)
    }

    /// Receive a data byte in slave receiver mode
    pub fn slave_receive(&mut self, ack: AckPolicy, mode: Mode) -> Result<Completion, TwiError> {
        self.arm(ack.control_bits());
        self.complete(mode)
    }

    /// Transmit a data byte in slave transmitter mode
    pub fn slave_transmit(&mut self, data: u8, mode: Mode) -> Result<Completion, TwiError> {
        self.regs.write_data(data);
        self.arm(control::TWEA);
        self.complete(mode)
    }

    /// Current masked status code
    pub fn status_code(&self) -> BusStatusCode {
        BusStatusCode::from_register(self.regs.status())
    }

    /// Decode the current status, for use from the interrupt handler
    pub fn current_event(&self) -> BusEvent {
        BusEvent::from_status(self.status_code())
    }

    /// Data register (last received byte)
    pub fn data(&self) -> u8 {
        self.regs.data()
    }

    /// Whether the hardware has completed the last operation
    pub fn is_complete(&self) -> bool {
        self.regs.control() & control::TWINT != 0
    }

    /// Borrow the register bank
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutably borrow the register bank
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the register bank
    pub fn release(self) -> R {
        self.regs
    }

    /// Clear the interrupt flag and start an operation
    ///
    /// One composed write: the flag, enable bit, interrupt-enable choice and
    /// the operation bits. Anything not requested (START, STOP, ACK) is off.
    fn arm(&mut self, bits: u8) {
        let mut value = control::TWINT | control::TWEN | bits;
        if self.interrupt {
            value |= control::TWIE;
        }
        self.regs.write_control(value);
    }

    fn complete(&mut self, mode: Mode) -> Result<Completion, TwiError> {
        if mode == Mode::Deferred {
            return Ok(Completion::Deferred);
        }

        self.wait.begin();
        while !self.is_complete() {
            if !self.wait.keep_waiting() {
                warn!("twi: operation timed out");
                return Err(TwiError::Timeout);
            }
        }

        let event = self.current_event();
        trace!("twi: {:?}", event);
        Ok(Completion::Event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimulatedTwi;
    use crate::wait::SpinBudget;
    use gauge_hal::twi::control::*;

    #[test]
    fn test_blocking_start_decodes_status() {
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::StartSent);
        let mut engine = TwiEngine::new(sim);

        let result = engine.start(Mode::Blocking).unwrap();
        assert_eq!(result, Completion::Event(BusEvent::StartSent));
        assert_eq!(engine.registers().control_writes(), &[TWINT | TWSTA | TWEN]);
    }

    #[test]
    fn test_deferred_returns_immediately() {
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::StartSent);
        let mut engine = TwiEngine::new(sim);

        assert_eq!(engine.start(Mode::Deferred).unwrap(), Completion::Deferred);
        // The same operation was armed; its outcome is readable by the ISR
        assert_eq!(engine.registers().control_writes(), &[TWINT | TWSTA | TWEN]);
        assert_eq!(engine.current_event(), BusEvent::StartSent);
    }

    #[test]
    fn test_unexpected_status_is_unhandled() {
        let mut sim = SimulatedTwi::new();
        sim.script_raw(0x00, 0);
        let mut engine = TwiEngine::new(sim);

        let event = engine.start(Mode::Blocking).unwrap().event().unwrap();
        assert!(matches!(event, BusEvent::Unhandled(_)));
    }

    #[test]
    fn test_send_address_encodes_direction() {
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::AddressWriteAckReceived);
        sim.script(BusEvent::AddressReadAckReceived);
        let mut engine = TwiEngine::new(sim);

        engine.send_address(0x50, Direction::Write, Mode::Blocking).unwrap();
        engine.send_address(0x50, Direction::Read, Mode::Blocking).unwrap();
        assert_eq!(engine.registers().transmitted(), &[0xA0, 0xA1]);
        assert_eq!(
            engine.registers().control_writes(),
            &[TWINT | TWEN, TWINT | TWEN]
        );
    }

    #[test]
    fn test_send_address_rejects_wide_address() {
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        assert_eq!(
            engine.send_address(0x80, Direction::Write, Mode::Blocking),
            Err(TwiError::InvalidOperation)
        );
        assert!(engine.registers().control_writes().is_empty());
    }

    #[test]
    fn test_raw_bits_validated() {
        assert_eq!(AckPolicy::from_bit(0), Ok(AckPolicy::Ack));
        assert_eq!(AckPolicy::from_bit(1), Ok(AckPolicy::Nack));
        assert_eq!(AckPolicy::from_bit(2), Err(TwiError::InvalidOperation));
        assert_eq!(Direction::from_bit(1), Ok(Direction::Read));
        assert_eq!(Direction::from_bit(7), Err(TwiError::InvalidOperation));
    }

    #[test]
    fn test_receive_ack_policy_bits() {
        let mut sim = SimulatedTwi::new();
        sim.script_receive(BusEvent::MasterByteReceivedAckSent, 0x11);
        sim.script_receive(BusEvent::MasterByteReceivedNackSent, 0x22);
        let mut engine = TwiEngine::new(sim);

        let first = engine.receive_byte(AckPolicy::Ack, Mode::Blocking).unwrap();
        assert!(first.is(BusEvent::MasterByteReceivedAckSent));
        assert_eq!(engine.data(), 0x11);

        let last = engine.receive_byte(AckPolicy::Nack, Mode::Blocking).unwrap();
        assert!(last.is(BusEvent::MasterByteReceivedNackSent));
        assert_eq!(engine.data(), 0x22);

        assert_eq!(
            engine.registers().control_writes(),
            &[TWINT | TWEN | TWEA, TWINT | TWEN]
        );
    }

    #[test]
    fn test_stop_blocking_waits_for_stop_bit() {
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        engine.stop(Mode::Blocking).unwrap();
        assert_eq!(engine.registers().stop_count(), 1);
        assert_eq!(engine.registers().control() & TWSTO, 0);
    }

    #[test]
    fn test_interrupt_enable_preserved() {
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        engine.enable_interrupt();
        engine.listen(Mode::Deferred).unwrap();
        engine.slave_transmit(0x42, Mode::Deferred).unwrap();
        engine.disable_interrupt();
        engine.listen(Mode::Deferred).unwrap();

        assert_eq!(
            engine.registers().control_writes(),
            &[
                TWINT | TWEA | TWEN | TWIE,
                TWINT | TWEA | TWEN | TWIE,
                TWINT | TWEA | TWEN
            ]
        );
    }

    #[test]
    fn test_timeout_when_hardware_never_completes() {
        let mut engine = TwiEngine::with_wait(SimulatedTwi::new(), SpinBudget::new(100));
        assert_eq!(engine.start(Mode::Blocking), Err(TwiError::Timeout));
    }

    #[test]
    fn test_stop_timeout_when_stop_stuck() {
        let mut sim = SimulatedTwi::new();
        sim.hold_stop();
        let mut engine = TwiEngine::with_wait(sim, SpinBudget::new(10));
        assert_eq!(engine.stop(Mode::Blocking), Err(TwiError::Timeout));
    }

    #[test]
    fn test_init_master_programs_bit_rate() {
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        engine.init_master(&TwiConfig::STANDARD, 8_000_000).unwrap();
        assert_eq!(engine.registers().bit_rate(), 32);

        assert_eq!(
            engine.init_master(&TwiConfig::FAST, 1_000_000),
            Err(TwiError::InvalidConfig)
        );
    }

    #[test]
    fn test_init_slave_programs_address() {
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        engine.init_slave(0x50, false).unwrap();
        assert_eq!(engine.registers().own_address(), 0xA0);

        engine.init_slave(0x50, true).unwrap();
        assert_eq!(engine.registers().own_address(), 0xA1);

        assert_eq!(engine.init_slave(0x90, false), Err(TwiError::InvalidOperation));
    }
}
