//! Slave role: answer device reads one byte per interrupt
//!
//! A remote master first writes the device id it wants, then issues a
//! repeated start and reads the payload back. Each hardware interrupt moves
//! the state machine one step; nothing here loops or blocks.
//!
//! The payload of one read is taken from the [`DeviceSource`] exactly once,
//! when the node is addressed for reading, and then streamed from that
//! snapshot. A value that changes halfway through a transfer therefore never
//! produces a torn float on the master side.

use gauge_hal::twi::TwiRegisters;
use gauge_protocol::{DeviceId, DevicePayload, PayloadBytes};

use crate::engine::{AckPolicy, Mode, TwiEngine, TwiError};
use crate::status::BusEvent;
use crate::wait::CompletionWait;

/// Sent when the master reads without having selected a known device
pub const FILLER_BYTE: u8 = 0xFF;

/// Current values of the devices this node serves
pub trait DeviceSource {
    /// Motor duty cycle in percent
    fn motor_duty_cycle(&self) -> u8;

    /// Acceleration in g
    fn accelerometer_g(&self) -> f32;

    /// Temperature in degrees Celsius
    fn temperature_c(&self) -> f32;

    /// Current value of `device` in its wire shape
    fn payload(&self, device: DeviceId) -> DevicePayload {
        match device {
            DeviceId::Motor => DevicePayload::Byte(self.motor_duty_cycle()),
            DeviceId::Accelerometer => DevicePayload::Float(self.accelerometer_g()),
            DeviceId::TemperatureSensor => DevicePayload::Float(self.temperature_c()),
        }
    }
}

impl<T: DeviceSource + ?Sized> DeviceSource for &T {
    fn motor_duty_cycle(&self) -> u8 {
        (**self).motor_duty_cycle()
    }

    fn accelerometer_g(&self) -> f32 {
        (**self).accelerometer_g()
    }

    fn temperature_c(&self) -> f32 {
        (**self).temperature_c()
    }

    fn payload(&self, device: DeviceId) -> DevicePayload {
        (**self).payload(device)
    }
}

/// Position inside the payload being transmitted
#[derive(Debug, Clone, PartialEq)]
pub struct SlaveTransferCursor {
    device: DeviceId,
    bytes: PayloadBytes,
    offset: usize,
}

impl SlaveTransferCursor {
    /// Start a transfer of one payload snapshot
    pub fn new(device: DeviceId, payload: DevicePayload) -> Self {
        Self {
            device,
            bytes: payload.to_bytes(),
            offset: 0,
        }
    }

    /// Device whose payload is being sent
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Bytes already handed to the hardware
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes of the snapshot not sent yet
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Whether the whole snapshot has been handed out
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next byte of the snapshot
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.offset).copied()?;
        self.offset += 1;
        Some(byte)
    }
}

/// Interrupt entry point of a node
pub trait TwiHandler {
    /// Service one TWI interrupt, returning the event that raised it
    fn on_twi_interrupt(&mut self) -> Result<BusEvent, TwiError>;
}

/// Slave state machine
///
/// Owns the requested device and the transfer cursor; the interrupt handler
/// is the only place it is driven from.
pub struct SlaveResponder<S> {
    source: S,
    requested: Option<DeviceId>,
    cursor: Option<SlaveTransferCursor>,
}

impl<S: DeviceSource> SlaveResponder<S> {
    /// Create an idle responder serving the values of `source`
    ///
    /// Nothing is selected until the master writes a device id.
    pub fn new(source: S) -> Self {
        Self {
            source,
            requested: None,
            cursor: None,
        }
    }

    /// Enable the interrupt and start listening for the own address
    pub fn arm<R, W>(&mut self, engine: &mut TwiEngine<R, W>) -> Result<(), TwiError>
    where
        R: TwiRegisters,
        W: CompletionWait,
    {
        self.requested = None;
        self.cursor = None;
        engine.enable_interrupt();
        engine.listen(Mode::Deferred)?;
        Ok(())
    }

    /// Advance the state machine on the event the hardware just reported
    pub fn on_interrupt<R, W>(&mut self, engine: &mut TwiEngine<R, W>) -> Result<BusEvent, TwiError>
    where
        R: TwiRegisters,
        W: CompletionWait,
    {
        let event = engine.current_event();
        trace!("twi slave: {:?}", event);

        match event {
            BusEvent::SlaveAddressedForWrite | BusEvent::GeneralCallAddressed => {
                engine.slave_receive(AckPolicy::Ack, Mode::Deferred)?;
            }
            BusEvent::SlaveByteReceivedAckSent => {
                let byte = engine.data();
                self.requested = DeviceId::from_byte(byte);
                if self.requested.is_none() {
                    warn!("twi slave: unknown device {=u8:#x}", byte);
                }
                self.cursor = None;
                engine.listen(Mode::Deferred)?;
            }
            BusEvent::SlaveAddressedForRead => {
                let byte = match self.requested {
                    Some(device) => {
                        let mut cursor =
                            SlaveTransferCursor::new(device, self.source.payload(device));
                        let first = cursor.next_byte().unwrap_or(FILLER_BYTE);
                        self.cursor = Some(cursor);
                        first
                    }
                    None => {
                        self.cursor = None;
                        FILLER_BYTE
                    }
                };
                engine.slave_transmit(byte, Mode::Deferred)?;
            }
            BusEvent::SlaveByteSentAckReceived => {
                match self.cursor.as_mut().and_then(SlaveTransferCursor::next_byte) {
                    Some(byte) => {
                        engine.slave_transmit(byte, Mode::Deferred)?;
                    }
                    None => {
                        engine.listen(Mode::Deferred)?;
                    }
                }
            }
            BusEvent::SlaveStopOrRepeatedStartReceived => {
                self.cursor = None;
                engine.listen(Mode::Deferred)?;
            }
            // NACKed byte, cursor left as is
            _ if event.is_slave_event() => {
                engine.listen(Mode::Deferred)?;
            }
            _ => {
                warn!("twi slave: unexpected {:?}", event);
                engine.listen(Mode::Deferred)?;
            }
        }

        Ok(event)
    }

    /// Transfer in progress, if any
    pub fn cursor(&self) -> Option<&SlaveTransferCursor> {
        self.cursor.as_ref()
    }

    /// Device selected by the last write from the master
    pub fn requested_device(&self) -> Option<DeviceId> {
        self.requested
    }

    /// Where payload snapshots are taken from
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::BusStatusCode;
    use crate::testing::SimulatedTwi;
    use core::cell::Cell;
    use gauge_protocol::{DeviceFrame, FrameDecoder, FRAME_END, FRAME_START};
    use proptest::prelude::*;

    struct Readings {
        duty: u8,
        g: Cell<f32>,
        celsius: f32,
        reads: Cell<u32>,
    }

    impl Readings {
        fn new(duty: u8, g: f32, celsius: f32) -> Self {
            Self {
                duty,
                g: Cell::new(g),
                celsius,
                reads: Cell::new(0),
            }
        }
    }

    impl DeviceSource for Readings {
        fn motor_duty_cycle(&self) -> u8 {
            self.reads.set(self.reads.get() + 1);
            self.duty
        }

        fn accelerometer_g(&self) -> f32 {
            self.reads.set(self.reads.get() + 1);
            self.g.get()
        }

        fn temperature_c(&self) -> f32 {
            self.reads.set(self.reads.get() + 1);
            self.celsius
        }
    }

    fn read_sequence(device: u8, sent: usize) -> SimulatedTwi {
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::SlaveAddressedForWrite);
        sim.script_receive(BusEvent::SlaveByteReceivedAckSent, device);
        sim.script(BusEvent::SlaveAddressedForRead);
        for _ in 1..sent {
            sim.script(BusEvent::SlaveByteSentAckReceived);
        }
        sim.script(BusEvent::SlaveStopOrRepeatedStartReceived);
        sim
    }

    /// Arm, then service interrupts until the script runs dry
    fn run<S: DeviceSource>(
        responder: &mut SlaveResponder<S>,
        engine: &mut TwiEngine<SimulatedTwi>,
    ) -> usize {
        responder.arm(engine).unwrap();
        let mut interrupts = 0;
        while engine.is_complete() {
            responder.on_interrupt(engine).unwrap();
            interrupts += 1;
        }
        interrupts
    }

    /// Wrap bytes a slave sent into a host frame and decode it
    fn decode(device: DeviceId, payload: &[u8]) -> Option<DeviceFrame> {
        let mut decoder = FrameDecoder::new();
        let mut wire = std::vec![FRAME_START, device.to_byte()];
        wire.extend_from_slice(payload);
        wire.push(FRAME_END);
        decoder.feed_bytes(&wire)
    }

    #[test]
    fn test_accelerometer_read_streams_one_snapshot() {
        let readings = Readings::new(0, 0.5, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut engine = TwiEngine::new(read_sequence(0x02, 4));

        let interrupts = run(&mut responder, &mut engine);

        assert_eq!(interrupts, 7);
        assert_eq!(engine.registers().transmitted(), &0.5f32.to_le_bytes());
        assert_eq!(readings.reads.get(), 1);
        assert_eq!(responder.cursor(), None);
        assert_eq!(responder.requested_device(), Some(DeviceId::Accelerometer));
    }

    #[test]
    fn test_value_change_mid_transfer_not_torn() {
        let readings = Readings::new(0, -0.25, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut engine = TwiEngine::new(read_sequence(0x02, 4));

        responder.arm(&mut engine).unwrap();
        // write, device byte, read address: first byte out
        for _ in 0..3 {
            responder.on_interrupt(&mut engine).unwrap();
        }
        assert_eq!(responder.cursor().map(|c| c.offset()), Some(1));

        readings.g.set(0.875);
        while engine.is_complete() {
            responder.on_interrupt(&mut engine).unwrap();
        }

        assert_eq!(engine.registers().transmitted(), &(-0.25f32).to_le_bytes());
    }

    #[test]
    fn test_motor_read_single_byte() {
        let readings = Readings::new(64, 0.0, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut engine = TwiEngine::new(read_sequence(0x01, 1));

        run(&mut responder, &mut engine);
        assert_eq!(engine.registers().transmitted(), &[64]);
    }

    #[test]
    fn test_unknown_device_sends_filler() {
        let readings = Readings::new(0, 0.0, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut engine = TwiEngine::new(read_sequence(0x09, 1));

        run(&mut responder, &mut engine);
        assert_eq!(engine.registers().transmitted(), &[FILLER_BYTE]);
        assert_eq!(readings.reads.get(), 0);
        assert_eq!(responder.requested_device(), None);
    }

    #[test]
    fn test_read_without_select_sends_filler() {
        let readings = Readings::new(0, 0.0, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::SlaveAddressedForRead);
        sim.script(BusEvent::SlaveByteSentNackReceived);
        let mut engine = TwiEngine::new(sim);

        run(&mut responder, &mut engine);
        assert_eq!(engine.registers().transmitted(), &[FILLER_BYTE]);
    }

    #[test]
    fn test_extra_ack_after_payload_sends_nothing() {
        let readings = Readings::new(12, 0.0, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        // Master acknowledges the only motor byte and clocks once more
        let mut engine = TwiEngine::new(read_sequence(0x01, 2));

        run(&mut responder, &mut engine);
        assert_eq!(engine.registers().transmitted(), &[12]);
    }

    #[test]
    fn test_requested_device_kept_across_stop() {
        let readings = Readings::new(0, 0.0, 36.6);
        let mut responder = SlaveResponder::new(&readings);
        let mut sim = read_sequence(0x03, 4);
        // Second read without a new device selection
        sim.script(BusEvent::SlaveAddressedForRead);
        sim.script_all(&[BusEvent::SlaveByteSentAckReceived; 3]);
        sim.script(BusEvent::SlaveStopOrRepeatedStartReceived);
        let mut engine = TwiEngine::new(sim);

        run(&mut responder, &mut engine);

        let sent = engine.registers().transmitted();
        assert_eq!(sent.len(), 8);
        assert_eq!(&sent[..4], &sent[4..]);
        assert_eq!(readings.reads.get(), 2);
    }

    #[test]
    fn test_foreign_events_relisten() {
        use gauge_hal::twi::control::{TWEA, TWEN, TWIE, TWINT};

        let readings = Readings::new(0, 0.0, 36.6);
        let mut responder = SlaveResponder::new(&readings);
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::SlaveAddressedForWrite);
        sim.script_receive(BusEvent::SlaveByteReceivedAckSent, 0x03);
        sim.script(BusEvent::SlaveAddressedForRead);
        sim.script(BusEvent::ArbitrationLost);
        sim.script(BusEvent::Unhandled(BusStatusCode::from_register(0x00)));
        let mut engine = TwiEngine::new(sim);

        responder.arm(&mut engine).unwrap();
        for _ in 0..3 {
            responder.on_interrupt(&mut engine).unwrap();
        }
        assert_eq!(responder.cursor().map(|c| c.remaining()), Some(3));

        assert_eq!(
            responder.on_interrupt(&mut engine),
            Ok(BusEvent::ArbitrationLost)
        );
        assert_eq!(
            responder.on_interrupt(&mut engine),
            Ok(BusEvent::Unhandled(BusStatusCode::from_register(0x00)))
        );

        // Transfer state untouched, only the first byte went out
        assert_eq!(responder.cursor().map(|c| c.remaining()), Some(3));
        assert_eq!(responder.requested_device(), Some(DeviceId::TemperatureSensor));
        assert_eq!(engine.registers().transmitted(), &36.6f32.to_le_bytes()[..1]);
        let writes = engine.registers().control_writes();
        assert_eq!(writes.len(), 6);
        assert_eq!(writes[4], TWINT | TWEA | TWEN | TWIE);
        assert_eq!(writes[5], TWINT | TWEA | TWEN | TWIE);
    }

    #[test]
    fn test_nacked_byte_relistens() {
        let readings = Readings::new(0, 0.75, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::SlaveAddressedForWrite);
        sim.script_receive(BusEvent::SlaveByteReceivedAckSent, 0x02);
        sim.script(BusEvent::SlaveAddressedForRead);
        sim.script(BusEvent::SlaveByteSentNackReceived);
        let mut engine = TwiEngine::new(sim);

        let interrupts = run(&mut responder, &mut engine);
        assert_eq!(interrupts, 4);
        assert_eq!(responder.cursor().map(|c| c.offset()), Some(1));
        assert_eq!(engine.registers().transmitted(), &0.75f32.to_le_bytes()[..1]);
        let last = *engine.registers().control_writes().last().unwrap();
        assert_ne!(last & gauge_hal::twi::control::TWEA, 0);
    }

    #[test]
    fn test_interrupts_enabled_on_every_write() {
        let readings = Readings::new(1, 0.0, 0.0);
        let mut responder = SlaveResponder::new(&readings);
        let mut engine = TwiEngine::new(read_sequence(0x01, 1));

        run(&mut responder, &mut engine);
        assert!(engine
            .registers()
            .control_writes()
            .iter()
            .all(|w| w & gauge_hal::twi::control::TWIE != 0));
    }

    #[test]
    fn test_round_trip_to_host_decoder() {
        for value in [0.0f32, -1.0, 1.0, 0.1234] {
            let readings = Readings::new(0, 0.0, value);
            let mut responder = SlaveResponder::new(&readings);
            let mut engine = TwiEngine::new(read_sequence(0x03, 4));
            run(&mut responder, &mut engine);

            let frame = decode(DeviceId::TemperatureSensor, engine.registers().transmitted())
                .unwrap();
            assert_eq!(frame.device, DeviceId::TemperatureSensor);
            assert_eq!(frame.payload.as_f32().unwrap().to_bits(), value.to_bits());
        }
    }

    proptest! {
        #[test]
        fn test_round_trip_preserves_bits(bits in any::<u32>()) {
            let value = f32::from_bits(bits);
            prop_assume!(value.is_finite());

            let readings = Readings::new(0, value, 0.0);
            let mut responder = SlaveResponder::new(&readings);
            let mut engine = TwiEngine::new(read_sequence(0x02, 4));
            run(&mut responder, &mut engine);

            let frame = decode(DeviceId::Accelerometer, engine.registers().transmitted());
            prop_assert!(frame.is_some());
            let payload = frame.unwrap().payload;
            prop_assert_eq!(payload.as_f32().unwrap().to_bits(), bits);
        }
    }
}
