//! Sensor node: serve device readings to the gateway
//!
//! The node owns the bus engine and the slave state machine. The chip
//! support calls [`TwiHandler::on_twi_interrupt`] from the TWI interrupt
//! vector; nothing else touches either.

use gauge_hal::TwiRegisters;
use gauge_twi::{
    BusEvent, CompletionWait, DeviceSource, Forever, SlaveResponder, TwiEngine, TwiError,
    TwiHandler,
};

use crate::config::NodeConfig;

/// Slave-side bus node
pub struct SensorNode<R, S, W = Forever> {
    engine: TwiEngine<R, W>,
    responder: SlaveResponder<S>,
}

impl<R, S, W> SensorNode<R, S, W>
where
    R: TwiRegisters,
    S: DeviceSource,
    W: CompletionWait,
{
    pub fn new(engine: TwiEngine<R, W>, source: S) -> Self {
        Self {
            engine,
            responder: SlaveResponder::new(source),
        }
    }

    /// Program the own address and start listening with interrupts enabled
    pub fn start(&mut self, config: &NodeConfig) -> Result<(), TwiError> {
        self.engine
            .init_slave(config.own_address, config.general_call)?;
        self.responder.arm(&mut self.engine)?;
        debug!("node: listening at {=u8:#x}", config.own_address);
        Ok(())
    }

    pub fn responder(&self) -> &SlaveResponder<S> {
        &self.responder
    }

    pub fn engine(&self) -> &TwiEngine<R, W> {
        &self.engine
    }
}

impl<R, S, W> TwiHandler for SensorNode<R, S, W>
where
    R: TwiRegisters,
    S: DeviceSource,
    W: CompletionWait,
{
    fn on_twi_interrupt(&mut self) -> Result<BusEvent, TwiError> {
        self.responder.on_interrupt(&mut self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::SharedReadings;
    use gauge_protocol::{DeviceId, DevicePayload};
    use gauge_twi::testing::SimulatedTwi;
    use gauge_twi::{read_device, Mode};

    /// Service interrupts until the scripted master is done
    fn drain<H: TwiHandler>(node: &mut H, pending: impl Fn(&H) -> bool) -> usize {
        let mut count = 0;
        while pending(&*node) {
            node.on_twi_interrupt().unwrap();
            count += 1;
        }
        count
    }

    #[test]
    fn test_start_programs_address_and_listens() {
        let readings = SharedReadings::new();
        let mut node = SensorNode::new(TwiEngine::new(SimulatedTwi::new()), &readings);
        node.start(&NodeConfig::default()).unwrap();

        let sim = node.engine().registers();
        assert_eq!(sim.own_address(), 0xA0);
        assert_eq!(sim.control_writes().len(), 1);
        assert!(node.engine().interrupt_enabled());
    }

    #[test]
    fn test_serves_latest_temperature() {
        let readings = SharedReadings::new();
        readings.set_temperature_c(31.5);

        let mut sim = SimulatedTwi::new();
        sim.script(BusEvent::SlaveAddressedForWrite);
        sim.script_receive(BusEvent::SlaveByteReceivedAckSent, DeviceId::TemperatureSensor.to_byte());
        sim.script(BusEvent::SlaveStopOrRepeatedStartReceived);
        sim.script(BusEvent::SlaveAddressedForRead);
        sim.script_all(&[BusEvent::SlaveByteSentAckReceived; 3]);
        sim.script(BusEvent::SlaveStopOrRepeatedStartReceived);

        let mut node = SensorNode::new(TwiEngine::new(sim), &readings);
        node.start(&NodeConfig::default()).unwrap();
        let interrupts = drain(&mut node, |n| n.engine().is_complete());

        assert_eq!(interrupts, 8);
        assert_eq!(
            node.engine().registers().transmitted(),
            &31.5f32.to_le_bytes()
        );
    }

    #[test]
    fn test_rejects_wide_address() {
        let readings = SharedReadings::new();
        let mut node = SensorNode::new(TwiEngine::new(SimulatedTwi::new()), &readings);
        let config = NodeConfig {
            own_address: 0xA0,
            general_call: false,
        };
        assert_eq!(node.start(&config), Err(TwiError::InvalidOperation));
    }

    /// Master side and slave side agree on the shape of every device
    #[test]
    fn test_payload_sizes_agree_with_master() {
        for device in DeviceId::ALL {
            let readings = SharedReadings::new();
            readings.set_motor_duty_cycle(42);
            readings.set_accelerometer_g(-0.75);
            readings.set_temperature_c(19.25);

            // Slave: capture what it sends for this device
            let len = device.payload_length();
            let mut slave_sim = SimulatedTwi::new();
            slave_sim.script(BusEvent::SlaveAddressedForWrite);
            slave_sim.script_receive(BusEvent::SlaveByteReceivedAckSent, device.to_byte());
            slave_sim.script(BusEvent::SlaveAddressedForRead);
            for _ in 1..len {
                slave_sim.script(BusEvent::SlaveByteSentAckReceived);
            }
            slave_sim.script(BusEvent::SlaveByteSentNackReceived);
            let mut node = SensorNode::new(TwiEngine::new(slave_sim), &readings);
            node.start(&NodeConfig::default()).unwrap();
            drain(&mut node, |n| n.engine().is_complete());
            let sent = node.engine().registers().transmitted().to_vec();
            assert_eq!(sent.len(), len);

            // Master: feed those bytes back
            let mut master_sim = SimulatedTwi::new();
            master_sim.script_all(&[
                BusEvent::StartSent,
                BusEvent::AddressWriteAckReceived,
                BusEvent::MasterByteSentAck,
                BusEvent::RepeatedStartSent,
                BusEvent::AddressReadAckReceived,
            ]);
            for (i, byte) in sent.iter().enumerate() {
                let event = if i + 1 == len {
                    BusEvent::MasterByteReceivedNackSent
                } else {
                    BusEvent::MasterByteReceivedAckSent
                };
                master_sim.script_receive(event, *byte);
            }
            let mut master = TwiEngine::new(master_sim);
            let payload = read_device(&mut master, 0x50, device).unwrap();
            assert_eq!(payload, readings.payload(device));
        }
    }

    #[test]
    fn test_deferred_mode_never_blocks() {
        // A listening node with nothing on the bus returns immediately
        let mut engine = TwiEngine::new(SimulatedTwi::new());
        assert_eq!(
            engine.listen(Mode::Deferred),
            Ok(gauge_twi::Completion::Deferred)
        );
        assert!(!engine.is_complete());
    }

    #[test]
    fn test_repeated_reads_follow_updates() {
        let readings = SharedReadings::new();
        let mut sim = SimulatedTwi::new();
        for _ in 0..2 {
            sim.script(BusEvent::SlaveAddressedForWrite);
            sim.script_receive(BusEvent::SlaveByteReceivedAckSent, DeviceId::Motor.to_byte());
            sim.script(BusEvent::SlaveAddressedForRead);
            sim.script(BusEvent::SlaveByteSentNackReceived);
            sim.script(BusEvent::SlaveStopOrRepeatedStartReceived);
        }
        let mut node = SensorNode::new(TwiEngine::new(sim), &readings);

        readings.set_motor_duty_cycle(30);
        node.start(&NodeConfig::default()).unwrap();
        for _ in 0..5 {
            node.on_twi_interrupt().unwrap();
        }
        readings.set_motor_duty_cycle(70);
        drain(&mut node, |n| n.engine().is_complete());

        assert_eq!(node.engine().registers().transmitted(), &[30, 70]);
        assert_eq!(
            node.responder().source().payload(DeviceId::Motor),
            DevicePayload::Byte(70)
        );
    }
}
