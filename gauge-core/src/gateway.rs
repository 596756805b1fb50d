//! Gateway node: poll the sensor node and forward readings to the host
//!
//! ```text
//! sensor node ──TWI──► gateway ──UART──► host display
//!              read_device       |id payload\r
//! ```
//!
//! One poll cycle reads every configured device once. A device that cannot
//! be read is logged and skipped; the cycle goes on with the next one. A
//! serial write failure ends the cycle, since the host link is shared by
//! every device.

use gauge_hal::{TwiRegisters, UartTx};
use gauge_protocol::{DeviceFrame, DeviceId, FrameError, MAX_FRAME_SIZE};
use gauge_twi::{read_device, CompletionWait, ReadError, TwiEngine, TwiError};

use crate::config::GatewayConfig;

/// Gateway failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatewayError<E> {
    /// Bus could not be configured
    Twi(TwiError),
    /// Reading does not fit a host frame
    Frame(FrameError),
    /// Host link write failed
    Uart(E),
}

impl<E> From<TwiError> for GatewayError<E> {
    fn from(err: TwiError) -> Self {
        GatewayError::Twi(err)
    }
}

impl<E> From<FrameError> for GatewayError<E> {
    fn from(err: FrameError) -> Self {
        GatewayError::Frame(err)
    }
}

/// Outcome of one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Frames written to the host
    pub forwarded: u8,
    /// Device reads that failed
    pub failed: u8,
    /// Last read failure, if any
    pub last_error: Option<ReadError>,
}

/// Bus master forwarding device readings to the host
pub struct Gateway<R, W, U> {
    engine: TwiEngine<R, W>,
    uart: U,
    config: GatewayConfig,
}

impl<R, W, U> Gateway<R, W, U>
where
    R: TwiRegisters,
    W: CompletionWait,
    U: UartTx,
{
    pub fn new(engine: TwiEngine<R, W>, uart: U, config: GatewayConfig) -> Self {
        Self {
            engine,
            uart,
            config,
        }
    }

    /// Configure the bus for master operation
    pub fn init(&mut self) -> Result<(), GatewayError<U::Error>> {
        self.engine.init_master(&self.config.twi, self.config.cpu_hz)?;
        debug!(
            "gateway: polling node {=u8:#x}, {} devices",
            self.config.peer_address,
            self.config.devices.len()
        );
        Ok(())
    }

    /// Read one device from the peer node
    pub fn read(&mut self, device: DeviceId) -> Result<DeviceFrame, ReadError> {
        let payload = read_device(&mut self.engine, self.config.peer_address, device)?;
        Ok(DeviceFrame { device, payload })
    }

    /// Encode a frame and write it to the host link
    pub fn forward(&mut self, frame: &DeviceFrame) -> Result<(), GatewayError<U::Error>> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buffer)?;
        self.uart
            .write_blocking(&buffer[..len])
            .map_err(GatewayError::Uart)?;
        Ok(())
    }

    /// Read every configured device once and forward what was read
    pub fn poll_once(&mut self) -> Result<PollReport, GatewayError<U::Error>> {
        let mut report = PollReport::default();

        for i in 0..self.config.devices.len() {
            let device = self.config.devices[i];
            match self.read(device) {
                Ok(frame) => {
                    self.forward(&frame)?;
                    report.forwarded += 1;
                }
                Err(e) => {
                    warn!("gateway: {:?} skipped: {:?}", device, e);
                    report.failed += 1;
                    report.last_error = Some(e);
                }
            }
        }

        if report.forwarded > 0 {
            self.uart.flush().map_err(GatewayError::Uart)?;
        }
        trace!(
            "gateway: poll done, {} forwarded, {} failed",
            report.forwarded,
            report.failed
        );
        Ok(report)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn engine(&self) -> &TwiEngine<R, W> {
        &self.engine
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Release the bus engine and the serial port
    pub fn release(self) -> (TwiEngine<R, W>, U) {
        (self.engine, self.uart)
    }
}
