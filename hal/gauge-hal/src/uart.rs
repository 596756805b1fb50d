//! UART serial communication abstractions
//!
//! Provides the blocking transmit trait chip-specific HALs implement. The
//! gateway uses [`UartTx`] to stream device frames to the host display; the
//! host side reads through `embedded_io::Read`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Baud-rate divisor for a 16x oversampling USART
    ///
    /// `round(cpu_hz / (16 * baud) - 1)`. Returns `None` if the baud rate
    /// is zero, too high for the clock, or the divisor overflows 12 bits.
    pub fn divisor(&self, cpu_hz: u32) -> Option<u16> {
        let scaled = 16u64.checked_mul(self.baudrate as u64)?;
        if scaled == 0 {
            return None;
        }
        let rounded = (cpu_hz as u64 + scaled / 2) / scaled;
        let divisor = rounded.checked_sub(1)?;
        if divisor > 0x0FFF {
            return None;
        }
        Some(divisor as u16)
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
