//! Two-wire interface (TWI / I2C) register abstraction
//!
//! The bus engine drives the peripheral at register level: every primitive
//! bus event is one write to the control register, and its outcome is a
//! status code read back once the hardware raises the interrupt flag. The
//! bit layout follows the AVR TWI block.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Control register bits
pub mod control {
    /// Interrupt flag. Set by hardware when an operation completes;
    /// writing one clears it and starts the next operation.
    pub const TWINT: u8 = 0x80;
    /// Enable acknowledge generation
    pub const TWEA: u8 = 0x40;
    /// Generate a START condition
    pub const TWSTA: u8 = 0x20;
    /// Generate a STOP condition (cleared by hardware when sent)
    pub const TWSTO: u8 = 0x10;
    /// Enable the TWI peripheral
    pub const TWEN: u8 = 0x04;
    /// Enable the TWI interrupt
    pub const TWIE: u8 = 0x01;
}

/// Mask selecting the 5 status bits of the status register
pub const STATUS_MASK: u8 = 0xF8;

/// Own-address register bit enabling general call recognition
pub const GENERAL_CALL_ENABLE: u8 = 0x01;

/// Maximum supported SCL frequency (fast mode)
pub const MAX_SCL_FREQUENCY: u32 = 400_000;

/// TWI register bank
///
/// Implementations give raw access to the peripheral registers. Reads must
/// not have side effects; writing the control register with
/// [`control::TWINT`] set starts the requested operation.
pub trait TwiRegisters {
    /// Read the control register
    fn control(&self) -> u8;

    /// Write the control register
    fn write_control(&mut self, value: u8);

    /// Read the raw status register (status bits plus prescaler bits)
    fn status(&self) -> u8;

    /// Write the raw status register (only the prescaler bits are writable)
    fn write_status(&mut self, value: u8);

    /// Read the data register
    fn data(&self) -> u8;

    /// Write the data register
    ///
    /// Must be done before clearing the interrupt flag of the operation
    /// that transmits it.
    fn write_data(&mut self, value: u8);

    /// Write the bit-rate register
    fn write_bit_rate(&mut self, value: u8);

    /// Write the own (slave) address register
    fn write_own_address(&mut self, value: u8);
}

/// TWI bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwiConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TwiConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: MAX_SCL_FREQUENCY,
    };

    /// Bit-rate register value for the given CPU clock
    ///
    /// Uses a prescaler of 1: `TWBR = (cpu_hz / scl - 16) / 2`. The SCL
    /// frequency is clamped to [`MAX_SCL_FREQUENCY`]. Returns `None` when
    /// the CPU clock is too slow for the requested frequency or the divider
    /// does not fit the 8-bit register.
    pub fn bit_rate(&self, cpu_hz: u32) -> Option<u8> {
        let scl = self.frequency.clamp(1, MAX_SCL_FREQUENCY);
        let ratio = cpu_hz / scl;
        let divider = ratio.checked_sub(16)? / 2;
        u8::try_from(divider).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_rate_standard_mode() {
        // 8 MHz / 100 kHz = 80 -> (80 - 16) / 2
        assert_eq!(TwiConfig::STANDARD.bit_rate(8_000_000), Some(32));
    }

    #[test]
    fn test_bit_rate_clamps_frequency() {
        let config = TwiConfig {
            frequency: 1_000_000,
        };
        assert_eq!(config.bit_rate(16_000_000), TwiConfig::FAST.bit_rate(16_000_000));
        assert_eq!(config.bit_rate(16_000_000), Some(12));
    }

    #[test]
    fn test_bit_rate_out_of_range() {
        // CPU too slow to reach 400 kHz
        assert_eq!(TwiConfig::FAST.bit_rate(1_000_000), None);
        // Divider of 492 does not fit the register
        assert_eq!(TwiConfig { frequency: 1_000 }.bit_rate(1_000_000), None);
    }
}
