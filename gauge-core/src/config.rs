//! Configuration types
//!
//! Board-agnostic settings for the two node roles. Defaults match the
//! reference cluster: 1 MHz CPU clock, sensor node at 7-bit address 0x50,
//! host link at 9600 baud.

use heapless::Vec;

use gauge_hal::{TwiConfig, UartConfig};
use gauge_protocol::DeviceId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit address of the sensor node (0xA0 in 8-bit notation)
pub const DEFAULT_NODE_ADDRESS: u8 = 0x50;

/// Default CPU clock
pub const DEFAULT_CPU_HZ: u32 = 1_000_000;

/// Bus clock reachable from the default CPU clock
pub const DEFAULT_SCL_HZ: u32 = 10_000;

/// Maximum number of devices the gateway polls
pub const MAX_POLLED_DEVICES: usize = DeviceId::ALL.len();

/// Gateway (bus master) configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GatewayConfig {
    /// CPU clock the bit rate is derived from
    pub cpu_hz: u32,
    /// 7-bit address of the sensor node to poll
    pub peer_address: u8,
    /// Devices read on every poll cycle, in order
    pub devices: Vec<DeviceId, MAX_POLLED_DEVICES>,
    /// Bus settings
    pub twi: TwiConfig,
    /// Host serial link settings
    pub uart: UartConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            peer_address: DEFAULT_NODE_ADDRESS,
            devices: Vec::from_slice(&DeviceId::ALL).unwrap_or_default(),
            twi: TwiConfig {
                frequency: DEFAULT_SCL_HZ,
            },
            uart: UartConfig::default(),
        }
    }
}

/// Sensor node (bus slave) configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Own 7-bit bus address
    pub own_address: u8,
    /// Also answer the general call address
    pub general_call: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            own_address: DEFAULT_NODE_ADDRESS,
            general_call: false,
        }
    }
}
