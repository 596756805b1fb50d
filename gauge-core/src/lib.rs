//! Board-agnostic application logic for the cluster nodes
//!
//! Everything here is written against the HAL traits and the bus engine, so
//! the same code runs on the target and in host tests:
//!
//! - Sensor traits implemented by `gauge-drivers`
//! - Readings shared between the sampling loop and the TWI interrupt
//! - Sensor node: slave side, answers device reads from the gateway
//! - Gateway: master side, polls a sensor node and forwards frames to the
//!   host over the serial link
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the macros are visible to the other modules
mod fmt;

pub mod config;
pub mod gateway;
pub mod node;
pub mod readings;
pub mod traits;

pub use config::{GatewayConfig, NodeConfig};
pub use gateway::{Gateway, GatewayError, PollReport};
pub use node::SensorNode;
pub use readings::SharedReadings;
