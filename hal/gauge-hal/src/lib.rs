//! Gauge Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the cluster firmware
//! is written against. Chip support implements them on top of the real
//! peripheral registers; tests implement them on top of plain memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (gauge-core, gauge-twi)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gauge-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip TWI /   │       │  simulated    │
//! │  USART regs   │       │  registers    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`twi::TwiRegisters`] - Two-wire interface register bank
//! - [`uart::UartTx`] - Serial transmit

#![no_std]
#![deny(unsafe_code)]

pub mod twi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use twi::{TwiConfig, TwiRegisters};
pub use uart::{UartConfig, UartTx};
