//! Two-wire bus engine and device-data protocol
//!
//! Three layers, leaves first:
//!
//! - [`engine::TwiEngine`] - one function per primitive bus event. Each
//!   either busy-waits for the hardware and returns the decoded
//!   [`BusEvent`], or arms the interrupt path and returns
//!   [`Completion::Deferred`].
//! - [`master::read_device`] - blocking master read of one logical device
//!   from a peer node.
//! - [`slave::SlaveResponder`] - interrupt-driven slave state machine that
//!   streams the requested device's value one byte per interrupt.
//!
//! # Bus transaction shape
//!
//! ```text
//! START, ADDR+W, <device id>, ACK, REPEATED START, ADDR+R, ACK,
//!     <1 byte> NACK                      (motor)
//!     <byte> ACK x3, <byte> NACK         (accelerometer, temperature)
//! STOP
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the macros are visible to the other modules
mod fmt;

pub mod engine;
pub mod master;
pub mod slave;
pub mod status;
pub mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use engine::{AckPolicy, Direction, Mode, TwiEngine, TwiError};
pub use master::{read_device, ReadError, TransactionStep};
pub use slave::{DeviceSource, SlaveResponder, SlaveTransferCursor, TwiHandler};
pub use status::{BusEvent, BusStatusCode, Completion};
pub use wait::{CompletionWait, DelayBudget, Forever, SpinBudget};
