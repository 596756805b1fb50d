//! Gauge device-data protocol
//!
//! Shared vocabulary for everything that moves device readings around the
//! cluster: the logical device identifiers multiplexed over the TWI bus,
//! their payload encoding, and the serial framing the gateway uses towards
//! the host display.
//!
//! # Host frame format
//! ```text
//! ┌───────┬───────────┬──────────────┬─────┐
//! │ START │ DEVICE ID │ PAYLOAD      │ END │
//! │ '|'   │ 1B        │ 1B or 4B     │ \r  │
//! └───────┴───────────┴──────────────┴─────┘
//! ```
//!
//! The payload length is a function of the device id: one raw byte for the
//! motor duty cycle, four bytes of a little-endian `f32` for the
//! accelerometer and the temperature sensor.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod device;
pub mod frame;
pub mod stream;

pub use device::{payload_length, DeviceId, DevicePayload, PayloadBytes, MAX_PAYLOAD_LEN};
pub use frame::{DeviceFrame, FrameDecoder, FrameError, FRAME_END, FRAME_START, MAX_FRAME_SIZE};
pub use stream::FrameStream;
