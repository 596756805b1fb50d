//! Host frame encoding and decoding
//!
//! Frame format:
//! - START (1 byte): `'|'`
//! - DEVICE (1 byte): [`DeviceId`] wire value
//! - PAYLOAD (1 or 4 bytes): see [`payload_length`]
//! - END (1 byte): `'\r'`
//!
//! There is no length field and no checksum. The decoder is positional: the
//! device id fixes where the terminator must be, so payload bytes that
//! happen to equal a delimiter are still read as data. When the terminator
//! slot holds anything else, the decoder rescans the captured bytes for a
//! start delimiter, so a truncated frame does not swallow the next one.

use heapless::Vec;

use crate::device::{payload_length, DeviceId, DevicePayload, MAX_PAYLOAD_LEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frame start delimiter
pub const FRAME_START: u8 = b'|';

/// Frame end delimiter
pub const FRAME_END: u8 = b'\r';

/// Maximum encoded frame size (START + DEVICE + MAX_PAYLOAD + END)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + MAX_PAYLOAD_LEN + 1;

/// Decoder buffer size (DEVICE + MAX_PAYLOAD + END)
///
/// The start delimiter is never stored, the device id lands in slot 0.
const DECODE_BUFFER_SIZE: usize = 1 + MAX_PAYLOAD_LEN + 1;

/// Errors that can occur during frame construction or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload shape does not match the device
    PayloadMismatch,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// One decoded device reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceFrame {
    /// Device the reading belongs to
    pub device: DeviceId,
    /// Reading value
    pub payload: DevicePayload,
}

impl DeviceFrame {
    /// Create a frame, checking the payload shape against the device
    pub fn new(device: DeviceId, payload: DevicePayload) -> Result<Self, FrameError> {
        if !payload.fits(device) {
            return Err(FrameError::PayloadMismatch);
        }
        Ok(Self { device, payload })
    }

    /// Motor duty cycle reading
    pub fn motor(duty_cycle: u8) -> Self {
        Self {
            device: DeviceId::Motor,
            payload: DevicePayload::Byte(duty_cycle),
        }
    }

    /// Accelerometer reading in g
    pub fn accelerometer(g: f32) -> Self {
        Self {
            device: DeviceId::Accelerometer,
            payload: DevicePayload::Float(g),
        }
    }

    /// Temperature reading in degrees Celsius
    pub fn temperature(celsius: f32) -> Self {
        Self {
            device: DeviceId::TemperatureSensor,
            payload: DevicePayload::Float(celsius),
        }
    }

    /// Encoded length of this frame
    pub fn encoded_len(&self) -> usize {
        3 + payload_length(self.device)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }
        let payload = self.payload.to_bytes();
        if payload.len() != payload_length(self.device) {
            return Err(FrameError::PayloadMismatch);
        }

        buffer[0] = FRAME_START;
        buffer[1] = self.device.to_byte();
        buffer[2..2 + payload.len()].copy_from_slice(&payload);
        buffer[2 + payload.len()] = FRAME_END;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Byte-at-a-time frame decoder
///
/// Feed every byte received from the serial link to
/// [`on_byte_received`](Self::on_byte_received). Stray bytes outside a frame
/// are dropped and malformed frames are discarded without an error: the
/// decoder simply waits for the next start delimiter.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    in_frame: bool,
    buffer: [u8; DECODE_BUFFER_SIZE],
    cursor: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a new decoder, outside of any frame
    pub const fn new() -> Self {
        Self {
            in_frame: false,
            buffer: [0; DECODE_BUFFER_SIZE],
            cursor: 0,
        }
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.in_frame = false;
        self.cursor = 0;
    }

    /// Whether a start delimiter has been seen and the frame is not done yet
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    fn begin(&mut self) {
        self.in_frame = true;
        self.cursor = 0;
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Some(frame)` when `byte` completes a well-formed frame.
    pub fn on_byte_received(&mut self, byte: u8) -> Option<DeviceFrame> {
        if !self.in_frame {
            if byte == FRAME_START {
                self.begin();
            }
            return None;
        }

        // Slot 0 holds the device id; a second start delimiter here restarts
        if self.cursor == 0 {
            if byte == FRAME_START {
                self.begin();
            } else if DeviceId::from_byte(byte).is_some() {
                self.buffer[0] = byte;
                self.cursor = 1;
            } else {
                self.reset();
            }
            return None;
        }

        let Some(device) = DeviceId::from_byte(self.buffer[0]) else {
            self.reset();
            return None;
        };
        let end = 1 + payload_length(device);

        self.buffer[self.cursor] = byte;
        if self.cursor < end {
            self.cursor += 1;
            return None;
        }

        // Terminator slot
        if byte == FRAME_END {
            let frame = DevicePayload::from_bytes(device, &self.buffer[1..end])
                .map(|payload| DeviceFrame { device, payload });
            self.reset();
            return frame;
        }
        self.resync(end)
    }

    /// Recover from a missing terminator
    ///
    /// The captured bytes were not a frame, but a start delimiter among them
    /// may begin one. Capture restarts at the first of them and the bytes
    /// after it are fed again, which in turn resyncs on any later delimiter.
    fn resync(&mut self, end: usize) -> Option<DeviceFrame> {
        let captured = self.buffer;
        let first_start = captured[1..=end]
            .iter()
            .position(|&b| b == FRAME_START)
            .map(|i| i + 1);
        let Some(start) = first_start else {
            self.reset();
            return None;
        };

        self.begin();
        let mut frame = None;
        for &byte in &captured[start + 1..=end] {
            if let Some(found) = self.on_byte_received(byte) {
                frame = Some(found);
            }
        }
        frame
    }

    /// Feed multiple bytes to the decoder
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<DeviceFrame> {
        for &byte in bytes {
            if let Some(frame) = self.on_byte_received(byte) {
                return Some(frame);
            }
        }
        None
    }
}
