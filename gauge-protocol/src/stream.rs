//! Frame stream over a serial reader
//!
//! Host-side glue between a byte source and the rest of the application:
//! bytes are read in chunks from any [`embedded_io::Read`] and every frame
//! the decoder completes is handed to a handler.

use embedded_io::Read;

use crate::frame::{DeviceFrame, FrameDecoder};

/// Buffer size for one read from the serial port
const RX_BUF_SIZE: usize = 64;

/// Decoded frame source on top of a serial reader
///
/// Owns the only [`FrameDecoder`] for its connection.
pub struct FrameStream<R> {
    reader: R,
    decoder: FrameDecoder,
}

impl<R: Read> FrameStream<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::new(),
        }
    }

    /// Read one chunk and publish the frames it completes
    ///
    /// Returns the number of frames handed to `handler`. A read of zero
    /// bytes (end of stream) publishes nothing.
    pub fn pump<F>(&mut self, mut handler: F) -> Result<usize, R::Error>
    where
        F: FnMut(DeviceFrame),
    {
        let mut buf = [0u8; RX_BUF_SIZE];
        let n = self.reader.read(&mut buf)?;

        let mut published = 0;
        for &byte in &buf[..n] {
            if let Some(frame) = self.decoder.on_byte_received(byte) {
                handler(frame);
                published += 1;
            }
        }
        Ok(published)
    }

    /// Read byte by byte until a frame completes
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<DeviceFrame>, R::Error> {
        let mut byte = [0u8; 1];
        loop {
            if self.reader.read(&mut byte)? == 0 {
                return Ok(None);
            }
            if let Some(frame) = self.decoder.on_byte_received(byte[0]) {
                return Ok(Some(frame));
            }
        }
    }

    /// Release the reader, dropping any partial frame
    pub fn into_inner(self) -> R {
        self.reader
    }
}
