// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffered frame reader.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::frame::{Frame, decode_frame};
use crate::error::FrameError;

/// Number of bytes requested from the transport per read.
pub const READ_CHUNK_SIZE: usize = 13;

/// Reads complete frames from any `AsyncRead` stream.
///
/// Partial reads are buffered and re-assembled; callers only ever see whole
/// frames. `read_frame` is cancel-safe: bytes already received stay buffered.
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Creates a reader using [`READ_CHUNK_SIZE`] reads.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, READ_CHUNK_SIZE)
    }

    /// Creates a reader with an explicit read chunk size (at least one byte).
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            inner,
            buf: BytesMut::with_capacity(chunk_size * 4),
            chunk: vec![0u8; chunk_size].into_boxed_slice(),
        }
    }

    /// Reads the next complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ConnectionClosed`] at end of stream, even when a
    /// partial frame is buffered, and decode errors as soon as they are
    /// detectable.
    pub async fn read_frame(&mut self) -> Result<Frame, FrameError> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf)? {
                return Ok(frame);
            }

            let read = self.inner.read(&mut self.chunk).await?;
            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::debug!(
                        buffered = self.buf.len(),
                        "Discarding incomplete frame at end of stream"
                    );
                }
                return Err(FrameError::ConnectionClosed);
            }
            self.buf.extend_from_slice(&self.chunk[..read]);
        }
    }

    /// Number of bytes received but not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Consumes the reader and returns the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::protocol::frame::{FrameKind, encode_frame};
    use crate::types::{OutputState, TemperatureAndHumidity};

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            encode_frame(frame, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[tokio::test]
    async fn reads_frames_larger_than_chunk() {
        let states: Vec<_> = (1..=8).map(|r| OutputState::new(r, r % 2)).collect();
        let frame = Frame::output_report(3, &states);
        assert!(frame.wire_size() > READ_CHUNK_SIZE);

        let mut reader = FrameReader::new(Cursor::new(wire(&[frame.clone()])));
        assert_eq!(reader.read_frame().await.unwrap(), frame);
    }

    #[tokio::test]
    async fn reads_frames_split_across_writes() {
        let frames = vec![
            Frame::inquiry(1, FrameKind::InputStateInquiry),
            Frame::temperature_humidity_report(1, TemperatureAndHumidity::new(22.0, 45.5)),
        ];
        let bytes = wire(&frames);
        let (mut device, host) = tokio::io::duplex(64);

        tokio::spawn(async move {
            for byte in bytes {
                device.write_all(&[byte]).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        let mut reader = FrameReader::new(host);
        assert_eq!(reader.read_frame().await.unwrap(), frames[0]);
        assert_eq!(reader.read_frame().await.unwrap(), frames[1]);
    }

    #[tokio::test]
    async fn end_of_stream_mid_frame_is_connection_closed() {
        let mut bytes = wire(&[Frame::inquiry(1, FrameKind::OutputStateInquiry)]);
        bytes.pop();

        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert!(matches!(
            reader.read_frame().await,
            Err(FrameError::ConnectionClosed)
        ));
        assert_eq!(reader.buffered(), 6);
    }

    #[tokio::test]
    async fn decode_error_surfaces() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x00, 0x01, 0x02]));
        assert!(matches!(
            reader.read_frame().await,
            Err(FrameError::InvalidMagic(0x00, 0x01))
        ));
    }
}
