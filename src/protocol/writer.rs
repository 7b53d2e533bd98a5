// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized frame writer shared by all inquiry tasks.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::frame::{Frame, encode_frame};
use crate::error::FrameError;

/// Writes whole frames to a shared transport.
///
/// Each frame is encoded up front and written with a single `write_all` while
/// holding the writer lock, so concurrent senders never interleave bytes.
/// Pending and in-flight sends fail with [`FrameError::Closed`] as soon as the
/// cancellation token fires.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: Mutex<Option<W>>,
    cancel: CancellationToken,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    /// Creates a writer bound to a shutdown token.
    pub fn new(inner: W, cancel: CancellationToken) -> Self {
        Self {
            inner: Mutex::new(Some(inner)),
            cancel,
        }
    }

    /// Encodes and writes one frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Closed`] once the writer is closed or cancelled,
    /// and [`FrameError::Io`] if the transport fails.
    pub async fn send(&self, frame: &Frame) -> Result<(), FrameError> {
        let mut buf = BytesMut::with_capacity(frame.wire_size());
        encode_frame(frame, &mut buf)?;

        let mut guard = tokio::select! {
            () = self.cancel.cancelled() => return Err(FrameError::Closed),
            guard = self.inner.lock() => guard,
        };
        let writer = guard.as_mut().ok_or(FrameError::Closed)?;

        tokio::select! {
            () = self.cancel.cancelled() => Err(FrameError::Closed),
            result = async {
                writer.write_all(&buf).await?;
                writer.flush().await
            } => result.map_err(FrameError::from),
        }
    }

    /// Shuts the transport down and drops it. Later sends fail with
    /// [`FrameError::Closed`]; closing twice is a no-op.
    ///
    /// Cancel the token first if a send may be blocked on the transport.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Io`] if the transport shutdown fails.
    pub async fn close(&self) -> Result<(), FrameError> {
        let writer = self.inner.lock().await.take();
        if let Some(mut writer) = writer {
            writer.shutdown().await?;
        }
        Ok(())
    }
}
