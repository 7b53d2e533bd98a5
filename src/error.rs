// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `relaylink` library.
//!
//! Errors are split by concern: configuration validation, frame transport and
//! decoding, and relay start-up. The top-level [`Error`] wraps all of them.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The relay configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading, writing or decoding a frame failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Starting the read and write loops failed.
    #[error("init relay failed: {0}")]
    Init(#[from] InitError),

    /// The relay has already started and no longer accepts configuration changes.
    #[error("relay configuration is locked once the relay is started")]
    ConfigurationLocked,
}

/// Errors raised while validating a relay configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was not set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The poll interval must be greater than zero.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    /// An inquiry task was registered with a zero interval.
    #[error("inquiry `{0}` has a zero interval")]
    ZeroInquiryInterval(String),

    /// The read timeout must be greater than zero when set.
    #[error("read timeout must be greater than zero")]
    ZeroReadTimeout,
}

/// Errors related to the frame channel and the frame format.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame does not start with the expected magic bytes.
    #[error("invalid frame magic: {0:#04x} {1:#04x}")]
    InvalidMagic(u8, u8),

    /// The frame kind byte is not a known kind.
    #[error("unknown frame kind: {0:#04x}")]
    UnknownKind(u8),

    /// The trailing checksum does not match the frame contents.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum carried by the frame.
        actual: u8,
    },

    /// The payload does not fit the frame kind.
    #[error("malformed {kind} payload of {len} bytes")]
    MalformedPayload {
        /// Name of the frame kind.
        kind: &'static str,
        /// Payload length in bytes.
        len: usize,
    },

    /// The payload does not fit in a single frame.
    #[error("payload too large ({0} bytes, max 255)")]
    PayloadTooLarge(usize),

    /// Transport I/O failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection (possibly mid-frame).
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// No complete frame arrived within the read timeout.
    #[error("no frame received within {0} ms")]
    Timeout(u64),

    /// The channel was closed locally; no further writes are accepted.
    #[error("frame channel is closed")]
    Closed,
}

/// Errors raised when starting the relay loops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The read and write loops are already running.
    #[error("relay loops already started")]
    AlreadyStarted,

    /// The relay went offline and cannot be restarted.
    #[error("relay is offline")]
    Offline,

    /// The loops must be spawned from within a Tokio runtime.
    #[error("no Tokio runtime available: {0}")]
    NoRuntime(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_error_is_wrapped_with_phase() {
        let err: Error = InitError::AlreadyStarted.into();
        assert_eq!(err.to_string(), "init relay failed: relay loops already started");
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = FrameError::ChecksumMismatch {
            expected: 0x1f,
            actual: 0x20,
        };
        assert_eq!(err.to_string(), "checksum mismatch: expected 0x1f, got 0x20");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingField("sub_device_id").into();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField("sub_device_id"))
        ));
    }

    #[test]
    fn frame_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: FrameError = io.into();
        assert!(matches!(err, FrameError::Io(_)));
    }
}
