// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame logging stage.

use tracing::Level;

use super::Middleware;
use crate::protocol::Frame;
use crate::relay::Relay;

/// Logs every inbound frame and passes it on unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FrameLogger {
    level: Level,
}

impl FrameLogger {
    /// Creates a logger emitting at the given level.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for FrameLogger {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

macro_rules! log_frame {
    ($level:expr, $relay:ident, $frame:ident) => {
        tracing::event!(
            $level,
            sub_device_id = $relay.sub_device_id(),
            address = $frame.address,
            kind = %$frame.kind,
            payload = ?$frame.payload,
            "Inbound frame"
        )
    };
}

impl Middleware for FrameLogger {
    fn transform(&self, relay: &Relay, frame: Frame) -> Option<Frame> {
        match self.level {
            Level::ERROR => log_frame!(Level::ERROR, relay, frame),
            Level::WARN => log_frame!(Level::WARN, relay, frame),
            Level::INFO => log_frame!(Level::INFO, relay, frame),
            Level::DEBUG => log_frame!(Level::DEBUG, relay, frame),
            _ => log_frame!(Level::TRACE, relay, frame),
        }
        Some(frame)
    }
}
