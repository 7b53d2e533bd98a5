// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound frame middleware.
//!
//! Every frame read from the device passes through the relay's
//! [`MiddlewareChain`] before it touches the state store. A stage receives the
//! relay and the frame and returns the (possibly rewritten) frame, or `None`
//! to drop it.
//!
//! Stages run on the relay's read loop, one frame at a time. A stage that
//! blocks stalls all inbound processing for that relay.
//!
//! # Examples
//!
//! ```
//! use relaylink::middleware::{AddressFilter, MiddlewareChain};
//! use relaylink::protocol::{Frame, FrameKind};
//! use relaylink::Relay;
//!
//! let mut chain = MiddlewareChain::new();
//! chain.push(AddressFilter);
//! chain.push(|_relay: &Relay, mut frame: Frame| {
//!     frame.address &= 0x00FF;
//!     Some(frame)
//! });
//! assert_eq!(chain.len(), 2);
//! ```

mod filter;
mod logger;

pub use filter::{AddressFilter, KindFilter};
pub use logger::FrameLogger;

use std::fmt;
use std::sync::Arc;

use crate::protocol::Frame;
use crate::relay::Relay;

/// A transform stage applied to inbound frames.
pub trait Middleware: Send + Sync {
    /// Transforms a frame. Returning `None` drops it.
    fn transform(&self, relay: &Relay, frame: Frame) -> Option<Frame>;
}

impl<F> Middleware for F
where
    F: Fn(&Relay, Frame) -> Option<Frame> + Send + Sync,
{
    fn transform(&self, relay: &Relay, frame: Frame) -> Option<Frame> {
        self(relay, frame)
    }
}

/// Ordered list of middleware stages.
///
/// Stages run in registration order; an empty chain passes frames through
/// unchanged.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn push<M: Middleware + 'static>(&mut self, stage: M) {
        self.stages.push(Arc::new(stage));
    }

    /// Appends a shared stage.
    pub fn push_shared(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs a frame through every stage, stopping at the first drop.
    #[must_use]
    pub fn apply(&self, relay: &Relay, frame: Frame) -> Option<Frame> {
        self.stages
            .iter()
            .try_fold(frame, |frame, stage| stage.transform(relay, frame))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}
