// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filtering stages.

use super::Middleware;
use crate::protocol::{Frame, FrameKind};
use crate::relay::Relay;

/// Drops frames addressed to a different sub-device.
///
/// Useful when the parent connection carries traffic for several sub-devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressFilter;

impl Middleware for AddressFilter {
    fn transform(&self, relay: &Relay, frame: Frame) -> Option<Frame> {
        if frame.address == relay.sub_device_id() {
            Some(frame)
        } else {
            tracing::trace!(
                sub_device_id = relay.sub_device_id(),
                address = frame.address,
                "Dropping frame for another sub-device"
            );
            None
        }
    }
}

/// Drops frames of the listed kinds.
#[derive(Debug, Clone, Default)]
pub struct KindFilter {
    denied: Vec<FrameKind>,
}

impl KindFilter {
    /// Creates a filter that drops the given kinds.
    #[must_use]
    pub fn deny(kinds: impl IntoIterator<Item = FrameKind>) -> Self {
        Self {
            denied: kinds.into_iter().collect(),
        }
    }
}

impl Middleware for KindFilter {
    fn transform(&self, _relay: &Relay, frame: Frame) -> Option<Frame> {
        (!self.denied.contains(&frame.kind)).then_some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::test_relay;
    use crate::types::OutputState;

    #[tokio::test]
    async fn address_filter_keeps_own_frames() {
        let (relay, _device) = test_relay(5);
        let own = Frame::output_report(5, &[OutputState::new(1, 1)]);
        let other = Frame::output_report(6, &[OutputState::new(1, 1)]);

        assert_eq!(AddressFilter.transform(&relay, own.clone()), Some(own));
        assert_eq!(AddressFilter.transform(&relay, other), None);
    }

    #[tokio::test]
    async fn kind_filter_drops_denied_kinds() {
        let (relay, _device) = test_relay(1);
        let filter = KindFilter::deny([FrameKind::InputStateReport]);

        let input = Frame::input_report(1, &[]);
        let output = Frame::output_report(1, &[]);
        assert_eq!(filter.transform(&relay, input), None);
        assert_eq!(filter.transform(&relay, output.clone()), Some(output));
    }
}
