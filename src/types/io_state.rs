// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-route input and output levels.
//!
//! A relay reports one entry per physical route. Entries are unique by route
//! and kept in the order the device first reported them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value attached to a physical I/O route.
pub trait RouteState: Copy {
    /// Returns the route (channel index) this entry belongs to.
    fn route(&self) -> u8;
}

/// Level of one relay output.
///
/// # Examples
///
/// ```
/// use relaylink::types::OutputState;
///
/// let out = OutputState::new(1, 1);
/// assert_eq!(out.route, 1);
/// assert!(out.is_on());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputState {
    /// Route (channel index).
    pub route: u8,
    /// Output level; zero means released.
    pub value: u8,
}

impl OutputState {
    /// Creates a new output state.
    #[must_use]
    pub const fn new(route: u8, value: u8) -> Self {
        Self { route, value }
    }

    /// Returns `true` if the output is energized.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.value != 0
    }
}

impl RouteState for OutputState {
    fn route(&self) -> u8 {
        self.route
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out{}={}", self.route, self.value)
    }
}

/// Level of one digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputState {
    /// Route (channel index).
    pub route: u8,
    /// Input level; zero means low.
    pub value: u8,
}

impl InputState {
    /// Creates a new input state.
    #[must_use]
    pub const fn new(route: u8, value: u8) -> Self {
        Self { route, value }
    }

    /// Returns `true` if the input is high.
    #[must_use]
    pub const fn is_high(&self) -> bool {
        self.value != 0
    }
}

impl RouteState for InputState {
    fn route(&self) -> u8 {
        self.route
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in{}={}", self.route, self.value)
    }
}

/// Merges a report into an ordered, route-unique collection.
///
/// Known routes are updated in place; new routes are appended in report order.
/// Returns `true` if the collection changed.
pub(crate) fn merge_by_route<S: RouteState + PartialEq>(current: &mut Vec<S>, report: &[S]) -> bool {
    let mut changed = false;
    for entry in report {
        match current.iter_mut().find(|s| s.route() == entry.route()) {
            Some(existing) if existing == entry => {}
            Some(existing) => {
                *existing = *entry;
                changed = true;
            }
            None => {
                current.push(*entry);
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_appends_new_routes_in_report_order() {
        let mut states = Vec::new();
        let changed = merge_by_route(
            &mut states,
            &[OutputState::new(3, 1), OutputState::new(1, 0)],
        );

        assert!(changed);
        assert_eq!(states, vec![OutputState::new(3, 1), OutputState::new(1, 0)]);
    }

    #[test]
    fn merge_updates_known_routes_in_place() {
        let mut states = vec![InputState::new(1, 0), InputState::new(2, 0)];
        let changed = merge_by_route(&mut states, &[InputState::new(2, 1)]);

        assert!(changed);
        assert_eq!(states, vec![InputState::new(1, 0), InputState::new(2, 1)]);
    }

    #[test]
    fn merge_reports_unchanged() {
        let mut states = vec![InputState::new(1, 1)];
        assert!(!merge_by_route(&mut states, &[InputState::new(1, 1)]));
    }

    #[test]
    fn duplicate_routes_in_one_report_keep_last_value() {
        let mut states = Vec::new();
        merge_by_route(
            &mut states,
            &[OutputState::new(1, 1), OutputState::new(1, 0)],
        );
        assert_eq!(states, vec![OutputState::new(1, 0)]);
    }

    #[test]
    fn display_formats() {
        assert_eq!(OutputState::new(2, 1).to_string(), "out2=1");
        assert_eq!(InputState::new(4, 0).to_string(), "in4=0");
    }
}
