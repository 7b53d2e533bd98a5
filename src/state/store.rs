// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot store for relay state.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{RelayState, StateUpdate};

/// Holds the current [`RelayState`] as an immutable snapshot.
///
/// Updates build a new state and swap it in whole, so readers always see a
/// consistent snapshot. The store expects a single writer (the relay's read
/// loop); any number of readers may take snapshots concurrently.
#[derive(Debug, Default)]
pub struct StateStore {
    current: RwLock<Arc<RelayState>>,
}

impl StateStore {
    /// Creates a store holding an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RelayState> {
        Arc::clone(&self.current.read())
    }

    /// Applies an update by replacing the snapshot.
    ///
    /// Returns `true` if the state changed. Unchanged updates keep the
    /// existing snapshot.
    pub fn apply(&self, update: &StateUpdate) -> bool {
        let mut next = RelayState::clone(&self.snapshot());
        if !next.apply(update) {
            return false;
        }
        *self.current.write() = Arc::new(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputState, OutputState};

    #[test]
    fn snapshots_are_not_affected_by_later_updates() {
        let store = StateStore::new();
        store.apply(&StateUpdate::OutputStates(vec![OutputState::new(1, 0)]));
        let before = store.snapshot();

        store.apply(&StateUpdate::OutputStates(vec![OutputState::new(1, 1)]));

        assert_eq!(before.output(1), Some(OutputState::new(1, 0)));
        assert_eq!(store.snapshot().output(1), Some(OutputState::new(1, 1)));
    }

    #[test]
    fn unchanged_update_keeps_snapshot() {
        let store = StateStore::new();
        store.apply(&StateUpdate::InputStates(vec![InputState::new(1, 1)]));
        let before = store.snapshot();

        assert!(!store.apply(&StateUpdate::InputStates(vec![InputState::new(1, 1)])));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn concurrent_readers_never_see_torn_state() {
        let store = Arc::new(StateStore::new());

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    let snapshot = store.snapshot();
                    let outputs = snapshot.output_states();
                    // Each update writes the same value to every route.
                    if let Some(first) = outputs.first() {
                        assert!(outputs.iter().all(|s| s.value == first.value));
                    }
                }
            })
        };

        for value in 0..200u8 {
            let report: Vec<_> = (1..=4).map(|route| OutputState::new(route, value)).collect();
            store.apply(&StateUpdate::OutputStates(report));
        }
        reader.join().unwrap();
    }
}
