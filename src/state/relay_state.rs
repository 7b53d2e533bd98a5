// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay state tracking.

use serde::{Deserialize, Serialize};

use crate::types::{InputState, OutputState, TemperatureAndHumidity, merge_by_route};

use super::StateUpdate;

/// Last known state of a relay.
///
/// Output and input collections hold one entry per route, in the order the
/// device first reported each route. The temperature and humidity reading
/// starts zeroed and is replaced as a whole on every report.
///
/// # Examples
///
/// ```
/// use relaylink::state::{RelayState, StateUpdate};
/// use relaylink::types::OutputState;
///
/// let mut state = RelayState::new();
/// state.apply(&StateUpdate::OutputStates(vec![OutputState::new(1, 1)]));
/// assert_eq!(state.output(1), Some(OutputState::new(1, 1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayState {
    output_states: Vec<OutputState>,
    input_states: Vec<InputState>,
    temperature_humidity: TemperatureAndHumidity,
}

impl RelayState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All known outputs in report order.
    #[must_use]
    pub fn output_states(&self) -> &[OutputState] {
        &self.output_states
    }

    /// All known inputs in report order.
    #[must_use]
    pub fn input_states(&self) -> &[InputState] {
        &self.input_states
    }

    /// Latest temperature and humidity reading.
    #[must_use]
    pub fn temperature_humidity(&self) -> TemperatureAndHumidity {
        self.temperature_humidity
    }

    /// Gets the output on a specific route.
    #[must_use]
    pub fn output(&self, route: u8) -> Option<OutputState> {
        self.output_states.iter().copied().find(|s| s.route == route)
    }

    /// Gets the input on a specific route.
    #[must_use]
    pub fn input(&self, route: u8) -> Option<InputState> {
        self.input_states.iter().copied().find(|s| s.route == route)
    }

    /// Applies an update.
    ///
    /// Returns `true` if the state changed.
    pub fn apply(&mut self, update: &StateUpdate) -> bool {
        match update {
            StateUpdate::OutputStates(report) => merge_by_route(&mut self.output_states, report),
            StateUpdate::InputStates(report) => merge_by_route(&mut self.input_states, report),
            StateUpdate::TemperatureHumidity(reading) => {
                let changed = self.temperature_humidity != *reading;
                self.temperature_humidity = *reading;
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty() {
        let state = RelayState::new();
        assert!(state.output_states().is_empty());
        assert!(state.input_states().is_empty());
        assert_eq!(state.temperature_humidity(), TemperatureAndHumidity::default());
    }

    #[test]
    fn apply_temperature_replaces_pair() {
        let mut state = RelayState::new();
        let reading = TemperatureAndHumidity::new(19.5, 55.0);

        assert!(state.apply(&StateUpdate::TemperatureHumidity(reading)));
        assert!(!state.apply(&StateUpdate::TemperatureHumidity(reading)));
        assert_eq!(state.temperature_humidity(), reading);
    }

    #[test]
    fn input_and_output_are_tracked_separately() {
        let mut state = RelayState::new();
        state.apply(&StateUpdate::OutputStates(vec![OutputState::new(1, 1)]));
        state.apply(&StateUpdate::InputStates(vec![InputState::new(1, 0)]));

        assert_eq!(state.output(1), Some(OutputState::new(1, 1)));
        assert_eq!(state.input(1), Some(InputState::new(1, 0)));
        assert_eq!(state.input(2), None);
    }
}
