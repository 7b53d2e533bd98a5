// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay properties and the parent device boundary.
//!
//! A relay exposes three property kinds. Each is read from the cached state
//! snapshot; reading a property never talks to the device.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::{RelayState, StateStore};
use crate::types::{InputState, OutputState, TemperatureAndHumidity};

/// Kind of property a relay can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Output level per route.
    OutputState,
    /// Input level per route.
    InputState,
    /// Temperature and humidity reading.
    TemperatureHumidity,
}

impl PropertyType {
    /// Every property type.
    pub const ALL: [Self; 3] = [
        Self::OutputState,
        Self::InputState,
        Self::TemperatureHumidity,
    ];

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutputState => "output_state",
            Self::InputState => "input_state",
            Self::TemperatureHumidity => "temperature_humidity",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current value of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Property {
    /// Output levels in report order.
    OutputState(Vec<OutputState>),
    /// Input levels in report order.
    InputState(Vec<InputState>),
    /// Temperature and humidity reading.
    TemperatureHumidity(TemperatureAndHumidity),
}

impl Property {
    /// Reads a property from a state snapshot.
    #[must_use]
    pub fn from_state(state: &RelayState, property_type: PropertyType) -> Self {
        match property_type {
            PropertyType::OutputState => Self::OutputState(state.output_states().to_vec()),
            PropertyType::InputState => Self::InputState(state.input_states().to_vec()),
            PropertyType::TemperatureHumidity => {
                Self::TemperatureHumidity(state.temperature_humidity())
            }
        }
    }

    /// Returns the kind of this property.
    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        match self {
            Self::OutputState(_) => PropertyType::OutputState,
            Self::InputState(_) => PropertyType::InputState,
            Self::TemperatureHumidity(_) => PropertyType::TemperatureHumidity,
        }
    }
}

/// Accessor returning the current cached value of one property.
pub type GetPropertyFn = Box<dyn Fn() -> Property + Send + Sync>;

/// Property accessors keyed by property type.
pub type GetPropertyFnMap = HashMap<PropertyType, GetPropertyFn>;

/// Builds accessors for every property type over a state store.
pub(crate) fn property_fn_map(store: &Arc<StateStore>) -> GetPropertyFnMap {
    PropertyType::ALL
        .into_iter()
        .map(|property_type| {
            let store = Arc::clone(store);
            let accessor: GetPropertyFn =
                Box::new(move || Property::from_state(&store.snapshot(), property_type));
            (property_type, accessor)
        })
        .collect()
}

/// Handle to the gateway or device instance a relay is attached to.
///
/// The relay only calls into its parent to publish properties when it comes
/// online. Routing, addressing and upstream transport are the parent's
/// business.
pub trait ParentDevice: Send + Sync + fmt::Debug {
    /// Identifier of the parent instance.
    fn id(&self) -> &str;

    /// Publishes properties of a sub-device upstream.
    fn post_properties(&self, sub_device_id: u16, properties: &[Property]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateUpdate;

    #[test]
    fn accessors_read_latest_snapshot() {
        let store = Arc::new(StateStore::new());
        let map = property_fn_map(&store);
        assert_eq!(map.len(), 3);

        let reading = TemperatureAndHumidity::new(23.4, 51.0);
        store.apply(&StateUpdate::TemperatureHumidity(reading));

        let accessor = &map[&PropertyType::TemperatureHumidity];
        assert_eq!(accessor(), Property::TemperatureHumidity(reading));
    }

    #[test]
    fn property_type_round_trip() {
        for property_type in PropertyType::ALL {
            let property = Property::from_state(&RelayState::new(), property_type);
            assert_eq!(property.property_type(), property_type);
        }
    }

    #[test]
    fn property_serializes_tagged() {
        let property = Property::InputState(vec![InputState::new(1, 1)]);
        let json = serde_json::to_value(&property).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "input_state", "value": [{"route": 1, "value": 1}]})
        );
    }
}
