// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay state management types.
//!
//! [`RelayState`] is the last known state of a relay, [`StateUpdate`] is one
//! decoded report, and [`StateStore`] publishes the state as swap-in
//! snapshots so readers never observe a partial update.
//!
//! # Examples
//!
//! ```
//! use relaylink::state::{StateStore, StateUpdate};
//! use relaylink::types::TemperatureAndHumidity;
//!
//! let store = StateStore::new();
//! let reading = TemperatureAndHumidity::new(21.0, 48.5);
//! store.apply(&StateUpdate::TemperatureHumidity(reading));
//!
//! assert_eq!(store.snapshot().temperature_humidity(), reading);
//! ```

mod relay_state;
mod state_change;
mod store;

pub use relay_state::RelayState;
pub use state_change::StateUpdate;
pub use store::StateStore;
