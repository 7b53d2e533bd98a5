// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types reported by relay devices.
//!
//! # Types
//!
//! - [`OutputState`] - Level of one relay output route
//! - [`InputState`] - Level of one digital input route
//! - [`TemperatureAndHumidity`] - Sensor reading pair

mod climate;
mod io_state;

pub use climate::TemperatureAndHumidity;
pub use io_state::{InputState, OutputState, RouteState};

pub(crate) use io_state::merge_by_route;
