// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature and humidity reading.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Temperature and relative humidity reported by the relay's sensor.
///
/// Readings are always replaced as a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAndHumidity {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

impl TemperatureAndHumidity {
    /// Creates a new reading.
    #[must_use]
    pub const fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// Builds a reading from the wire representation (tenths of a unit).
    #[must_use]
    pub fn from_tenths(temperature: i16, humidity: u16) -> Self {
        Self {
            temperature: f64::from(temperature) / 10.0,
            humidity: f64::from(humidity) / 10.0,
        }
    }

    /// Returns the wire representation (tenths of a unit), saturating at the
    /// bounds of the wire types.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_tenths(&self) -> (i16, u16) {
        let temperature = (self.temperature * 10.0)
            .round()
            .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
        let humidity = (self.humidity * 10.0)
            .round()
            .clamp(0.0, f64::from(u16::MAX)) as u16;
        (temperature, humidity)
    }
}

impl fmt::Display for TemperatureAndHumidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C {:.1}%RH", self.temperature, self.humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tenths_scales_values() {
        let th = TemperatureAndHumidity::from_tenths(-52, 613);
        assert!((th.temperature - -5.2).abs() < f64::EPSILON);
        assert!((th.humidity - 61.3).abs() < 1e-9);
    }

    #[test]
    fn to_tenths_saturates() {
        let th = TemperatureAndHumidity::new(5000.0, -3.0);
        assert_eq!(th.to_tenths(), (i16::MAX, 0));
    }

    #[test]
    fn display_format() {
        let th = TemperatureAndHumidity::new(21.5, 40.0);
        assert_eq!(th.to_string(), "21.5°C 40.0%RH");
    }
}
