// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State updates decoded from device reports.

use crate::error::FrameError;
use crate::protocol::{Frame, FrameKind};
use crate::types::{InputState, OutputState, TemperatureAndHumidity};

/// A single update to a [`RelayState`](super::RelayState).
///
/// # Examples
///
/// ```
/// use relaylink::protocol::Frame;
/// use relaylink::state::StateUpdate;
/// use relaylink::types::InputState;
///
/// let frame = Frame::input_report(1, &[InputState::new(2, 1)]);
/// let update = StateUpdate::from_frame(&frame).unwrap();
/// assert_eq!(update, Some(StateUpdate::InputStates(vec![InputState::new(2, 1)])));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StateUpdate {
    /// Output levels for the reported routes.
    OutputStates(Vec<OutputState>),
    /// Input levels for the reported routes.
    InputStates(Vec<InputState>),
    /// A fresh temperature and humidity reading.
    TemperatureHumidity(TemperatureAndHumidity),
}

impl StateUpdate {
    /// Interprets a frame.
    ///
    /// Inquiry frames carry no state and yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedPayload`] if a report payload does not
    /// match its kind.
    pub fn from_frame(frame: &Frame) -> Result<Option<Self>, FrameError> {
        let update = match frame.kind {
            FrameKind::OutputStateReport => Self::OutputStates(frame.output_states()?),
            FrameKind::InputStateReport => Self::InputStates(frame.input_states()?),
            FrameKind::TemperatureHumidityReport => {
                Self::TemperatureHumidity(frame.temperature_humidity()?)
            }
            FrameKind::OutputStateInquiry
            | FrameKind::InputStateInquiry
            | FrameKind::TemperatureHumidityInquiry => return Ok(None),
        };
        Ok(Some(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inquiry_frames_carry_no_update() {
        let frame = Frame::inquiry(1, FrameKind::TemperatureHumidityInquiry);
        assert_eq!(StateUpdate::from_frame(&frame).unwrap(), None);
    }

    #[test]
    fn malformed_report_is_an_error() {
        let frame = Frame::new(1, FrameKind::TemperatureHumidityReport, vec![0u8; 3]);
        assert!(StateUpdate::from_frame(&frame).is_err());
    }

    #[test]
    fn temperature_report_decodes() {
        let reading = TemperatureAndHumidity::new(24.0, 30.0);
        let frame = Frame::temperature_humidity_report(1, reading);
        assert_eq!(
            StateUpdate::from_frame(&frame).unwrap(),
            Some(StateUpdate::TemperatureHumidity(reading))
        );
    }

    #[test]
    fn updates_serialize_for_upstream() {
        let update = StateUpdate::OutputStates(vec![OutputState::new(1, 1)]);
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"OutputStates":[{"route":1,"value":1}]}"#);
    }
}
