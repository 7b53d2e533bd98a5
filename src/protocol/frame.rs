// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay frame format and codec.
//!
//! Wire format:
//!
//! ```text
//! +------+------+-------------+------+-----+-----------+----------+
//! | 0xAA | 0x55 | addr u16 BE | kind | len | payload   | checksum |
//! +------+------+-------------+------+-----+-----------+----------+
//! ```
//!
//! The checksum is the wrapping sum of every byte between the magic and the
//! checksum itself.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::types::{InputState, OutputState, TemperatureAndHumidity};

/// Frame header: magic (2) + address (2) + kind (1) + length (1).
pub const HEADER_SIZE: usize = 6;

/// Trailing checksum byte.
pub const TRAILER_SIZE: usize = 1;

/// Magic bytes opening every frame.
pub const MAGIC: [u8; 2] = [0xAA, 0x55];

/// Largest payload a frame can carry.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Kind of a relay frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Device report of output levels.
    OutputStateReport,
    /// Device report of input levels.
    InputStateReport,
    /// Device report of the temperature and humidity sensor.
    TemperatureHumidityReport,
    /// Request for an output state report.
    OutputStateInquiry,
    /// Request for an input state report.
    InputStateInquiry,
    /// Request for a temperature and humidity report.
    TemperatureHumidityInquiry,
}

impl FrameKind {
    /// Returns the wire byte for this kind.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::OutputStateReport => 0x01,
            Self::InputStateReport => 0x02,
            Self::TemperatureHumidityReport => 0x03,
            Self::OutputStateInquiry => 0x81,
            Self::InputStateInquiry => 0x82,
            Self::TemperatureHumidityInquiry => 0x83,
        }
    }

    /// Parses a wire byte.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownKind`] for unassigned bytes.
    pub fn from_byte(byte: u8) -> Result<Self, FrameError> {
        match byte {
            0x01 => Ok(Self::OutputStateReport),
            0x02 => Ok(Self::InputStateReport),
            0x03 => Ok(Self::TemperatureHumidityReport),
            0x81 => Ok(Self::OutputStateInquiry),
            0x82 => Ok(Self::InputStateInquiry),
            0x83 => Ok(Self::TemperatureHumidityInquiry),
            other => Err(FrameError::UnknownKind(other)),
        }
    }

    /// Returns `true` for request kinds sent to the device.
    #[must_use]
    pub const fn is_inquiry(self) -> bool {
        self.as_byte() & 0x80 != 0
    }

    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OutputStateReport => "output-state",
            Self::InputStateReport => "input-state",
            Self::TemperatureHumidityReport => "temperature-humidity",
            Self::OutputStateInquiry => "output-state-inquiry",
            Self::InputStateInquiry => "input-state-inquiry",
            Self::TemperatureHumidityInquiry => "temperature-humidity-inquiry",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One protocol message exchanged with a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sub-device address the frame belongs to.
    pub address: u16,
    /// What the frame carries.
    pub kind: FrameKind,
    /// Raw payload.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(address: u16, kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            address,
            kind,
            payload: payload.into(),
        }
    }

    /// Creates an inquiry frame with an empty payload.
    #[must_use]
    pub fn inquiry(address: u16, kind: FrameKind) -> Self {
        Self::new(address, kind, Bytes::new())
    }

    /// Creates an output state report.
    #[must_use]
    pub fn output_report(address: u16, states: &[OutputState]) -> Self {
        let payload: Vec<u8> = states.iter().flat_map(|s| [s.route, s.value]).collect();
        Self::new(address, FrameKind::OutputStateReport, payload)
    }

    /// Creates an input state report.
    #[must_use]
    pub fn input_report(address: u16, states: &[InputState]) -> Self {
        let payload: Vec<u8> = states.iter().flat_map(|s| [s.route, s.value]).collect();
        Self::new(address, FrameKind::InputStateReport, payload)
    }

    /// Creates a temperature and humidity report.
    #[must_use]
    pub fn temperature_humidity_report(address: u16, reading: TemperatureAndHumidity) -> Self {
        let (temperature, humidity) = reading.to_tenths();
        let mut payload = BytesMut::with_capacity(4);
        payload.put_i16(temperature);
        payload.put_u16(humidity);
        Self::new(address, FrameKind::TemperatureHumidityReport, payload.freeze())
    }

    /// The total wire size of this frame.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }

    /// Decodes the payload of an output state report.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedPayload`] if the payload is not a
    /// sequence of `(route, value)` pairs.
    pub fn output_states(&self) -> Result<Vec<OutputState>, FrameError> {
        Ok(self
            .route_pairs()?
            .map(|(route, value)| OutputState::new(route, value))
            .collect())
    }

    /// Decodes the payload of an input state report.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedPayload`] if the payload is not a
    /// sequence of `(route, value)` pairs.
    pub fn input_states(&self) -> Result<Vec<InputState>, FrameError> {
        Ok(self
            .route_pairs()?
            .map(|(route, value)| InputState::new(route, value))
            .collect())
    }

    /// Decodes the payload of a temperature and humidity report.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedPayload`] unless the payload is exactly
    /// four bytes.
    pub fn temperature_humidity(&self) -> Result<TemperatureAndHumidity, FrameError> {
        if self.payload.len() != 4 {
            return Err(self.malformed());
        }
        let mut payload = self.payload.clone();
        let temperature = payload.get_i16();
        let humidity = payload.get_u16();
        Ok(TemperatureAndHumidity::from_tenths(temperature, humidity))
    }

    fn route_pairs(&self) -> Result<impl Iterator<Item = (u8, u8)> + '_, FrameError> {
        if self.payload.len() % 2 != 0 {
            return Err(self.malformed());
        }
        Ok(self.payload.chunks_exact(2).map(|pair| (pair[0], pair[1])))
    }

    fn malformed(&self) -> FrameError {
        FrameError::MalformedPayload {
            kind: self.kind.name(),
            len: self.payload.len(),
        }
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encodes a frame into the wire format.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if the payload exceeds
/// [`MAX_PAYLOAD`] bytes.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
    let len = u8::try_from(frame.payload.len())
        .map_err(|_| FrameError::PayloadTooLarge(frame.payload.len()))?;

    dst.reserve(frame.wire_size());
    let start = dst.len();
    dst.put_slice(&MAGIC);
    dst.put_u16(frame.address);
    dst.put_u8(frame.kind.as_byte());
    dst.put_u8(len);
    dst.put_slice(&frame.payload);
    let sum = checksum(&dst[start + MAGIC.len()..]);
    dst.put_u8(sum);
    Ok(())
}

/// Decodes a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet; the
/// buffer is left untouched in that case. On success, consumes the frame bytes.
///
/// # Errors
///
/// Returns an error for a bad magic, checksum mismatch or unknown kind.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
    if src.len() >= MAGIC.len() && src[..MAGIC.len()] != MAGIC {
        return Err(FrameError::InvalidMagic(src[0], src[1]));
    }
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let payload_len = usize::from(src[5]);
    let total = HEADER_SIZE + payload_len + TRAILER_SIZE;
    if src.len() < total {
        return Ok(None);
    }

    let expected = checksum(&src[MAGIC.len()..total - TRAILER_SIZE]);
    let actual = src[total - TRAILER_SIZE];
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    let kind = FrameKind::from_byte(src[4])?;
    let address = u16::from_be_bytes([src[2], src[3]]);

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    src.advance(TRAILER_SIZE);

    Ok(Some(Frame {
        address,
        kind,
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(frame: &Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(frame, &mut buf).unwrap();
        buf
    }

    #[test]
    fn inquiry_wire_layout() {
        let buf = encoded(&Frame::inquiry(0x0102, FrameKind::InputStateInquiry));
        assert_eq!(
            buf.as_ref(),
            &[0xAA, 0x55, 0x01, 0x02, 0x82, 0x00, 0x85][..]
        );
    }

    #[test]
    fn decode_output_report() {
        let states = [OutputState::new(1, 1), OutputState::new(2, 0)];
        let mut buf = encoded(&Frame::output_report(7, &states));

        let frame = decode_frame(&mut buf).unwrap().unwrap();

        assert_eq!(frame.address, 7);
        assert_eq!(frame.kind, FrameKind::OutputStateReport);
        assert_eq!(frame.output_states().unwrap(), states);
        assert!(buf.is_empty());
    }

    #[test]
    fn three_route_report_is_thirteen_bytes() {
        let states = [
            InputState::new(1, 0),
            InputState::new(2, 1),
            InputState::new(3, 0),
        ];
        assert_eq!(Frame::input_report(1, &states).wire_size(), 13);
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0xAA, 0x55, 0x00][..]);
        assert!(decode_frame(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn decode_truncated_frame_is_not_interpreted() {
        let reading = TemperatureAndHumidity::new(20.0, 50.0);
        let mut buf = encoded(&Frame::temperature_humidity_report(1, reading));
        buf.truncate(buf.len() - 1);

        assert!(decode_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0x55, 0xAA, 0, 0, 0, 0, 0][..]);
        assert!(matches!(
            decode_frame(&mut buf),
            Err(FrameError::InvalidMagic(0x55, 0xAA))
        ));
    }

    #[test]
    fn decode_checksum_mismatch() {
        let mut buf = encoded(&Frame::inquiry(1, FrameKind::OutputStateInquiry));
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        assert!(matches!(
            decode_frame(&mut buf),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn decode_unknown_kind() {
        let mut buf = BytesMut::from(&[0xAA, 0x55, 0x00, 0x01, 0x42, 0x00, 0x43][..]);
        assert!(matches!(
            decode_frame(&mut buf),
            Err(FrameError::UnknownKind(0x42))
        ));
    }

    #[test]
    fn decode_back_to_back_frames() {
        let mut buf = encoded(&Frame::inquiry(1, FrameKind::InputStateInquiry));
        buf.extend_from_slice(&encoded(&Frame::input_report(1, &[InputState::new(1, 1)])));

        let first = decode_frame(&mut buf).unwrap().unwrap();
        let second = decode_frame(&mut buf).unwrap().unwrap();

        assert_eq!(first.kind, FrameKind::InputStateInquiry);
        assert_eq!(second.input_states().unwrap(), vec![InputState::new(1, 1)]);
        assert!(buf.is_empty());
    }

    #[test]
    fn temperature_humidity_payload() {
        let reading = TemperatureAndHumidity::new(-3.5, 87.2);
        let frame = Frame::temperature_humidity_report(1, reading);

        let decoded = frame.temperature_humidity().unwrap();
        assert!((decoded.temperature - -3.5).abs() < 1e-9);
        assert!((decoded.humidity - 87.2).abs() < 1e-9);
    }

    #[test]
    fn odd_state_payload_is_malformed() {
        let frame = Frame::new(1, FrameKind::InputStateReport, vec![1, 0, 2]);
        assert!(matches!(
            frame.input_states(),
            Err(FrameError::MalformedPayload { len: 3, .. })
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let frame = Frame::new(1, FrameKind::OutputStateReport, vec![0u8; 256]);
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_frame(&frame, &mut buf),
            Err(FrameError::PayloadTooLarge(256))
        ));
    }

    #[test]
    fn inquiry_kinds_have_high_bit() {
        assert!(FrameKind::TemperatureHumidityInquiry.is_inquiry());
        assert!(!FrameKind::TemperatureHumidityReport.is_inquiry());
    }
}
