// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame channel plumbing between a relay and its device.
//!
//! - [`Frame`] and [`FrameKind`]: one protocol message and its type
//! - [`encode_frame`] / [`decode_frame`]: the byte-level codec
//! - [`FrameReader`]: buffered reader that only yields complete frames
//! - [`FrameWriter`]: mutex-serialized writer shared by all inquiry tasks

mod frame;
mod reader;
mod writer;

pub use frame::{
    Frame, FrameKind, HEADER_SIZE, MAGIC, MAX_PAYLOAD, TRAILER_SIZE, decode_frame, encode_frame,
};
pub use reader::{FrameReader, READ_CHUNK_SIZE};
pub use writer::FrameWriter;
