// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound frame loop.

use std::time::Duration;

use super::{BoxedReader, Relay};
use crate::error::FrameError;
use crate::middleware::MiddlewareChain;
use crate::protocol::{Frame, FrameReader};
use crate::state::StateUpdate;

/// Reads frames until the transport fails or the relay shuts down.
///
/// Any read, decode or payload error is terminal: the loop takes the relay
/// offline and exits without applying the offending frame.
pub(super) async fn run(
    relay: Relay,
    mut reader: FrameReader<BoxedReader>,
    chain: MiddlewareChain,
    read_timeout: Option<Duration>,
) {
    let shutdown = relay.shutdown_signal();
    tracing::debug!(
        sub_device_id = relay.sub_device_id(),
        stages = chain.len(),
        "Read loop started"
    );

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            next = read_next(&mut reader, read_timeout) => next,
        };
        if shutdown.is_triggered() {
            break;
        }

        if let Err(e) = next.and_then(|frame| dispatch(&relay, &chain, frame)) {
            if !shutdown.is_triggered() {
                tracing::warn!(
                    sub_device_id = relay.sub_device_id(),
                    error = %e,
                    "Read loop failed, taking relay offline"
                );
            }
            relay.offline().await;
            break;
        }
    }

    tracing::debug!(sub_device_id = relay.sub_device_id(), "Read loop stopped");
}

async fn read_next(
    reader: &mut FrameReader<BoxedReader>,
    read_timeout: Option<Duration>,
) -> Result<Frame, FrameError> {
    let Some(limit) = read_timeout else {
        return reader.read_frame().await;
    };

    let limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
    tokio::time::timeout(limit, reader.read_frame())
        .await
        .map_err(|_| FrameError::Timeout(limit_ms))?
}

fn dispatch(relay: &Relay, chain: &MiddlewareChain, frame: Frame) -> Result<(), FrameError> {
    let Some(frame) = chain.apply(relay, frame) else {
        tracing::trace!(sub_device_id = relay.sub_device_id(), "Frame dropped by middleware");
        return Ok(());
    };

    match StateUpdate::from_frame(&frame)? {
        Some(update) => {
            if relay.store().apply(&update) {
                tracing::debug!(
                    sub_device_id = relay.sub_device_id(),
                    kind = %frame.kind,
                    "Relay state updated"
                );
            }
        }
        None => {
            tracing::trace!(
                sub_device_id = relay.sub_device_id(),
                kind = %frame.kind,
                "Ignoring frame without state"
            );
        }
    }
    Ok(())
}
