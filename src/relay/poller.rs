// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic inquiry tasks (the write loop).
//!
//! Each [`InquiryTask`] runs as its own Tokio task on its own interval. The
//! first tick fires immediately. A failed poll stops the task and takes the
//! whole relay offline.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;

use super::{Relay, spawn_supervised};
use crate::error::Result;

type PollFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type PollFn = Arc<dyn Fn(Relay) -> PollFuture + Send + Sync>;

/// A poll function paired with the interval it runs on.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use relaylink::{InquiryTask, Relay};
///
/// let task = InquiryTask::new("output-state", Duration::from_secs(30), |relay: Relay| async move {
///     relay.inquire_output_state().await
/// });
/// assert_eq!(task.name(), "output-state");
/// ```
#[derive(Clone)]
pub struct InquiryTask {
    name: String,
    interval: Duration,
    poll: PollFn,
}

impl InquiryTask {
    /// Creates a task that calls `poll` every `interval`.
    pub fn new<F, Fut>(name: impl Into<String>, interval: Duration, poll: F) -> Self
    where
        F: Fn(Relay) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let poll: PollFn = Arc::new(move |relay: Relay| -> PollFuture { Box::pin(poll(relay)) });
        Self {
            name: name.into(),
            interval,
            poll,
        }
    }

    /// Task name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interval between polls.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Debug for InquiryTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InquiryTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// The inquiries every relay runs: temperature/humidity and input state, both
/// on the keep-alive interval.
pub(super) fn default_tasks(poll_interval: Duration) -> Vec<InquiryTask> {
    vec![
        InquiryTask::new(
            "temperature-humidity",
            poll_interval,
            |relay: Relay| async move { relay.inquire_temperature_humidity().await },
        ),
        InquiryTask::new("input-state", poll_interval, |relay: Relay| async move {
            relay.inquire_input_state().await
        }),
    ]
}

/// Spawns one task per inquiry.
pub(super) fn spawn(runtime: &Handle, relay: &Relay, tasks: Vec<InquiryTask>) {
    for task in tasks {
        let name = task.name.clone();
        spawn_supervised(runtime, relay, name, run(relay.clone(), task));
    }
}

async fn run(relay: Relay, task: InquiryTask) {
    let shutdown = relay.shutdown_signal();
    let mut ticker = tokio::time::interval(task.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(
        sub_device_id = relay.sub_device_id(),
        inquiry = %task.name,
        interval_ms = task.interval.as_millis(),
        "Inquiry task started"
    );

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = (task.poll)(relay.clone()).await {
            if !shutdown.is_triggered() {
                tracing::warn!(
                    sub_device_id = relay.sub_device_id(),
                    inquiry = %task.name,
                    error = %e,
                    "Inquiry failed, taking relay offline"
                );
            }
            relay.offline().await;
            break;
        }
    }

    tracing::debug!(
        sub_device_id = relay.sub_device_id(),
        inquiry = %task.name,
        "Inquiry task stopped"
    );
}
