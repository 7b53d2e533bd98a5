// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay lifecycle: online, background loops, offline.
//!
//! A [`Relay`] owns one duplex connection to a relay sub-device. Going online
//! spawns a read loop that applies device reports to the state store and one
//! task per inquiry that polls the device on its interval. Any terminal error
//! or panic in those tasks takes the relay offline: the shared shutdown signal fires,
//! the connection is closed and the offline callback runs, each exactly once.
//!
//! ```no_run
//! use std::time::Duration;
//! use relaylink::{PropertyType, Relay, RelayConfig};
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> relaylink::Result<()> {
//! let stream = TcpStream::connect("192.168.1.60:8899").await.unwrap();
//! let config = RelayConfig::builder()
//!     .sub_device_id(1)
//!     .poll_interval(Duration::from_secs(10))
//!     .on_offline(|relay| tracing::warn!(id = relay.sub_device_id(), "relay lost"))
//!     .build()?;
//!
//! let relay = Relay::new(config, stream);
//! relay.online(&[PropertyType::TemperatureHumidity, PropertyType::InputState])?;
//! # Ok(())
//! # }
//! ```

mod config;
mod poller;
mod read_loop;
mod shutdown;

pub use config::{OfflineCallback, RelayConfig, RelayConfigBuilder};
pub use poller::InquiryTask;
pub use shutdown::ShutdownSignal;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;

use crate::error::{Error, InitError, Result};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::property::{self, GetPropertyFnMap, ParentDevice, Property, PropertyType};
use crate::protocol::{Frame, FrameKind, FrameReader, FrameWriter};
use crate::state::{RelayState, StateStore};
use crate::types::{InputState, OutputState, TemperatureAndHumidity};

type BoxedReader = Pin<Box<dyn AsyncRead + Send>>;
type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Format of [`Relay::online_time_string`].
const ONLINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A relay sub-device attached to a parent connection.
///
/// `Relay` is a cheap handle: clones share the same connection, state and
/// shutdown signal.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<Inner>,
}

struct Inner {
    sub_device_id: u16,
    online_time: DateTime<Local>,
    poll_interval: Duration,
    read_timeout: Option<Duration>,
    parent: Option<Arc<dyn ParentDevice>>,
    on_offline: Option<OfflineCallback>,
    writer: FrameWriter<BoxedWriter>,
    // Taken by the read loop on start.
    reader: Mutex<Option<BoxedReader>>,
    middlewares: RwLock<MiddlewareChain>,
    inquiries: Mutex<Vec<InquiryTask>>,
    store: Arc<StateStore>,
    shutdown: ShutdownSignal,
    started: AtomicBool,
}

impl Relay {
    /// Creates a relay over an already connected transport.
    ///
    /// Nothing is spawned until [`init`](Self::init) or
    /// [`online`](Self::online) is called.
    pub fn new<T>(config: RelayConfig, transport: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(transport);
        let shutdown = ShutdownSignal::new();
        let reader: BoxedReader = Box::pin(read_half);
        let writer: BoxedWriter = Box::pin(write_half);

        Self {
            inner: Arc::new(Inner {
                sub_device_id: config.sub_device_id,
                online_time: Local::now(),
                poll_interval: config.poll_interval,
                read_timeout: config.read_timeout,
                parent: config.parent,
                on_offline: config.on_offline,
                writer: FrameWriter::new(writer, shutdown.token()),
                reader: Mutex::new(Some(reader)),
                middlewares: RwLock::new(config.middlewares),
                inquiries: Mutex::new(config.inquiries),
                store: Arc::new(StateStore::new()),
                shutdown,
                started: AtomicBool::new(false),
            }),
        }
    }

    // ========== Identity ==========

    /// Sub-device address of this relay.
    #[must_use]
    pub fn sub_device_id(&self) -> u16 {
        self.inner.sub_device_id
    }

    /// When this relay instance was created.
    #[must_use]
    pub fn online_time(&self) -> DateTime<Local> {
        self.inner.online_time
    }

    /// Creation time formatted as `YYYY-MM-DD HH:MM:SS`.
    #[must_use]
    pub fn online_time_string(&self) -> String {
        self.inner.online_time.format(ONLINE_TIME_FORMAT).to_string()
    }

    /// Keep-alive poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Parent device handle, if configured.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<dyn ParentDevice>> {
        self.inner.parent.as_ref()
    }

    /// Returns `true` once the background loops have been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Returns `true` once the relay has gone offline.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }

    /// Shutdown signal shared by every task of this relay.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.inner.shutdown.clone()
    }

    pub(crate) fn store(&self) -> &StateStore {
        &self.inner.store
    }

    // ========== Lifecycle ==========

    /// Appends a middleware stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationLocked`] once the loops have started.
    pub fn use_middleware<M: Middleware + 'static>(&self, stage: M) -> Result<()> {
        let mut chain = self.inner.middlewares.write();
        if self.is_started() {
            return Err(Error::ConfigurationLocked);
        }
        chain.push(stage);
        Ok(())
    }

    /// Starts the read loop and the inquiry tasks.
    ///
    /// Must be called from within a Tokio runtime. Returns immediately; the
    /// loops run in the background until the relay goes offline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] if the loops were already started, the relay is
    /// offline, or no runtime is available. Nothing is spawned in that case.
    pub fn init(&self) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| InitError::NoRuntime(e.to_string()))?;
        if self.is_offline() {
            return Err(InitError::Offline.into());
        }

        let chain = {
            let chain = self.inner.middlewares.read();
            if self.inner.started.swap(true, Ordering::AcqRel) {
                return Err(InitError::AlreadyStarted.into());
            }
            chain.clone()
        };
        let Some(reader) = self.inner.reader.lock().take() else {
            return Err(InitError::Offline.into());
        };

        spawn_supervised(
            &runtime,
            self,
            "read-loop".to_string(),
            read_loop::run(
                self.clone(),
                FrameReader::new(reader),
                chain,
                self.inner.read_timeout,
            ),
        );

        let mut tasks = poller::default_tasks(self.inner.poll_interval);
        tasks.append(&mut self.inner.inquiries.lock());
        poller::spawn(&runtime, self, tasks);

        Ok(())
    }

    /// Brings the relay online: starts the loops and publishes the requested
    /// properties to the parent device.
    ///
    /// # Errors
    ///
    /// Returns the [`init`](Self::init) error; nothing is published then.
    pub fn online(&self, property_types: &[PropertyType]) -> Result<()> {
        self.init()?;
        tracing::info!(
            sub_device_id = self.inner.sub_device_id,
            online_time = %self.online_time_string(),
            "Relay online"
        );
        self.auto_post_property(property_types);
        Ok(())
    }

    /// Takes the relay offline.
    ///
    /// The first call fires the shutdown signal, closes the connection and
    /// invokes the offline callback on the calling task. Later and concurrent
    /// calls return without doing anything.
    pub async fn offline(&self) {
        if !self.inner.shutdown.trigger() {
            return;
        }
        tracing::info!(
            sub_device_id = self.inner.sub_device_id,
            online_time = %self.online_time_string(),
            "Relay offline"
        );

        if let Err(e) = self.inner.writer.close().await {
            tracing::debug!(
                sub_device_id = self.inner.sub_device_id,
                error = %e,
                "Error closing frame channel"
            );
        }
        // Never started: release the read half as well.
        drop(self.inner.reader.lock().take());

        if let Some(callback) = &self.inner.on_offline {
            callback(self);
        }
    }

    // ========== Inquiries ==========

    /// Writes a frame to the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`] if the channel is closed or the write fails.
    pub async fn send(&self, frame: &Frame) -> Result<()> {
        self.inner.writer.send(frame).await.map_err(Error::Frame)
    }

    /// Asks the device for its temperature and humidity.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be written.
    pub async fn inquire_temperature_humidity(&self) -> Result<()> {
        self.inquire(FrameKind::TemperatureHumidityInquiry).await
    }

    /// Asks the device for its input levels.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be written.
    pub async fn inquire_input_state(&self) -> Result<()> {
        self.inquire(FrameKind::InputStateInquiry).await
    }

    /// Asks the device for its output levels.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be written.
    pub async fn inquire_output_state(&self) -> Result<()> {
        self.inquire(FrameKind::OutputStateInquiry).await
    }

    async fn inquire(&self, kind: FrameKind) -> Result<()> {
        tracing::trace!(sub_device_id = self.inner.sub_device_id, %kind, "Sending inquiry");
        self.send(&Frame::inquiry(self.inner.sub_device_id, kind))
            .await
    }

    // ========== State & Properties ==========

    /// Returns a snapshot of the current relay state.
    #[must_use]
    pub fn state(&self) -> Arc<RelayState> {
        self.inner.store.snapshot()
    }

    /// Last known output levels.
    #[must_use]
    pub fn output_states(&self) -> Vec<OutputState> {
        self.state().output_states().to_vec()
    }

    /// Last known input levels.
    #[must_use]
    pub fn input_states(&self) -> Vec<InputState> {
        self.state().input_states().to_vec()
    }

    /// Last known temperature and humidity.
    #[must_use]
    pub fn temperature_and_humidity(&self) -> TemperatureAndHumidity {
        self.state().temperature_humidity()
    }

    /// Reads one property from the cached state.
    #[must_use]
    pub fn property(&self, property_type: PropertyType) -> Property {
        Property::from_state(&self.state(), property_type)
    }

    /// Accessors for every property type, reading the cached state.
    #[must_use]
    pub fn property_fn_map(&self) -> GetPropertyFnMap {
        property::property_fn_map(&self.inner.store)
    }

    /// Publishes the requested properties to the parent device.
    ///
    /// Duplicate types are published once, in first-seen order.
    pub fn auto_post_property(&self, property_types: &[PropertyType]) {
        let accessors = self.property_fn_map();
        let mut seen = Vec::with_capacity(property_types.len());
        let properties: Vec<Property> = property_types
            .iter()
            .filter(|t| {
                if seen.contains(*t) {
                    return false;
                }
                seen.push(**t);
                true
            })
            .filter_map(|t| accessors.get(t).map(|get| get()))
            .collect();

        match &self.inner.parent {
            Some(parent) => {
                tracing::debug!(
                    sub_device_id = self.inner.sub_device_id,
                    parent = parent.id(),
                    count = properties.len(),
                    "Posting relay properties"
                );
                parent.post_properties(self.inner.sub_device_id, &properties);
            }
            None => {
                tracing::debug!(
                    sub_device_id = self.inner.sub_device_id,
                    count = properties.len(),
                    "No parent device, skipping property post"
                );
            }
        }
    }
}

/// Spawns a relay task together with a watcher that takes the relay offline
/// if the task panics.
fn spawn_supervised<F>(runtime: &Handle, relay: &Relay, task: String, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = runtime.spawn(future);
    let relay = relay.clone();
    runtime.spawn(async move {
        if let Err(e) = handle.await
            && e.is_panic()
        {
            tracing::error!(
                sub_device_id = relay.sub_device_id(),
                task = %task,
                "Relay task panicked, taking relay offline"
            );
            relay.offline().await;
        }
    });
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("sub_device_id", &self.inner.sub_device_id)
            .field("online_time", &self.inner.online_time)
            .field("poll_interval", &self.inner.poll_interval)
            .field("started", &self.is_started())
            .field("offline", &self.is_offline())
            .finish_non_exhaustive()
    }
}

/// Builds a relay over an in-memory pipe; the second value is the device end.
#[cfg(test)]
pub(crate) fn test_relay(sub_device_id: u16) -> (Relay, tokio::io::DuplexStream) {
    let (host, device) = tokio::io::duplex(256);
    let config = RelayConfig::builder()
        .sub_device_id(sub_device_id)
        .poll_interval(Duration::from_secs(1))
        .build()
        .unwrap();
    (Relay::new(config, host), device)
}
