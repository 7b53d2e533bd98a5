// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::Relay;
use super::poller::InquiryTask;
use crate::error::ConfigError;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::property::ParentDevice;

/// Callback invoked once when a relay goes offline.
pub type OfflineCallback = Arc<dyn Fn(&Relay) + Send + Sync>;

/// Validated configuration for a [`Relay`].
///
/// Build one with [`RelayConfig::builder`]; required fields are checked by
/// [`RelayConfigBuilder::build`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use relaylink::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .sub_device_id(3)
///     .poll_interval(Duration::from_secs(5))
///     .on_offline(|relay| println!("relay {} offline", relay.sub_device_id()))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.sub_device_id(), 3);
/// ```
#[derive(Clone)]
pub struct RelayConfig {
    pub(super) sub_device_id: u16,
    pub(super) poll_interval: Duration,
    pub(super) read_timeout: Option<Duration>,
    pub(super) middlewares: MiddlewareChain,
    pub(super) on_offline: Option<OfflineCallback>,
    pub(super) parent: Option<Arc<dyn ParentDevice>>,
    pub(super) inquiries: Vec<InquiryTask>,
}

impl RelayConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Sub-device address of the relay.
    #[must_use]
    pub fn sub_device_id(&self) -> u16 {
        self.sub_device_id
    }

    /// Keep-alive interval used by the default inquiries.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Idle read timeout, if any.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("sub_device_id", &self.sub_device_id)
            .field("poll_interval", &self.poll_interval)
            .field("read_timeout", &self.read_timeout)
            .field("middlewares", &self.middlewares)
            .field("on_offline", &self.on_offline.is_some())
            .field("parent", &self.parent)
            .field("inquiries", &self.inquiries)
            .finish()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Default)]
pub struct RelayConfigBuilder {
    sub_device_id: Option<u16>,
    poll_interval: Option<Duration>,
    read_timeout: Option<Duration>,
    middlewares: MiddlewareChain,
    on_offline: Option<OfflineCallback>,
    parent: Option<Arc<dyn ParentDevice>>,
    inquiries: Vec<InquiryTask>,
}

impl RelayConfigBuilder {
    /// Sets the sub-device address (required).
    #[must_use]
    pub fn sub_device_id(mut self, id: u16) -> Self {
        self.sub_device_id = Some(id);
        self
    }

    /// Sets the keep-alive poll interval (required, non-zero).
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets an idle read timeout. Without one, the read loop waits on the
    /// transport indefinitely.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Appends a middleware stage.
    #[must_use]
    pub fn middleware<M: Middleware + 'static>(mut self, stage: M) -> Self {
        self.middlewares.push(stage);
        self
    }

    /// Replaces the middleware chain.
    #[must_use]
    pub fn middlewares(mut self, chain: MiddlewareChain) -> Self {
        self.middlewares = chain;
        self
    }

    /// Sets the callback invoked when the relay goes offline.
    #[must_use]
    pub fn on_offline<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Relay) + Send + Sync + 'static,
    {
        self.on_offline = Some(Arc::new(callback));
        self
    }

    /// Sets the parent device the relay publishes properties to.
    #[must_use]
    pub fn parent(mut self, parent: Arc<dyn ParentDevice>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Registers an inquiry task in addition to the default ones.
    #[must_use]
    pub fn inquiry(mut self, task: InquiryTask) -> Self {
        self.inquiries.push(task);
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required field is missing or an interval
    /// is zero.
    pub fn build(self) -> Result<RelayConfig, ConfigError> {
        let sub_device_id = self
            .sub_device_id
            .ok_or(ConfigError::MissingField("sub_device_id"))?;
        let poll_interval = self
            .poll_interval
            .ok_or(ConfigError::MissingField("poll_interval"))?;

        if poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroReadTimeout);
        }
        if let Some(task) = self.inquiries.iter().find(|t| t.interval().is_zero()) {
            return Err(ConfigError::ZeroInquiryInterval(task.name().to_string()));
        }

        Ok(RelayConfig {
            sub_device_id,
            poll_interval,
            read_timeout: self.read_timeout,
            middlewares: self.middlewares,
            on_offline: self.on_offline,
            parent: self.parent,
            inquiries: self.inquiries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_sub_device_id() {
        let err = RelayConfig::builder()
            .poll_interval(Duration::from_secs(1))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingField("sub_device_id"));
    }

    #[test]
    fn build_requires_poll_interval() {
        let err = RelayConfig::builder().sub_device_id(1).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingField("poll_interval"));
    }

    #[test]
    fn build_rejects_zero_poll_interval() {
        let err = RelayConfig::builder()
            .sub_device_id(1)
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroPollInterval);
    }

    #[test]
    fn build_rejects_zero_read_timeout() {
        let err = RelayConfig::builder()
            .sub_device_id(1)
            .poll_interval(Duration::from_secs(1))
            .read_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroReadTimeout);
    }

    #[test]
    fn build_rejects_zero_inquiry_interval() {
        let task = InquiryTask::new("output-state", Duration::ZERO, |relay: Relay| async move {
            relay.inquire_output_state().await
        });
        let err = RelayConfig::builder()
            .sub_device_id(1)
            .poll_interval(Duration::from_secs(1))
            .inquiry(task)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroInquiryInterval("output-state".to_string()));
    }

    #[test]
    fn builder_collects_optional_fields() {
        let config = RelayConfig::builder()
            .sub_device_id(42)
            .poll_interval(Duration::from_millis(500))
            .read_timeout(Duration::from_secs(3))
            .middleware(crate::middleware::AddressFilter)
            .on_offline(|_| {})
            .build()
            .unwrap();

        assert_eq!(config.sub_device_id(), 42);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.middlewares.len(), 1);
        assert!(config.on_offline.is_some());
        assert!(config.parent.is_none());
    }
}
