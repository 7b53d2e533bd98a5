// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `relaylink` - lifecycle management for relay sub-devices.
//!
//! A relay is a logically addressed switch unit reached through a shared
//! connection to a parent gateway. This library keeps one relay online over
//! that connection:
//!
//! - **Read loop**: decodes device reports and applies them to a state store
//! - **Inquiry tasks**: poll the device on a keep-alive interval
//! - **Middleware**: transform or drop inbound frames before they are applied
//! - **Offline handling**: a single shutdown signal tears everything down and
//!   notifies the caller exactly once
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use relaylink::{PropertyType, Relay, RelayConfig, middleware::FrameLogger};
//!
//! #[tokio::main]
//! async fn main() -> relaylink::Result<()> {
//!     let stream = tokio::net::TcpStream::connect("192.168.1.60:8899")
//!         .await
//!         .expect("gateway reachable");
//!
//!     let config = RelayConfig::builder()
//!         .sub_device_id(1)
//!         .poll_interval(Duration::from_secs(10))
//!         .middleware(FrameLogger::default())
//!         .on_offline(|relay| println!("relay {} went offline", relay.sub_device_id()))
//!         .build()?;
//!
//!     let relay = Relay::new(config, stream);
//!     relay.online(&[PropertyType::TemperatureHumidity, PropertyType::InputState])?;
//!
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     println!("{}", relay.temperature_and_humidity());
//!
//!     relay.offline().await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod middleware;
pub mod property;
pub mod protocol;
mod relay;
pub mod state;
pub mod types;

pub use error::{ConfigError, Error, FrameError, InitError, Result};
pub use property::{GetPropertyFn, GetPropertyFnMap, ParentDevice, Property, PropertyType};
pub use relay::{
    InquiryTask, OfflineCallback, Relay, RelayConfig, RelayConfigBuilder, ShutdownSignal,
};
pub use state::{RelayState, StateStore, StateUpdate};
pub use types::{InputState, OutputState, TemperatureAndHumidity};
