// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `climctl` - discover, track and batch-control networked climate units.
//!
//! Climate units expose a small HTTP interface answering with
//! `key=value,key=value` bodies. This library covers the whole life cycle
//! of a fleet of such units:
//!
//! - **Discovery**: scan the local network and fetch each unit's info
//!   ([`discovery`])
//! - **History**: keep every observation per MAC address, with field-level
//!   change records ([`store`])
//! - **Groups**: resolve per-group parameters with per-unit overrides
//!   ([`group`])
//! - **Batch apply**: push parameters to many units concurrently
//!   ([`batch`])
//! - **Interactive control**: a terminal-independent state machine and its
//!   tokio runtime ([`session`])
//!
//! # Quick Start
//!
//! ## Discover and record units
//!
//! ```no_run
//! use std::sync::Arc;
//! use climctl::{ArpScanDiscovery, Config, HttpControlClient, SnapshotStore};
//! use climctl::discovery::discover_units;
//!
//! #[tokio::main]
//! async fn main() -> climctl::Result<()> {
//!     let config = Config::default();
//!     let client = Arc::new(HttpControlClient::new(config.http.clone())?);
//!
//!     let scanner = ArpScanDiscovery::new(config.discovery.clone());
//!     let units = discover_units(&scanner, client, &config.discovery).await?;
//!
//!     let store = SnapshotStore::from_config(&config)?;
//!     let summary = store.save_devices(&units)?;
//!     println!("{} new, {} changed", summary.added, summary.updated);
//!     Ok(())
//! }
//! ```
//!
//! ## Apply a batch script
//!
//! ```no_run
//! use std::sync::Arc;
//! use climctl::{BatchApply, BatchScript, Config, HttpControlClient, SnapshotStore};
//!
//! #[tokio::main]
//! async fn main() -> climctl::Result<()> {
//!     let config = Config::default();
//!     let histories = SnapshotStore::from_config(&config)?.list_all()?;
//!     let targets = BatchScript::load("floors.json")?.resolve(&histories);
//!
//!     let client = Arc::new(HttpControlClient::new(config.http.clone())?);
//!     let report = BatchApply::new(client, config.batch.clone()).apply(targets).await;
//!
//!     for outcome in report.sorted_by_device() {
//!         match outcome.error() {
//!             None => println!("OK  {} ({})", outcome.name, outcome.ip),
//!             Some(e) => println!("ERR {} ({}): {e}", outcome.name, outcome.ip),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod group;
pub mod params;
pub mod protocol;
pub mod session;
pub mod store;
pub mod types;

pub use batch::{ApplyOutcome, ApplyStatus, ApplyTarget, BatchApply, BatchReport};
pub use config::Config;
pub use discovery::{ArpScanDiscovery, DiscoveredDevice, Discoverer};
pub use error::{
    DiscoveryError, Error, ProtocolError, Result, ScriptError, StoreError, ValueError,
};
pub use group::{BatchScript, DeviceOverride, GroupConfig};
pub use params::{ControlInfo, ControlParams, ControlSettings, SetControlCommand};
pub use protocol::ControlClient;
#[cfg(feature = "http")]
pub use protocol::HttpControlClient;
pub use session::{ControlSession, SessionRuntime};
pub use store::{DeviceChange, DeviceHistory, DeviceSnapshot, DeviceStorage, SnapshotStore};
pub use types::{FanDirection, FanRate, Mode, Power, Temperature};
