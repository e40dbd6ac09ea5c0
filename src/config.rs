// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Library configuration.
//!
//! Configuration is an explicit value: each component receives the section
//! it needs in its constructor, and nothing reads ambient global state.
//! Every section derives `serde` traits with defaults for missing fields, so
//! an application can load it from whatever file format it prefers.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use climctl::config::{BatchConfig, Config};
//!
//! let config = Config::default()
//!     .with_storage_path("/tmp/climctl/devices.json")
//!     .with_batch(BatchConfig::default().with_concurrency(4));
//!
//! assert_eq!(config.batch.concurrency, 4);
//! assert_eq!(config.session.poll_interval, Duration::from_secs(2));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::params::ControlSettings;

/// Directory name used under the user configuration directory.
pub const APP_DIR: &str = "climctl";

/// File name of the persisted device history.
pub const STORAGE_FILE_NAME: &str = "devices.json";

/// Root configuration value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location of the device history file. Defaults to
    /// `<user config dir>/climctl/devices.json`.
    pub storage_path: Option<PathBuf>,
    /// HTTP settings for talking to units.
    pub http: HttpConfig,
    /// Network scan settings.
    pub discovery: DiscoveryConfig,
    /// Batch apply settings.
    pub batch: BatchConfig,
    /// Interactive session settings.
    pub session: SessionConfig,
    /// Values staged when a session starts.
    pub defaults: ControlSettings,
}

impl Config {
    /// Sets an explicit storage path.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Sets the HTTP section.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Sets the discovery section.
    #[must_use]
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Sets the batch section.
    #[must_use]
    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    /// Sets the session section.
    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Sets the default staged values.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ControlSettings) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the storage path, falling back to the platform default.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoStorageLocation` if no path is configured and
    /// the platform has no user configuration directory.
    pub fn storage_path(&self) -> Result<PathBuf, StoreError> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|mut path| {
                path.push(APP_DIR);
                path.push(STORAGE_FILE_NAME);
                path
            })
            .ok_or(StoreError::NoStorageLocation)
    }
}

/// HTTP settings shared by every unit.
///
/// Units are plain HTTP on a fixed port; each request carries the timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP port of the units.
    pub port: u16,
    /// Timeout applied to every request.
    #[serde(with = "duration_ms", rename = "timeout_ms")]
    pub timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the base URL for a unit address.
    ///
    /// An address that already carries a port (`host:port`) is used as is.
    #[must_use]
    pub fn base_url(&self, ip: &str) -> String {
        if ip.starts_with("http://") || ip.starts_with("https://") {
            return ip.trim_end_matches('/').to_string();
        }
        if self.port == Self::DEFAULT_PORT || ip.contains(':') {
            format!("http://{ip}")
        } else {
            format!("http://{ip}:{}", self.port)
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Network scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Network interface to scan.
    pub interface: String,
    /// Scan timeout in seconds, also used for per-unit info fetches.
    pub timeout_secs: u64,
    /// Maximum number of units queried in parallel.
    pub workers: usize,
    /// Case-insensitive vendor substring that identifies climate units.
    pub vendor_pattern: String,
}

impl DiscoveryConfig {
    /// Sets the interface.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Sets the scan timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the worker cap.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the vendor pattern.
    #[must_use]
    pub fn with_vendor_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.vendor_pattern = pattern.into();
        self
    }

    /// Returns the timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interface: "eth0".to_string(),
            timeout_secs: 5,
            workers: 10,
            vendor_pattern: "murata".to_string(),
        }
    }
}

/// Batch apply settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of units contacted at once.
    pub concurrency: usize,
    /// Timeout for one unit, covering every request made to it.
    #[serde(with = "duration_ms", rename = "device_timeout_ms")]
    pub device_timeout: Duration,
}

impl BatchConfig {
    /// Sets the concurrency limit. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the per-unit timeout.
    #[must_use]
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            device_timeout: Duration::from_secs(4),
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between live value refreshes.
    #[serde(with = "duration_ms", rename = "poll_interval_ms")]
    pub poll_interval: Duration,
    /// Timeout for one live value fetch.
    #[serde(with = "duration_ms", rename = "fetch_timeout_ms")]
    pub fetch_timeout: Duration,
}

impl SessionConfig {
    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            fetch_timeout: Duration::from_secs(3),
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
