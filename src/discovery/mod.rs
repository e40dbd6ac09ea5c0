// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network discovery of climate units.
//!
//! Discovery runs in two steps:
//!
//! 1. A [`Discoverer`] lists every host answering on the local network,
//!    with the vendor name resolved from its hardware address.
//!    [`ArpScanDiscovery`] does this with the external `arp-scan` tool.
//! 2. [`enrich`] keeps the hosts whose vendor matches a pattern and fetches
//!    their basic and control info in parallel.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use climctl::config::{DiscoveryConfig, HttpConfig};
//! use climctl::discovery::{discover_units, ArpScanDiscovery};
//! use climctl::protocol::HttpControlClient;
//!
//! # async fn example() -> climctl::Result<()> {
//! let config = DiscoveryConfig::default().with_interface("wlan0");
//! let client = Arc::new(HttpControlClient::new(HttpConfig::default())?);
//!
//! let scanner = ArpScanDiscovery::new(config.clone());
//! let units = discover_units(&scanner, client, &config).await?;
//! for unit in &units {
//!     println!("{} {} {}", unit.ip, unit.mac, unit.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::params::ControlInfo;
use crate::protocol::ControlClient;

/// Name of the scanning tool.
pub const ARP_SCAN: &str = "arp-scan";

/// Status given to every host answering the scan.
pub const STATUS_ONLINE: &str = "online";

/// Output format requested from `arp-scan`.
const ARP_SCAN_FORMAT: &str = "--format=${ip};${mac};${vendor}";

/// A unit found on the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// IP address.
    pub ip: String,
    /// Hardware address.
    pub mac: String,
    /// Vendor name, replaced by the unit's own name once fetched.
    pub name: String,
    /// Model string, if known.
    pub model: String,
    /// Reachability status.
    pub status: String,
    /// Descriptive pairs, empty if the fetch failed.
    pub basic_info: ControlInfo,
    /// Control pairs, empty if the fetch failed.
    pub control_info: ControlInfo,
}

impl DiscoveredDevice {
    /// Creates an online unit without protocol info.
    #[must_use]
    pub fn new(ip: impl Into<String>, mac: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: mac.into(),
            name: name.into(),
            status: STATUS_ONLINE.to_string(),
            ..Self::default()
        }
    }
}

/// Source of hosts on the local network.
pub trait Discoverer: Send + Sync {
    /// Lists the hosts currently answering.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError` if a precondition is not met or the scan
    /// cannot run.
    fn discover(&self) -> impl Future<Output = Result<Vec<DiscoveredDevice>, DiscoveryError>> + Send;
}

/// Discovery through the `arp-scan` command line tool.
#[derive(Debug, Clone)]
pub struct ArpScanDiscovery {
    config: DiscoveryConfig,
}

impl ArpScanDiscovery {
    /// Creates a scanner for the configured interface.
    #[must_use]
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Returns the arguments passed to `arp-scan`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        // arp-scan takes its per-host timeout in milliseconds
        let timeout_ms = self.config.timeout().as_millis().to_string();
        vec![
            "-I".to_string(),
            self.config.interface.clone(),
            "--timeout".to_string(),
            timeout_ms,
            "--localnet".to_string(),
            "-x".to_string(),
            ARP_SCAN_FORMAT.to_string(),
        ]
    }

    fn check_interface(&self) -> Result<(), DiscoveryError> {
        let interface = self.config.interface.as_str();
        if interface.is_empty() || interface.contains('/') || !interface_exists(interface) {
            return Err(DiscoveryError::InterfaceNotFound(interface.to_string()));
        }
        Ok(())
    }
}

impl Discoverer for ArpScanDiscovery {
    async fn discover(&self) -> Result<Vec<DiscoveredDevice>, DiscoveryError> {
        tracing::info!(
            interface = %self.config.interface,
            timeout_secs = self.config.timeout_secs,
            "Scanning network"
        );

        self.check_interface()?;
        let tool = find_in_path(ARP_SCAN)
            .ok_or_else(|| DiscoveryError::ToolNotInstalled(ARP_SCAN.to_string()))?;

        let args = self.args();
        tracing::debug!(tool = %tool.display(), args = ?args, "Running scanner");

        let output = Command::new(&tool)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DiscoveryError::ToolNotInstalled(ARP_SCAN.to_string()),
                _ => DiscoveryError::ScanFailed(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiscoveryError::ScanFailed(format!(
                "{ARP_SCAN} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let devices = parse_arp_scan_output(&String::from_utf8_lossy(&output.stdout));
        tracing::info!(count = devices.len(), "Network scan complete");
        Ok(devices)
    }
}

/// Parses `ip;mac;vendor` lines as printed by `arp-scan`.
///
/// Banner lines, malformed lines and lines with an invalid IP address are
/// skipped. The vendor becomes the device name.
///
/// # Examples
///
/// ```
/// use climctl::discovery::parse_arp_scan_output;
///
/// let out = "Interface: eth0, type: EN10MB\n\
///            192.168.1.40;10:98:c3:aa:bb:cc;Murata Manufacturing Co., Ltd.\n\
///            Ending arp-scan 1.10.0: 256 hosts scanned";
/// let devices = parse_arp_scan_output(out);
/// assert_eq!(devices.len(), 1);
/// assert_eq!(devices[0].mac, "10:98:c3:aa:bb:cc");
/// ```
#[must_use]
pub fn parse_arp_scan_output(output: &str) -> Vec<DiscoveredDevice> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_banner(line))
        .filter_map(|line| {
            let mut parts = line.split(';').map(str::trim);
            let ip = parts.next()?;
            let mac = parts.next()?;
            let vendor = parts.next().unwrap_or_default();
            ip.parse::<IpAddr>().ok()?;
            Some(DiscoveredDevice::new(ip, mac, vendor))
        })
        .collect()
}

fn is_banner(line: &str) -> bool {
    ["Starting arp-scan", "Interface:", "Starting:", "Ending arp-scan", "packets"]
        .iter()
        .any(|marker| line.contains(marker))
}

/// Keeps the devices whose name contains `pattern`, case-insensitive.
#[must_use]
pub fn filter_by_vendor(devices: Vec<DiscoveredDevice>, pattern: &str) -> Vec<DiscoveredDevice> {
    let pattern = pattern.to_lowercase();
    devices
        .into_iter()
        .filter(|d| d.name.to_lowercase().contains(&pattern))
        .collect()
}

/// Filters devices by vendor and fetches their basic and control info.
///
/// At most `workers` units are queried at once; `timeout` bounds both
/// fetches of one unit. A failed fetch is logged and leaves the device's
/// info empty. A non-empty fetched `name` replaces the vendor name. Output
/// order follows input order.
pub async fn enrich<C: ControlClient>(
    devices: Vec<DiscoveredDevice>,
    pattern: &str,
    client: Arc<C>,
    workers: usize,
    timeout: Duration,
) -> Vec<DiscoveredDevice> {
    let mut devices = filter_by_vendor(devices, pattern);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (index, device) in devices.iter().enumerate() {
        let ip = device.ip.clone();
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, None);
            };
            tracing::debug!(ip = %ip, "Fetching unit info");
            let fetched = tokio::time::timeout(timeout, async {
                let basic = client.fetch_basic_info(&ip).await;
                let control = client.fetch_control_info(&ip).await;
                (basic, control)
            })
            .await;
            match fetched {
                Ok(results) => (index, Some(results)),
                Err(_) => {
                    tracing::warn!(ip = %ip, timeout_ms = timeout.as_millis(), "Unit info fetch timed out");
                    (index, None)
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, results) = match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Unit info task failed");
                continue;
            }
        };
        let (Some((basic, control)), Some(device)) = (results, devices.get_mut(index)) else {
            continue;
        };

        match basic {
            Ok(info) => {
                if let Some(name) = info.get("name").filter(|n| !n.is_empty()) {
                    device.name.clone_from(name);
                }
                device.basic_info = info;
            }
            Err(e) => tracing::warn!(ip = %device.ip, error = %e, "Failed to fetch basic info"),
        }
        match control {
            Ok(info) => device.control_info = info,
            Err(e) => tracing::warn!(ip = %device.ip, error = %e, "Failed to fetch control info"),
        }
    }

    devices
}

/// Scans the network and enriches the units matching the configured vendor.
///
/// # Errors
///
/// Returns `DiscoveryError` if the scan itself fails. Per-unit fetch
/// failures never abort discovery.
pub async fn discover_units<D, C>(
    discoverer: &D,
    client: Arc<C>,
    config: &DiscoveryConfig,
) -> Result<Vec<DiscoveredDevice>, DiscoveryError>
where
    D: Discoverer,
    C: ControlClient,
{
    let hosts = discoverer.discover().await?;
    let units = enrich(
        hosts,
        &config.vendor_pattern,
        client,
        config.workers,
        config.timeout(),
    )
    .await;
    tracing::info!(count = units.len(), pattern = %config.vendor_pattern, "Climate units found");
    Ok(units)
}

#[cfg(target_os = "linux")]
fn interface_exists(interface: &str) -> bool {
    Path::new("/sys/class/net").join(interface).exists()
}

#[cfg(not(target_os = "linux"))]
fn interface_exists(_interface: &str) -> bool {
    true
}

fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}
