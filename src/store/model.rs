// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted device history model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::discovery::DiscoveredDevice;
use crate::params::ControlInfo;

/// Basic info key carrying the unit's group label.
pub const GROUP_NAME_KEY: &str = "grp_name";

/// A point-in-time observation of one unit.
///
/// Snapshots are immutable once they are pushed into a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Address at observation time. May rotate between scans.
    #[serde(default)]
    pub ip: String,
    /// Hardware address, the stable identity of the unit.
    #[serde(default)]
    pub mac: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Model string.
    #[serde(default)]
    pub model: String,
    /// Reachability status reported by discovery.
    #[serde(default)]
    pub status: String,
    /// Descriptive protocol pairs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub basic_info: ControlInfo,
    /// Control protocol pairs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub control_info: ControlInfo,
    /// When the unit was first seen. Carried over on every re-observation.
    pub discovered_at: DateTime<Utc>,
    /// When the unit was last seen by a scan.
    pub last_seen_at: DateTime<Utc>,
}

impl DeviceSnapshot {
    /// Builds a first-sight snapshot from a discovered unit.
    #[must_use]
    pub fn observe(device: &DiscoveredDevice, now: DateTime<Utc>) -> Self {
        Self {
            ip: device.ip.clone(),
            mac: device.mac.clone(),
            name: device.name.clone(),
            model: device.model.clone(),
            status: device.status.clone(),
            basic_info: device.basic_info.clone(),
            control_info: device.control_info.clone(),
            discovered_at: now,
            last_seen_at: now,
        }
    }

    /// Returns the group label from the basic info, if any.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.basic_info.get(GROUP_NAME_KEY).map(String::as_str)
    }
}

/// One detected field-level delta.
///
/// An empty `old_value` marks a field that appeared, an empty `new_value` a
/// field that disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceChange {
    /// Dotted field path, e.g. `ip` or `control_info.mode`.
    pub field: String,
    /// Value before the change.
    #[serde(default)]
    pub old_value: String,
    /// Value after the change.
    #[serde(default)]
    pub new_value: String,
    /// When the change was detected.
    pub changed_at: DateTime<Utc>,
}

/// Everything known about one unit, keyed by MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHistory {
    /// Primary key.
    pub mac: String,
    /// Latest observation.
    pub device: DeviceSnapshot,
    /// Earlier observations, oldest first. The latest lives in `device`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub snapshots: Vec<DeviceSnapshot>,
    /// Every change ever detected, in detection order. Never truncated.
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<DeviceChange>,
}

impl DeviceHistory {
    /// Creates the history of a unit seen for the first time.
    #[must_use]
    pub fn new(device: DeviceSnapshot) -> Self {
        Self {
            mac: device.mac.clone(),
            device,
            snapshots: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Returns the latest display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.device.name
    }

    /// Returns the latest address.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.device.ip
    }

    /// Returns the timestamp of the most recent change, if any.
    #[must_use]
    pub fn last_change_at(&self) -> Option<DateTime<Utc>> {
        self.changes.iter().map(|c| c.changed_at).max()
    }
}

/// Root aggregate persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStorage {
    /// Histories keyed by MAC address.
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: BTreeMap<String, DeviceHistory>,
    /// Set on every persist.
    pub last_updated: DateTime<Utc>,
}

impl DeviceStorage {
    /// Creates an empty aggregate stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Returns the number of known units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no unit is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `null` as the type's default, for documents written by tools that
/// encode empty collections that way.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_field_names() {
        let now = Utc::now();
        let mut storage = DeviceStorage::new();
        let snapshot = DeviceSnapshot {
            ip: "10.0.0.5".to_string(),
            mac: "AA".to_string(),
            name: "Unit1".to_string(),
            model: String::new(),
            status: "online".to_string(),
            basic_info: ControlInfo::new(),
            control_info: ControlInfo::new(),
            discovered_at: now,
            last_seen_at: now,
        };
        storage
            .devices
            .insert("AA".to_string(), DeviceHistory::new(snapshot));

        let value = serde_json::to_value(&storage).unwrap();
        assert!(value.get("last_updated").is_some());
        let history = &value["devices"]["AA"];
        assert_eq!(history["mac"], "AA");
        assert_eq!(history["device"]["name"], "Unit1");
        assert!(history["device"].get("basic_info").is_some());
        assert!(history["device"].get("discovered_at").is_some());
        assert!(history["snapshots"].as_array().unwrap().is_empty());
        assert!(history["changes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn null_collections_load_as_empty() {
        let json = r#"{
            "devices": {
                "AA": {
                    "mac": "AA",
                    "device": {
                        "ip": "10.0.0.5", "mac": "AA", "name": "Unit1",
                        "model": "", "status": "online",
                        "basic_info": null, "control_info": null,
                        "discovered_at": "2024-05-01T10:00:00.123456789+02:00",
                        "last_seen_at": "2024-05-01T10:00:00Z"
                    },
                    "snapshots": null,
                    "changes": null
                }
            },
            "last_updated": "2024-05-01T10:00:00Z"
        }"#;
        let storage: DeviceStorage = serde_json::from_str(json).unwrap();
        let history = &storage.devices["AA"];
        assert!(history.device.basic_info.is_empty());
        assert!(history.snapshots.is_empty());
        assert!(history.changes.is_empty());
    }

    #[test]
    fn group_name_from_basic_info() {
        let now = Utc::now();
        let mut device = DiscoveredDevice::new("10.0.0.5", "AA", "Unit1");
        device
            .basic_info
            .insert(GROUP_NAME_KEY.to_string(), "Office".to_string());
        let snapshot = DeviceSnapshot::observe(&device, now);
        assert_eq!(snapshot.group_name(), Some("Office"));
        assert_eq!(snapshot.discovered_at, now);
        assert_eq!(snapshot.last_seen_at, now);
    }
}
