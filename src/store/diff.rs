// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot comparison.
//!
//! Compares two observations of the same unit and reports one
//! [`DeviceChange`] per differing field:
//! - scalar fields (`ip`, `name`, `model`, `status`) by inequality
//! - `basic_info` and `control_info` key by key, over the union of keys

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::params::ControlInfo;

use super::model::{DeviceChange, DeviceSnapshot};

/// Compares two snapshots, stamping every change with `now`.
///
/// Timestamps and the MAC are not compared.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use climctl::discovery::DiscoveredDevice;
/// use climctl::store::{diff, DeviceSnapshot};
///
/// let now = Utc::now();
/// let old = DeviceSnapshot::observe(&DiscoveredDevice::new("10.0.0.5", "AA", "Unit1"), now);
/// let mut new = old.clone();
/// new.ip = "10.0.0.9".to_string();
///
/// let changes = diff(&old, &new, now);
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].field, "ip");
/// ```
#[must_use]
pub fn diff(old: &DeviceSnapshot, new: &DeviceSnapshot, now: DateTime<Utc>) -> Vec<DeviceChange> {
    let mut changes = Vec::new();

    let scalars = [
        ("ip", &old.ip, &new.ip),
        ("name", &old.name, &new.name),
        ("model", &old.model, &new.model),
        ("status", &old.status, &new.status),
    ];
    for (field, old_value, new_value) in scalars {
        if old_value != new_value {
            changes.push(DeviceChange {
                field: field.to_string(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
                changed_at: now,
            });
        }
    }

    compare_maps("basic_info", &old.basic_info, &new.basic_info, now, &mut changes);
    compare_maps(
        "control_info",
        &old.control_info,
        &new.control_info,
        now,
        &mut changes,
    );

    changes
}

/// Compares two snapshots using the current time.
#[must_use]
pub fn detect_changes(old: &DeviceSnapshot, new: &DeviceSnapshot) -> Vec<DeviceChange> {
    diff(old, new, Utc::now())
}

fn compare_maps(
    prefix: &str,
    old: &ControlInfo,
    new: &ControlInfo,
    now: DateTime<Utc>,
    changes: &mut Vec<DeviceChange>,
) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        let (old_value, new_value) = match (old.get(key), new.get(key)) {
            (Some(o), Some(n)) if o == n => continue,
            (Some(o), Some(n)) => (o.clone(), n.clone()),
            (None, Some(n)) => (String::new(), n.clone()),
            (Some(o), None) => (o.clone(), String::new()),
            (None, None) => continue,
        };
        changes.push(DeviceChange {
            field: format!("{prefix}.{key}"),
            old_value,
            new_value,
            changed_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveredDevice;

    fn snapshot() -> DeviceSnapshot {
        let mut device = DiscoveredDevice::new("10.0.0.5", "AA", "Unit1");
        device.model = "M1".to_string();
        device.basic_info = [("grp_name", "Office"), ("ver", "1_2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        device.control_info = [("pow", "1"), ("mode", "4"), ("stemp", "22.0")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeviceSnapshot::observe(&device, Utc::now())
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let old = snapshot();
        assert!(diff(&old, &old.clone(), Utc::now()).is_empty());
    }

    #[test]
    fn timestamps_are_not_compared() {
        let old = snapshot();
        let mut new = old.clone();
        new.last_seen_at = old.last_seen_at + chrono::TimeDelta::hours(1);
        assert!(detect_changes(&old, &new).is_empty());
    }

    #[test]
    fn scalar_changes() {
        let old = snapshot();
        let mut new = old.clone();
        new.name = "Unit2".to_string();
        new.status = "offline".to_string();
        let changes = diff(&old, &new, Utc::now());
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["name", "status"]);
        assert_eq!(changes[0].old_value, "Unit1");
        assert_eq!(changes[0].new_value, "Unit2");
    }

    #[test]
    fn map_addition_removal_and_modification() {
        let old = snapshot();
        let mut new = old.clone();
        new.control_info.insert("mode".to_string(), "1".to_string());
        new.control_info.remove("stemp");
        new.control_info.insert("f_rate".to_string(), "A".to_string());
        new.basic_info.remove("ver");

        let now = Utc::now();
        let changes = diff(&old, &new, now);
        assert_eq!(changes.len(), 4);

        let find = |field: &str| changes.iter().find(|c| c.field == field).unwrap();
        let removed = find("basic_info.ver");
        assert_eq!((removed.old_value.as_str(), removed.new_value.as_str()), ("1_2", ""));
        let added = find("control_info.f_rate");
        assert_eq!((added.old_value.as_str(), added.new_value.as_str()), ("", "A"));
        let modified = find("control_info.mode");
        assert_eq!((modified.old_value.as_str(), modified.new_value.as_str()), ("4", "1"));
        let gone = find("control_info.stemp");
        assert_eq!(gone.new_value, "");

        assert!(changes.iter().all(|c| c.changed_at == now));
    }

    #[test]
    fn every_key_of_either_side_is_considered() {
        let mut old = snapshot();
        old.control_info.clear();
        let mut new = old.clone();
        for i in 0..20 {
            new.control_info.insert(format!("k{i}"), i.to_string());
        }
        assert_eq!(diff(&old, &new, Utc::now()).len(), 20);
        assert_eq!(diff(&new, &old, Utc::now()).len(), 20);
    }
}
