// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the on-disk device history.

use std::fs;

use climctl::discovery::DiscoveredDevice;
use climctl::store::SnapshotStore;
use climctl::{Error, StoreError};

fn store() -> (tempfile::TempDir, SnapshotStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("climctl").join("devices.json"));
    (dir, store)
}

#[test]
fn first_scan_then_address_change() {
    let (_dir, store) = store();

    store
        .save_devices(&[DiscoveredDevice::new("10.0.0.5", "AA", "Unit1")])
        .unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].device.name, "Unit1");
    assert!(all[0].snapshots.is_empty());
    assert!(all[0].changes.is_empty());

    store
        .save_devices(&[DiscoveredDevice::new("10.0.0.9", "AA", "Unit1")])
        .unwrap();

    let history = store.find_by_mac("AA").unwrap();
    assert_eq!(history.changes.len(), 1);
    let change = &history.changes[0];
    assert_eq!(change.field, "ip");
    assert_eq!(change.old_value, "10.0.0.5");
    assert_eq!(change.new_value, "10.0.0.9");
    assert_eq!(history.snapshots.len(), 1);
    assert_eq!(history.snapshots[0].ip, "10.0.0.5");
    assert_eq!(history.device.discovered_at, history.snapshots[0].discovered_at);
}

#[test]
fn document_layout() {
    let (_dir, store) = store();
    store
        .save_devices(&[DiscoveredDevice::new("10.0.0.5", "AA", "Unit1")])
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert!(json["last_updated"].is_string());
    assert_eq!(json["devices"]["AA"]["device"]["ip"], "10.0.0.5");
    assert_eq!(json["devices"]["AA"]["device"]["status"], "online");
}

#[test]
fn document_from_other_writer_loads() {
    let (dir, _) = store();
    let path = dir.path().join("devices.json");
    fs::write(
        &path,
        r#"{
  "devices": {
    "10:98:c3:00:00:01": {
      "mac": "10:98:c3:00:00:01",
      "device": {
        "ip": "192.168.1.40",
        "mac": "10:98:c3:00:00:01",
        "name": "Office",
        "model": "",
        "status": "online",
        "basic_info": {"grp_name": "Floor1"},
        "control_info": {"mode": "4"},
        "discovered_at": "2024-05-01T10:00:00.123456789+02:00",
        "last_seen_at": "2024-05-02T10:00:00+02:00"
      },
      "snapshots": null,
      "changes": [
        {"field": "control_info.mode", "old_value": "1", "new_value": "4",
         "changed_at": "2024-05-02T10:00:00+02:00"}
      ]
    }
  },
  "last_updated": "2024-05-02T10:00:00+02:00"
}"#,
    )
    .unwrap();

    let store = SnapshotStore::new(&path);
    let history = store.find_by_mac("10:98:c3:00:00:01").unwrap();
    assert_eq!(history.device.group_name(), Some("Floor1"));
    assert!(history.snapshots.is_empty());
    assert_eq!(history.changes.len(), 1);

    let mut storage = store.load().unwrap();
    let before = storage.devices.clone();
    store.save(&mut storage).unwrap();
    assert_eq!(store.load().unwrap().devices, before);
}

#[test]
fn corrupt_document_is_a_hard_error() {
    let (dir, _) = store();
    let path = dir.path().join("devices.json");
    fs::write(&path, "{\"devices\": [1, 2").unwrap();

    let store = SnapshotStore::new(&path);
    assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    assert!(matches!(
        store.find_by_mac("AA"),
        Err(Error::Store(StoreError::Corrupt { .. }))
    ));
    assert!(store.save_devices(&[]).is_err());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"devices\": [1, 2",
        "a failed load must not overwrite the document"
    );
}

#[test]
fn unknown_mac_is_not_found() {
    let (_dir, store) = store();
    assert!(matches!(
        store.find_by_mac("FF"),
        Err(Error::DeviceNotFound(_))
    ));
}
