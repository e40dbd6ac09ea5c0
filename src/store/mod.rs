// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistent device history.
//!
//! The whole history lives in one JSON document, read in full and written in
//! full on every mutation:
//!
//! ```json
//! { "devices": { "<MAC>": { "mac": "...", "device": {...}, "snapshots": [...], "changes": [...] } },
//!   "last_updated": "2024-05-01T10:00:00Z" }
//! ```
//!
//! The store assumes a single writer.
//!
//! # Examples
//!
//! ```no_run
//! use climctl::discovery::DiscoveredDevice;
//! use climctl::store::SnapshotStore;
//!
//! # fn example() -> climctl::Result<()> {
//! let store = SnapshotStore::new("/tmp/climctl/devices.json");
//! store.save_devices(&[DiscoveredDevice::new("10.0.0.5", "AA", "Unit1")])?;
//!
//! for history in store.list_all()? {
//!     println!("{} {} ({} changes)", history.mac, history.name(), history.changes.len());
//! }
//! # Ok(())
//! # }
//! ```

mod diff;
mod model;
mod query;

pub use diff::{detect_changes, diff};
pub use model::{DeviceChange, DeviceHistory, DeviceSnapshot, DeviceStorage, GROUP_NAME_KEY};
pub use query::{RecordOutcome, SaveSummary, sort_by_name};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::Config;
use crate::discovery::DiscoveredDevice;
use crate::error::{Error, StoreError};

/// File-backed snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the configured or default location.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoStorageLocation` if no location can be determined.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        config.storage_path().map(Self::new)
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted aggregate.
    ///
    /// An absent file yields an empty aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read and
    /// `StoreError::Corrupt` if it does not parse.
    pub fn load(&self) -> Result<DeviceStorage, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No device history yet");
                return Ok(DeviceStorage::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the full aggregate, stamping `last_updated`.
    ///
    /// The document is written to a temporary sibling file and renamed over
    /// the target, so readers see either the old or the new document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if serialization or any file operation fails.
    pub fn save(&self, storage: &mut DeviceStorage) -> Result<(), StoreError> {
        storage.last_updated = Utc::now();
        let bytes = serde_json::to_vec_pretty(storage).map_err(StoreError::Serialize)?;
        self.write_atomic(&bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            devices = storage.len(),
            "Saved device history"
        );
        Ok(())
    }

    /// Merges a batch of observations in one load/save cycle.
    ///
    /// Observations are applied in order, so two entries with the same MAC
    /// are diffed one after the other.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the history cannot be loaded or saved.
    pub fn save_devices(&self, devices: &[DiscoveredDevice]) -> Result<SaveSummary, StoreError> {
        self.save_devices_at(devices, Utc::now())
    }

    /// Like [`save_devices`](Self::save_devices) with an explicit observation time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the history cannot be loaded or saved.
    pub fn save_devices_at(
        &self,
        devices: &[DiscoveredDevice],
        now: DateTime<Utc>,
    ) -> Result<SaveSummary, StoreError> {
        let mut storage = self.load()?;
        let mut summary = SaveSummary::default();
        for device in devices {
            summary.count(storage.record(device, now));
        }
        self.save(&mut storage)?;

        tracing::info!(
            added = summary.added,
            updated = summary.updated,
            unchanged = summary.unchanged,
            changes = summary.changes,
            "Recorded discovered devices"
        );
        Ok(summary)
    }

    /// Returns every history sorted by name, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the history cannot be loaded.
    pub fn list_all(&self) -> Result<Vec<DeviceHistory>, StoreError> {
        let storage = self.load()?;
        Ok(storage.histories().into_iter().cloned().collect())
    }

    /// Returns the history of one unit.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for an unknown MAC, or `Error::Store`
    /// if the history cannot be loaded.
    pub fn find_by_mac(&self, mac: &str) -> Result<DeviceHistory, Error> {
        let mut storage = self.load()?;
        storage
            .devices
            .remove(mac)
            .ok_or_else(|| Error::DeviceNotFound(mac.to_string()))
    }

    /// Returns histories with at least one change within the last `window`,
    /// sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the history cannot be loaded.
    pub fn find_changed_since(&self, window: Duration) -> Result<Vec<DeviceHistory>, StoreError> {
        let storage = self.load()?;
        let now = Utc::now();
        let since = TimeDelta::from_std(window)
            .ok()
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(storage
            .changed_between(since, now)
            .into_iter()
            .cloned()
            .collect())
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let tmp = self
            .path
            .with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_error(&self.path)(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("state").join("devices.json"));
        (dir, store)
    }

    #[test]
    fn load_missing_file_is_empty() {
        let (_dir, store) = store();
        let storage = store.load().unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn load_corrupt_file_fails() {
        let (dir, _) = store();
        let path = dir.path().join("devices.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = SnapshotStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn save_creates_parent_and_leaves_no_temp_file() {
        let (_dir, store) = store();
        let mut storage = DeviceStorage::new();
        store.save(&mut storage).unwrap();

        assert!(store.path().exists());
        let parent = store.path().parent().unwrap();
        let entries: Vec<_> = fs::read_dir(parent).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_load_round_trip() {
        let (_dir, store) = store();
        let mut unit = DiscoveredDevice::new("10.0.0.5", "AA", "Unit1");
        unit.control_info.insert("mode".to_string(), "4".to_string());
        store.save_devices(&[unit.clone()]).unwrap();
        unit.control_info.insert("mode".to_string(), "1".to_string());
        store.save_devices(&[unit]).unwrap();

        let mut loaded = store.load().unwrap();
        let before = loaded.clone();
        store.save(&mut loaded).unwrap();
        let reloaded = store.load().unwrap();

        assert_eq!(reloaded.devices, before.devices);
        assert!(reloaded.last_updated >= before.last_updated);
    }

    #[test]
    fn idempotent_resave() {
        let (_dir, store) = store();
        let unit = DiscoveredDevice::new("10.0.0.5", "AA", "Unit1");
        store.save_devices(&[unit.clone()]).unwrap();
        let summary = store.save_devices(&[unit]).unwrap();

        assert_eq!(summary.unchanged, 1);
        let history = store.find_by_mac("AA").unwrap();
        assert!(history.snapshots.is_empty());
        assert!(history.changes.is_empty());
    }

    #[test]
    fn find_by_mac_not_found() {
        let (_dir, store) = store();
        let err = store.find_by_mac("FF").unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(mac) if mac == "FF"));
    }

    #[test]
    fn find_changed_since_excludes_old_changes() {
        let (_dir, store) = store();
        let long_ago = Utc::now() - TimeDelta::days(2);
        store
            .save_devices_at(
                &[
                    DiscoveredDevice::new("10.0.0.1", "01", "Stale"),
                    DiscoveredDevice::new("10.0.0.2", "02", "Fresh"),
                ],
                long_ago - TimeDelta::hours(1),
            )
            .unwrap();
        store
            .save_devices_at(&[DiscoveredDevice::new("10.0.0.11", "01", "Stale")], long_ago)
            .unwrap();
        store
            .save_devices(&[DiscoveredDevice::new("10.0.0.12", "02", "Fresh")])
            .unwrap();

        let recent = store.find_changed_since(Duration::from_secs(3600)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name(), "Fresh");

        let all = store
            .find_changed_since(Duration::from_secs(7 * 24 * 3600))
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let (_dir, store) = store();
        store
            .save_devices(&[DiscoveredDevice::new("10.0.0.1", "01", "Unit")])
            .unwrap();
        assert!(store.find_changed_since(Duration::MAX).unwrap().is_empty());
    }
}
