// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory operations on [`DeviceStorage`].

use std::mem;

use chrono::{DateTime, Utc};

use crate::discovery::DiscoveredDevice;

use super::diff::diff;
use super::model::{DeviceHistory, DeviceSnapshot, DeviceStorage};

/// What recording one observation did to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First sight of this MAC.
    Added,
    /// Known MAC with differences; carries the number of recorded changes.
    Updated(usize),
    /// Known MAC without differences; only `last_seen_at` moved.
    Unchanged,
    /// Observation without a MAC address; ignored.
    Skipped,
}

/// Totals of one `save_devices` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Units seen for the first time.
    pub added: usize,
    /// Known units with at least one change.
    pub updated: usize,
    /// Known units without changes.
    pub unchanged: usize,
    /// Observations ignored for lack of a MAC.
    pub skipped: usize,
    /// Changes recorded across all units.
    pub changes: usize,
}

impl SaveSummary {
    pub(crate) fn count(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Added => self.added += 1,
            RecordOutcome::Updated(n) => {
                self.updated += 1;
                self.changes += n;
            }
            RecordOutcome::Unchanged => self.unchanged += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

impl DeviceStorage {
    /// Merges one observation into the aggregate.
    ///
    /// A known MAC has its latest snapshot moved into `snapshots`, replaced
    /// by the observation, and the detected changes appended. An observation
    /// identical to the latest snapshot only refreshes `last_seen_at`.
    pub fn record(&mut self, device: &DiscoveredDevice, now: DateTime<Utc>) -> RecordOutcome {
        let mac = device.mac.trim();
        if mac.is_empty() {
            tracing::warn!(ip = %device.ip, "Ignoring observation without MAC address");
            return RecordOutcome::Skipped;
        }

        let mut snapshot = DeviceSnapshot::observe(device, now);
        snapshot.mac = mac.to_string();

        let Some(history) = self.devices.get_mut(mac) else {
            tracing::debug!(mac = %mac, name = %snapshot.name, "New device");
            self.devices
                .insert(mac.to_string(), DeviceHistory::new(snapshot));
            return RecordOutcome::Added;
        };

        snapshot.discovered_at = history.device.discovered_at;
        let changes = diff(&history.device, &snapshot, now);
        if changes.is_empty() {
            history.device.last_seen_at = now;
            return RecordOutcome::Unchanged;
        }

        let count = changes.len();
        tracing::debug!(mac = %mac, changes = count, "Device changed");
        let previous = mem::replace(&mut history.device, snapshot);
        history.snapshots.push(previous);
        history.changes.extend(changes);
        RecordOutcome::Updated(count)
    }

    /// Returns every history sorted by name, case-insensitive.
    #[must_use]
    pub fn histories(&self) -> Vec<&DeviceHistory> {
        let mut histories: Vec<&DeviceHistory> = self.devices.values().collect();
        sort_by_name(&mut histories);
        histories
    }

    /// Looks up one history by MAC.
    #[must_use]
    pub fn history(&self, mac: &str) -> Option<&DeviceHistory> {
        self.devices.get(mac)
    }

    /// Returns histories with at least one change in `[since, until]`,
    /// sorted by name.
    #[must_use]
    pub fn changed_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<&DeviceHistory> {
        let mut histories: Vec<&DeviceHistory> = self
            .devices
            .values()
            .filter(|h| {
                h.changes
                    .iter()
                    .any(|c| c.changed_at >= since && c.changed_at <= until)
            })
            .collect();
        sort_by_name(&mut histories);
        histories
    }
}

/// Sorts histories by device name, case-insensitive. Ties keep input order.
pub fn sort_by_name<H: AsRef<DeviceHistory>>(histories: &mut [H]) {
    histories.sort_by_cached_key(|h| h.as_ref().device.name.to_lowercase());
}

impl AsRef<DeviceHistory> for DeviceHistory {
    fn as_ref(&self) -> &DeviceHistory {
        self
    }
}
