// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group-based parameter resolution.
//!
//! Units carry a group label (`grp_name` in their basic info). A batch
//! script assigns default parameters per group and lets individual units
//! override some of them:
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "group_name": "Floor1",
//!       "params": { "power": "1", "temp": "22.0" },
//!       "overrides": [
//!         { "name": "LivingRoom", "params": { "temp": "25.0" } },
//!         { "ip": "192.168.1.44", "params": { "power": "0" } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Resolution turns a script and the stored histories into one
//! [`ApplyTarget`] per unit. Fields left unset after resolution are filled
//! from the unit's live values at apply time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::ApplyTarget;
use crate::error::ScriptError;
use crate::params::ControlParams;
use crate::store::DeviceHistory;

/// Root of a batch script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchScript {
    /// Groups to apply, in order.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl BatchScript {
    /// Parses a script from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` for invalid JSON or invalid values and
    /// `ScriptError::NoGroups` for a script without groups.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_json::from_str(json)?;
        if script.groups.is_empty() {
            return Err(ScriptError::NoGroups);
        }
        Ok(script)
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Read` if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Resolves every group against the histories.
    ///
    /// A unit belonging to several groups of the script appears once per
    /// group.
    #[must_use]
    pub fn resolve(&self, histories: &[DeviceHistory]) -> Vec<ApplyTarget> {
        self.groups
            .iter()
            .flat_map(|group| group.resolve(histories))
            .collect()
    }
}

/// Default parameters for one group, with per-unit overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group label to match against `grp_name`.
    pub group_name: String,
    /// Parameters for every member.
    #[serde(default)]
    pub params: ControlParams,
    /// Per-unit overrides. The first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<DeviceOverride>,
}

impl GroupConfig {
    /// Creates a group without overrides.
    #[must_use]
    pub fn new(group_name: impl Into<String>, params: ControlParams) -> Self {
        Self {
            group_name: group_name.into(),
            params,
            overrides: Vec::new(),
        }
    }

    /// Builds a single group from command line style values.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::NoParameters` if `params` sets nothing.
    pub fn from_flags(
        group_name: impl Into<String>,
        params: ControlParams,
    ) -> Result<Self, ScriptError> {
        if params.is_empty() {
            return Err(ScriptError::NoParameters);
        }
        Ok(Self::new(group_name, params))
    }

    /// Adds an override.
    #[must_use]
    pub fn with_override(mut self, device_override: DeviceOverride) -> Self {
        self.overrides.push(device_override);
        self
    }

    /// Returns true if the unit carries this group's label.
    #[must_use]
    pub fn contains(&self, history: &DeviceHistory) -> bool {
        history.device.group_name() == Some(self.group_name.as_str())
    }

    /// Returns the first override matching the unit.
    #[must_use]
    pub fn override_for(&self, history: &DeviceHistory) -> Option<&DeviceOverride> {
        self.overrides.iter().find(|o| o.matches(history))
    }

    /// Returns the parameters for one unit: group defaults overlaid with the
    /// matching override, if any.
    #[must_use]
    pub fn params_for(&self, history: &DeviceHistory) -> ControlParams {
        match self.override_for(history) {
            Some(device_override) => self.params.overlay(&device_override.params),
            None => self.params,
        }
    }

    /// Resolves the group's members into apply targets.
    #[must_use]
    pub fn resolve(&self, histories: &[DeviceHistory]) -> Vec<ApplyTarget> {
        let targets: Vec<ApplyTarget> = histories
            .iter()
            .filter(|h| self.contains(h))
            .map(|h| ApplyTarget::from_history(h, self.params_for(h)))
            .collect();

        if targets.is_empty() {
            tracing::warn!(group = %self.group_name, "No device found in group");
        } else {
            tracing::debug!(group = %self.group_name, count = targets.len(), "Resolved group");
        }
        targets
    }
}

/// Parameters for one unit, matched by name or address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOverride {
    /// Unit name to match. Empty never matches.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Unit address to match. Empty never matches.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    /// Fields replacing the group defaults.
    #[serde(default)]
    pub params: ControlParams,
}

impl DeviceOverride {
    /// Creates an override matching a unit name.
    #[must_use]
    pub fn by_name(name: impl Into<String>, params: ControlParams) -> Self {
        Self {
            name: name.into(),
            params,
            ..Self::default()
        }
    }

    /// Creates an override matching a unit address.
    #[must_use]
    pub fn by_ip(ip: impl Into<String>, params: ControlParams) -> Self {
        Self {
            ip: ip.into(),
            params,
            ..Self::default()
        }
    }

    /// Returns true if the name or the address matches.
    #[must_use]
    pub fn matches(&self, history: &DeviceHistory) -> bool {
        (!self.name.is_empty() && self.name == history.device.name)
            || (!self.ip.is_empty() && self.ip == history.device.ip)
    }
}
