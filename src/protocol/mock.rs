// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory [`ControlClient`] for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::params::{ControlInfo, SetControlCommand};
use crate::protocol::ControlClient;

/// One simulated unit.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockUnit {
    pub basic_info: ControlInfo,
    pub control_info: ControlInfo,
    pub latency: Duration,
    pub fail: bool,
    pub crash: bool,
}

impl MockUnit {
    pub fn named(name: &str) -> Self {
        let mut unit = Self::default();
        unit.basic_info.insert("name".to_string(), name.to_string());
        unit
    }

    pub fn with_control(mut self, pairs: &[(&str, &str)]) -> Self {
        for (key, value) in pairs {
            self.control_info.insert((*key).to_string(), (*value).to_string());
        }
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Makes every request to this unit panic the calling task.
    pub fn crashing(mut self) -> Self {
        self.crash = true;
        self
    }
}

/// Simulated fleet keyed by address. Unknown addresses fail to connect.
#[derive(Debug, Default)]
pub(crate) struct MockClient {
    units: Mutex<HashMap<String, MockUnit>>,
    sent: Mutex<Vec<(String, SetControlCommand)>>,
    fetches: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn with_unit(self, ip: &str, unit: MockUnit) -> Self {
        self.units.lock().insert(ip.to_string(), unit);
        self
    }

    pub fn set_failing(&self, ip: &str, fail: bool) {
        if let Some(unit) = self.units.lock().get_mut(ip) {
            unit.fail = fail;
        }
    }

    /// Set-control requests that reached a healthy unit, in arrival order.
    pub fn sent(&self) -> Vec<(String, SetControlCommand)> {
        self.sent.lock().clone()
    }

    /// Addresses of every control info fetch, in arrival order.
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    async fn reach(&self, ip: &str) -> Result<MockUnit, ProtocolError> {
        let unit = self.units.lock().get(ip).cloned();
        let unit = unit.ok_or_else(|| ProtocolError::ConnectionFailed(format!("no route to {ip}")))?;
        if !unit.latency.is_zero() {
            tokio::time::sleep(unit.latency).await;
        }
        assert!(!unit.crash, "unit {ip} crashed");
        if unit.fail {
            return Err(ProtocolError::Status {
                status: 500,
                body: "ret=PARAM NG".to_string(),
            });
        }
        Ok(unit)
    }
}

impl ControlClient for MockClient {
    async fn fetch_basic_info(&self, ip: &str) -> Result<ControlInfo, ProtocolError> {
        self.reach(ip).await.map(|unit| unit.basic_info)
    }

    async fn fetch_control_info(&self, ip: &str) -> Result<ControlInfo, ProtocolError> {
        self.fetches.lock().push(ip.to_string());
        self.reach(ip).await.map(|unit| unit.control_info)
    }

    async fn set_control(&self, ip: &str, command: &SetControlCommand) -> Result<(), ProtocolError> {
        self.reach(ip).await?;
        if let Some(unit) = self.units.lock().get_mut(ip) {
            for (key, value) in command.pairs() {
                unit.control_info.insert(key.to_string(), value.to_string());
            }
        }
        self.sent.lock().push((ip.to_string(), command.clone()));
        Ok(())
    }
}
