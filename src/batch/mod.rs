// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrent application of control parameters to many units.
//!
//! Every unit is handled by its own task; a slow or failing unit never
//! delays the others. The coordinator returns once every unit has an
//! outcome, and a partial failure is a normal result, not an error.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use climctl::batch::{ApplyTarget, BatchApply};
//! use climctl::config::{BatchConfig, HttpConfig};
//! use climctl::params::ControlParams;
//! use climctl::protocol::HttpControlClient;
//! use climctl::types::Power;
//!
//! # async fn example() -> climctl::Result<()> {
//! let client = Arc::new(HttpControlClient::new(HttpConfig::default())?);
//! let batch = BatchApply::new(client, BatchConfig::default());
//!
//! let params = ControlParams::new().with_power(Power::Off);
//! let report = batch
//!     .apply(vec![
//!         ApplyTarget::new("Office", "10:98:c3:00:00:01", "192.168.1.40", params),
//!         ApplyTarget::new("Bedroom", "10:98:c3:00:00:02", "192.168.1.41", params),
//!     ])
//!     .await;
//!
//! println!("{} applied, {} failed", report.succeeded().count(), report.failed().count());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::BatchConfig;
use crate::error::ProtocolError;
use crate::params::{ControlInfo, ControlParams, SetControlCommand};
use crate::protocol::ControlClient;
use crate::store::DeviceHistory;

/// One unit to apply parameters to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTarget {
    /// Display name.
    pub name: String,
    /// Hardware address, identifies the unit in the report.
    pub mac: String,
    /// Address the request is sent to.
    pub ip: String,
    /// Parameters to apply. Unset fields keep the unit's live value.
    pub params: ControlParams,
}

impl ApplyTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mac: impl Into<String>,
        ip: impl Into<String>,
        params: ControlParams,
    ) -> Self {
        Self {
            name: name.into(),
            mac: mac.into(),
            ip: ip.into(),
            params,
        }
    }

    /// Creates a target from the latest snapshot of a unit.
    #[must_use]
    pub fn from_history(history: &DeviceHistory, params: ControlParams) -> Self {
        Self::new(
            history.device.name.clone(),
            history.mac.clone(),
            history.device.ip.clone(),
            params,
        )
    }
}

/// Result for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    /// The unit accepted the request.
    Applied,
    /// The unit could not be reached or rejected the request.
    Failed(String),
}

/// Outcome of applying parameters to one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Display name.
    pub name: String,
    /// Hardware address.
    pub mac: String,
    /// Address the request was sent to.
    pub ip: String,
    /// Result.
    pub status: ApplyStatus,
    /// Values the unit reported before the request, empty if not fetched.
    pub previous: ControlInfo,
    /// Request sent to the unit, if one was built.
    pub command: Option<SetControlCommand>,
}

impl ApplyOutcome {
    fn new(target: &ApplyTarget, status: ApplyStatus) -> Self {
        Self {
            name: target.name.clone(),
            mac: target.mac.clone(),
            ip: target.ip.clone(),
            status,
            previous: ControlInfo::new(),
            command: None,
        }
    }

    /// Returns true if the unit accepted the request.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.status == ApplyStatus::Applied
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ApplyStatus::Applied => None,
            ApplyStatus::Failed(message) => Some(message),
        }
    }

    /// Returns the protocol keys whose sent value differs from the value
    /// reported before the request, as `(key, before, after)`.
    ///
    /// Empty when the unit failed before its values were fetched.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<(&'static str, &str, &str)> {
        let Some(command) = &self.command else {
            return Vec::new();
        };
        if self.previous.is_empty() {
            return Vec::new();
        }
        command
            .pairs()
            .into_iter()
            .filter_map(|(key, after)| {
                let before = self.previous.get(key).map_or("", String::as_str);
                (before != after).then_some((key, before, after))
            })
            .collect()
    }
}

/// Outcomes of one batch, one per target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Outcomes in completion order.
    pub outcomes: Vec<ApplyOutcome>,
}

impl BatchReport {
    /// Returns the number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the batch had no target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterates over the applied outcomes.
    pub fn succeeded(&self) -> impl Iterator<Item = &ApplyOutcome> {
        self.outcomes.iter().filter(|o| o.is_applied())
    }

    /// Iterates over the failed outcomes.
    pub fn failed(&self) -> impl Iterator<Item = &ApplyOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    /// Returns true if every unit accepted the request.
    #[must_use]
    pub fn all_applied(&self) -> bool {
        self.outcomes.iter().all(ApplyOutcome::is_applied)
    }

    /// Returns the outcomes sorted by name, case-insensitive.
    #[must_use]
    pub fn sorted_by_device(&self) -> Vec<&ApplyOutcome> {
        let mut outcomes: Vec<&ApplyOutcome> = self.outcomes.iter().collect();
        outcomes.sort_by_cached_key(|o| (o.name.to_lowercase(), o.ip.clone()));
        outcomes
    }
}

/// Batch apply coordinator.
#[derive(Debug)]
pub struct BatchApply<C> {
    client: Arc<C>,
    config: BatchConfig,
}

impl<C> Clone for BatchApply<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

impl<C: ControlClient> BatchApply<C> {
    /// Creates a coordinator sharing the given client.
    #[must_use]
    pub fn new(client: Arc<C>, config: BatchConfig) -> Self {
        Self { client, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Applies each target's parameters to its unit.
    ///
    /// Units are contacted concurrently, at most `concurrency` at a time.
    /// Each unit is bounded by the per-device timeout. The returned report
    /// holds exactly one outcome per target.
    pub async fn apply(&self, targets: Vec<ApplyTarget>) -> BatchReport {
        if targets.is_empty() {
            return BatchReport::default();
        }

        tracing::info!(
            count = targets.len(),
            concurrency = self.config.concurrency,
            "Applying settings"
        );

        let outcomes = Arc::new(Mutex::new(Vec::with_capacity(targets.len())));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let timeout = self.config.device_timeout;
        let mut tasks = JoinSet::new();

        for (index, target) in targets.iter().cloned().enumerate() {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let outcomes = Arc::clone(&outcomes);
            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => apply_one(client.as_ref(), &target, timeout).await,
                    Err(e) => ApplyOutcome::new(&target, ApplyStatus::Failed(e.to_string())),
                };
                outcomes.lock().push((index, outcome));
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Apply task failed");
            }
        }

        let mut collected = std::mem::take(&mut *outcomes.lock());
        let reported: HashSet<usize> = collected.iter().map(|(index, _)| *index).collect();
        for (index, target) in targets.iter().enumerate() {
            if !reported.contains(&index) {
                collected.push((
                    index,
                    ApplyOutcome::new(target, ApplyStatus::Failed("apply task aborted".to_string())),
                ));
            }
        }

        let report = BatchReport {
            outcomes: collected.into_iter().map(|(_, outcome)| outcome).collect(),
        };
        tracing::info!(
            applied = report.succeeded().count(),
            failed = report.failed().count(),
            "Batch complete"
        );
        report
    }
}

async fn apply_one<C: ControlClient>(
    client: &C,
    target: &ApplyTarget,
    timeout: Duration,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::new(target, ApplyStatus::Applied);

    let result = tokio::time::timeout(timeout, async {
        // humidity is never edited here, so the live value is always needed
        outcome.previous = client.fetch_control_info(&target.ip).await?;
        let command = SetControlCommand::resolve(&target.params, &outcome.previous);
        outcome.command = Some(command.clone());
        client.set_control(&target.ip, &command).await
    })
    .await
    .unwrap_or_else(|_| {
        Err(ProtocolError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        ))
    });

    match result {
        Ok(()) => {
            tracing::debug!(ip = %target.ip, name = %target.name, "Settings applied");
        }
        Err(e) => {
            tracing::warn!(ip = %target.ip, name = %target.name, error = %e, "Failed to apply settings");
            outcome.status = ApplyStatus::Failed(e.to_string());
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ControlSettings;
    use crate::protocol::mock::{MockClient, MockUnit};
    use crate::types::{Mode, Power};

    fn live() -> [(&'static str, &'static str); 6] {
        [
            ("pow", "1"),
            ("mode", "4"),
            ("stemp", "24.0"),
            ("shum", "45"),
            ("f_rate", "A"),
            ("f_dir", "0"),
        ]
    }

    fn target(name: &str, ip: &str, params: ControlParams) -> ApplyTarget {
        ApplyTarget::new(name, format!("mac-{name}"), ip, params)
    }

    #[tokio::test(start_paused = true)]
    async fn failing_unit_does_not_delay_the_others() {
        let latency = Duration::from_millis(300);
        let client = Arc::new(
            MockClient::default()
                .with_unit("10.0.0.1", MockUnit::default().with_latency(latency))
                .with_unit("10.0.0.2", MockUnit::default().with_latency(latency).failing())
                .with_unit("10.0.0.3", MockUnit::default().with_latency(latency)),
        );
        let batch = BatchApply::new(Arc::clone(&client), BatchConfig::default());
        let params = ControlParams::from(ControlSettings::default());

        let start = tokio::time::Instant::now();
        let report = batch
            .apply(vec![
                target("One", "10.0.0.1", params),
                target("Two", "10.0.0.2", params),
                target("Three", "10.0.0.3", params),
            ])
            .await;

        // fetch plus set on each healthy unit, all units in parallel
        assert!(start.elapsed() < Duration::from_millis(900));
        assert_eq!(report.len(), 3);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.failed().next().unwrap().name, "Two");
        assert_eq!(client.sent().len(), 2);
    }

    #[tokio::test]
    async fn incomplete_params_fall_back_to_live_values() {
        let client = Arc::new(
            MockClient::default().with_unit("10.0.0.1", MockUnit::default().with_control(&live())),
        );
        let batch = BatchApply::new(Arc::clone(&client), BatchConfig::default());
        let report = batch
            .apply(vec![target(
                "One",
                "10.0.0.1",
                ControlParams::new().with_mode(Mode::Heat),
            )])
            .await;

        assert!(report.all_applied());
        let (ip, command) = &client.sent()[0];
        assert_eq!(ip, "10.0.0.1");
        assert_eq!(command.mode, "1");
        assert_eq!(command.temperature, "24.0");
        assert_eq!(command.humidity, "45");
        assert_eq!(report.outcomes[0].changed_fields(), [("mode", "4", "1")]);
    }

    #[tokio::test]
    async fn complete_params_keep_live_humidity() {
        let client = Arc::new(
            MockClient::default().with_unit("10.0.0.1", MockUnit::default().with_control(&live())),
        );
        let batch = BatchApply::new(Arc::clone(&client), BatchConfig::default());
        let report = batch
            .apply(vec![target(
                "One",
                "10.0.0.1",
                ControlParams::from(ControlSettings::default()).with_power(Power::Off),
            )])
            .await;

        assert!(report.all_applied());
        assert_eq!(client.fetches(), ["10.0.0.1"]);
        let command = &client.sent()[0].1;
        assert_eq!(command.power, "0");
        assert_eq!(command.humidity, "45");
        assert_eq!(
            report.outcomes[0].changed_fields(),
            [("pow", "1", "0"), ("stemp", "24.0", "19.0")]
        );
    }

    #[tokio::test]
    async fn failed_fetch_fails_complete_params_too() {
        let client = Arc::new(MockClient::default().with_unit("10.0.0.1", MockUnit::default().failing()));
        let batch = BatchApply::new(Arc::clone(&client), BatchConfig::default());
        let report = batch
            .apply(vec![target("One", "10.0.0.1", ControlParams::from(ControlSettings::default()))])
            .await;

        assert_eq!(report.failed().count(), 1);
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_fetch_fails_the_unit() {
        let client = Arc::new(MockClient::default().with_unit("10.0.0.1", MockUnit::default().failing()));
        let batch = BatchApply::new(Arc::clone(&client), BatchConfig::default());
        let report = batch
            .apply(vec![target("One", "10.0.0.1", ControlParams::new().with_power(Power::On))])
            .await;

        assert_eq!(report.failed().count(), 1);
        assert!(report.outcomes[0].error().unwrap().contains("500"));
        assert!(client.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_unit_times_out() {
        let client = Arc::new(
            MockClient::default()
                .with_unit("10.0.0.1", MockUnit::default().with_latency(Duration::from_secs(60))),
        );
        let config = BatchConfig::default().with_device_timeout(Duration::from_secs(2));
        let report = BatchApply::new(client, config)
            .apply(vec![target("One", "10.0.0.1", ControlParams::from(ControlSettings::default()))])
            .await;

        assert_eq!(report.failed().count(), 1);
        assert!(report.outcomes[0].error().unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_limit_is_honored() {
        let latency = Duration::from_millis(100);
        let mut client = MockClient::default();
        let mut targets = Vec::new();
        for i in 0..4 {
            let ip = format!("10.0.0.{i}");
            client = client.with_unit(&ip, MockUnit::default().with_latency(latency));
            targets.push(target(&format!("U{i}"), &ip, ControlParams::from(ControlSettings::default())));
        }
        let config = BatchConfig::default().with_concurrency(2);
        let start = tokio::time::Instant::now();
        let report = BatchApply::new(Arc::new(client), config).apply(targets).await;

        assert!(report.all_applied());
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn empty_batch() {
        let batch = BatchApply::new(Arc::new(MockClient::default()), BatchConfig::default());
        assert!(batch.apply(Vec::new()).await.is_empty());
    }

    #[test]
    fn report_sorted_by_device() {
        let params = ControlParams::new();
        let report = BatchReport {
            outcomes: vec![
                ApplyOutcome::new(&target("beta", "10.0.0.2", params), ApplyStatus::Applied),
                ApplyOutcome::new(&target("Alpha", "10.0.0.1", params), ApplyStatus::Failed("x".into())),
            ],
        };
        let names: Vec<&str> = report.sorted_by_device().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta"]);
        assert!(!report.all_applied());
    }
}
