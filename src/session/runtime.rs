// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event loop driving a [`ControlSession`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::batch::BatchApply;
use crate::config::{BatchConfig, SessionConfig};
use crate::error::ProtocolError;
use crate::protocol::ControlClient;

use super::control::{ControlSession, Effect, SessionEvent};
use super::key::Key;

/// Capacity of the internal result channel.
const EVENT_BUFFER: usize = 32;

/// Runs a control session on tokio.
///
/// Keys arrive on a channel supplied by the application. Fetches and batch
/// applies run as spawned tasks, each sending exactly one result event back
/// to the loop. Tasks still running when the session ends are aborted.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use climctl::config::Config;
/// use climctl::protocol::HttpControlClient;
/// use climctl::session::{ControlSession, Key, SessionRuntime};
/// use climctl::store::SnapshotStore;
///
/// # async fn example() -> climctl::Result<()> {
/// let config = Config::default();
/// let histories = SnapshotStore::from_config(&config)?.list_all()?;
/// let client = Arc::new(HttpControlClient::new(config.http.clone())?);
///
/// let (key_tx, key_rx) = tokio::sync::mpsc::channel(16);
/// // a terminal front end forwards key presses into key_tx
/// # drop(key_tx);
///
/// let runtime = SessionRuntime::new(client, config.session.clone(), config.batch.clone());
/// let session = ControlSession::new(histories, config.defaults);
/// let session = runtime.run(session, key_rx).await;
/// println!("quit with {} staged", session.staged());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionRuntime<C> {
    client: Arc<C>,
    config: SessionConfig,
    batch: BatchApply<C>,
}

impl<C: ControlClient> SessionRuntime<C> {
    /// Creates a runtime sharing the given client.
    #[must_use]
    pub fn new(client: Arc<C>, config: SessionConfig, batch: BatchConfig) -> Self {
        let batch = BatchApply::new(Arc::clone(&client), batch);
        Self {
            client,
            config,
            batch,
        }
    }

    /// Runs the session until a quit key or the end of the key stream.
    ///
    /// Returns the final session state.
    pub async fn run(&self, session: ControlSession, keys: mpsc::Receiver<Key>) -> ControlSession {
        self.run_with(session, keys, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_update` after every event so a
    /// front end can redraw.
    pub async fn run_with<F>(
        &self,
        mut session: ControlSession,
        mut keys: mpsc::Receiver<Key>,
        mut on_update: F,
    ) -> ControlSession
    where
        F: FnMut(&ControlSession),
    {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let mut tasks = JoinSet::new();
        // fetch tasks by id, so a task that dies without reporting still
        // releases its device
        let mut fetches: HashMap<task::Id, usize> = HashMap::new();

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; the start fetch covers it
        ticker.tick().await;

        if let Some(effect) = session.start() {
            self.dispatch(effect, &tx, &mut tasks, &mut fetches);
        }
        on_update(&session);

        loop {
            let event = tokio::select! {
                key = keys.recv() => match key {
                    Some(key) => SessionEvent::Key(key),
                    None => {
                        tracing::debug!("Key stream closed");
                        break;
                    }
                },
                Some(event) = rx.recv() => event,
                _ = ticker.tick() => SessionEvent::Tick,
                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    match joined {
                        Ok((id, ())) => {
                            fetches.remove(&id);
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Session task failed");
                            match fetches.remove(&e.id()) {
                                Some(index) => SessionEvent::Fetched {
                                    index,
                                    result: Err(ProtocolError::ConnectionFailed(format!(
                                        "fetch task failed: {e}"
                                    ))),
                                },
                                None => continue,
                            }
                        }
                    }
                }
            };

            let effect = session.update(event);
            on_update(&session);
            match effect {
                Some(Effect::Quit) => break,
                Some(effect) => self.dispatch(effect, &tx, &mut tasks, &mut fetches),
                None => {}
            }
        }

        tasks.abort_all();
        session
    }

    fn dispatch(
        &self,
        effect: Effect,
        tx: &mpsc::Sender<SessionEvent>,
        tasks: &mut JoinSet<()>,
        fetches: &mut HashMap<task::Id, usize>,
    ) {
        match effect {
            Effect::Fetch { index, ip } => {
                let client = Arc::clone(&self.client);
                let timeout = self.config.fetch_timeout;
                let tx = tx.clone();
                let handle = tasks.spawn(async move {
                    let result = tokio::time::timeout(timeout, client.fetch_control_info(&ip))
                        .await
                        .unwrap_or_else(|_| {
                            Err(ProtocolError::Timeout(
                                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                            ))
                        });
                    let _ = tx.send(SessionEvent::Fetched { index, result }).await;
                });
                fetches.insert(handle.id(), index);
            }
            Effect::Apply { targets } => {
                let batch = self.batch.clone();
                let tx = tx.clone();
                tasks.spawn(async move {
                    let report = batch.apply(targets).await;
                    let _ = tx.send(SessionEvent::Applied(report)).await;
                });
            }
            Effect::Quit => {}
        }
    }
}
