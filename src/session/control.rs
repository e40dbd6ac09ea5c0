// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control session state machine.

use crate::batch::{ApplyTarget, BatchReport};
use crate::error::ProtocolError;
use crate::params::{ControlInfo, ControlParams, ControlSettings};
use crate::store::{DeviceHistory, sort_by_name};

use super::key::{Focus, Key, Overlay};

/// Input to [`ControlSession::update`].
#[derive(Debug)]
pub enum SessionEvent {
    /// A key press.
    Key(Key),
    /// The refresh timer fired.
    Tick,
    /// A live value fetch finished for the device at `index`.
    Fetched {
        /// Index of the device in the session's list.
        index: usize,
        /// Fetched values or the failure.
        result: Result<ControlInfo, ProtocolError>,
    },
    /// A batch apply finished.
    Applied(BatchReport),
}

/// Work requested by the state machine, performed off-loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch live values of the device at `index`.
    Fetch {
        /// Index of the device in the session's list.
        index: usize,
        /// Its address.
        ip: String,
    },
    /// Apply the staged settings to every device.
    Apply {
        /// One target per device, each carrying the complete staged
        /// settings.
        targets: Vec<ApplyTarget>,
    },
    /// End the session.
    Quit,
}

/// Interactive control of a fixed list of units.
///
/// The session inspects one unit at a time and stages one set of settings
/// that is applied to every unit at once. All state changes go through
/// [`update`](Self::update), which returns the work the caller must run.
#[derive(Debug, Clone)]
pub struct ControlSession {
    devices: Vec<DeviceHistory>,
    cursor: usize,
    focus: Focus,
    overlay: Overlay,
    current: ControlInfo,
    staged: ControlSettings,
    edited: bool,
    last_error: Option<String>,
    results: Option<BatchReport>,
    applying: bool,
    pending_fetch: Option<usize>,
    quitting: bool,
}

impl ControlSession {
    /// Creates a session over the given units, sorted by name.
    ///
    /// `defaults` seeds the staged settings until live values arrive.
    #[must_use]
    pub fn new(mut devices: Vec<DeviceHistory>, defaults: ControlSettings) -> Self {
        sort_by_name(&mut devices);
        Self {
            devices,
            cursor: 0,
            focus: Focus::default(),
            overlay: Overlay::None,
            current: ControlInfo::new(),
            staged: defaults,
            edited: false,
            last_error: None,
            results: None,
            applying: false,
            pending_fetch: None,
            quitting: false,
        }
    }

    /// Returns the first fetch to run, if there is any device.
    pub fn start(&mut self) -> Option<Effect> {
        self.fetch_selected()
    }

    /// Applies one event and returns the work it requests.
    pub fn update(&mut self, event: SessionEvent) -> Option<Effect> {
        if self.quitting {
            return None;
        }
        match event {
            SessionEvent::Key(key) => self.on_key(key),
            SessionEvent::Tick => {
                if self.pending_fetch == Some(self.cursor) {
                    return None;
                }
                self.fetch_selected()
            }
            SessionEvent::Fetched { index, result } => {
                self.on_fetched(index, result);
                None
            }
            SessionEvent::Applied(report) => {
                self.applying = false;
                self.results = Some(report);
                self.overlay = Overlay::Results;
                None
            }
        }
    }

    fn on_key(&mut self, key: Key) -> Option<Effect> {
        if key.is_quit() {
            self.quitting = true;
            return Some(Effect::Quit);
        }

        match self.overlay {
            Overlay::Help => {
                if matches!(key, Key::Esc | Key::Char('h')) {
                    self.overlay = Overlay::None;
                }
                None
            }
            Overlay::Confirm => match key {
                Key::Char('y') => {
                    self.overlay = Overlay::None;
                    self.start_apply()
                }
                Key::Char('n') | Key::Esc => {
                    self.overlay = Overlay::None;
                    None
                }
                _ => None,
            },
            Overlay::Results => {
                if matches!(key, Key::Esc | Key::Enter) {
                    self.overlay = Overlay::None;
                }
                None
            }
            Overlay::None => self.on_control_key(key),
        }
    }

    fn on_control_key(&mut self, key: Key) -> Option<Effect> {
        match key {
            Key::Char('h') => self.overlay = Overlay::Help,
            Key::Tab => self.focus = self.focus.next(),
            Key::BackTab => self.focus = self.focus.previous(),
            Key::Char('r') => return self.fetch_selected(),
            Key::Char('+') => self.step_temperature(1),
            Key::Char('-') => self.step_temperature(-1),
            Key::Up | Key::Char('k') => match self.focus {
                Focus::DeviceList if self.cursor > 0 => return self.select(self.cursor - 1),
                Focus::Temperature => self.step_temperature(1),
                _ => {}
            },
            Key::Down | Key::Char('j') => match self.focus {
                Focus::DeviceList if self.cursor + 1 < self.devices.len() => {
                    return self.select(self.cursor + 1);
                }
                Focus::Temperature => self.step_temperature(-1),
                _ => {}
            },
            Key::Left => self.cycle_focused(false),
            Key::Right => self.cycle_focused(true),
            Key::Char('p') => self.edit(|s| s.power = s.power.toggled()),
            Key::Char('m') => self.edit(|s| s.mode = s.mode.next()),
            Key::Char('f') => self.edit(|s| s.fan_rate = s.fan_rate.next()),
            Key::Char('d') => self.edit(|s| s.fan_direction = s.fan_direction.next()),
            Key::Char('a') => {
                if !self.devices.is_empty() && !self.applying {
                    self.overlay = Overlay::Confirm;
                }
            }
            _ => {}
        }
        None
    }

    fn on_fetched(&mut self, index: usize, result: Result<ControlInfo, ProtocolError>) {
        if self.pending_fetch == Some(index) {
            self.pending_fetch = None;
        }
        if index != self.cursor {
            tracing::debug!(index, cursor = self.cursor, "Ignoring stale fetch result");
            return;
        }
        match result {
            Ok(info) => {
                if !self.edited {
                    self.staged = self.staged.merged_with_info(&info);
                }
                self.current = info;
                self.last_error = None;
            }
            Err(e) => {
                tracing::debug!(index, error = %e, "Live value fetch failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn select(&mut self, index: usize) -> Option<Effect> {
        self.cursor = index;
        self.current.clear();
        self.last_error = None;
        self.fetch_selected()
    }

    fn fetch_selected(&mut self) -> Option<Effect> {
        let device = self.devices.get(self.cursor)?;
        self.pending_fetch = Some(self.cursor);
        Some(Effect::Fetch {
            index: self.cursor,
            ip: device.device.ip.clone(),
        })
    }

    fn start_apply(&mut self) -> Option<Effect> {
        if self.applying || self.devices.is_empty() {
            return None;
        }
        self.applying = true;
        let params = ControlParams::from(self.staged);
        let targets = self
            .devices
            .iter()
            .map(|h| ApplyTarget::from_history(h, params))
            .collect();
        tracing::info!(settings = %self.staged, "Applying staged settings");
        Some(Effect::Apply { targets })
    }

    fn edit(&mut self, change: impl FnOnce(&mut ControlSettings)) {
        change(&mut self.staged);
        self.edited = true;
    }

    fn step_temperature(&mut self, degrees: i16) {
        self.edit(|s| s.temperature = s.temperature.step(degrees));
    }

    fn cycle_focused(&mut self, forward: bool) {
        match self.focus {
            Focus::Power => self.edit(|s| s.power = s.power.toggled()),
            Focus::Mode => self.edit(|s| {
                s.mode = if forward { s.mode.next() } else { s.mode.previous() };
            }),
            Focus::Temperature => self.step_temperature(if forward { 1 } else { -1 }),
            Focus::FanRate => self.edit(|s| {
                s.fan_rate = if forward {
                    s.fan_rate.next()
                } else {
                    s.fan_rate.previous()
                };
            }),
            Focus::FanDirection => self.edit(|s| {
                s.fan_direction = if forward {
                    s.fan_direction.next()
                } else {
                    s.fan_direction.previous()
                };
            }),
            Focus::DeviceList => {}
        }
    }

    /// Units in display order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceHistory] {
        &self.devices
    }

    /// Index of the inspected unit.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The inspected unit.
    #[must_use]
    pub fn selected(&self) -> Option<&DeviceHistory> {
        self.devices.get(self.cursor)
    }

    /// Focused field.
    #[must_use]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Visible overlay.
    #[must_use]
    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// Live values of the inspected unit, empty until fetched.
    #[must_use]
    pub fn current(&self) -> &ControlInfo {
        &self.current
    }

    /// Settings that the next apply sends.
    #[must_use]
    pub fn staged(&self) -> ControlSettings {
        self.staged
    }

    /// True once the operator changed a staged value.
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Error of the last failed fetch for the inspected unit.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Report of the last apply.
    #[must_use]
    pub fn results(&self) -> Option<&BatchReport> {
        self.results.as_ref()
    }

    /// True while an apply is in flight.
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.applying
    }

    /// True once a quit key was pressed.
    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }
}
