// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input keys, focus ring and overlays.

use crate::types::cycle;

/// A key press, independent of any terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// A character pressed with Control.
    Ctrl(char),
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Enter.
    Enter,
    /// Escape.
    Esc,
}

impl Key {
    /// Returns true for the keys that quit from any state.
    #[must_use]
    pub const fn is_quit(self) -> bool {
        matches!(self, Self::Char('q') | Self::Ctrl('c'))
    }
}

/// Field or list receiving the navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Focus {
    /// Power toggle.
    #[default]
    Power,
    /// Operating mode.
    Mode,
    /// Target temperature.
    Temperature,
    /// Fan rate.
    FanRate,
    /// Fan direction.
    FanDirection,
    /// Device list.
    DeviceList,
}

impl Focus {
    /// Focus ring order.
    pub const ALL: [Self; 6] = [
        Self::Power,
        Self::Mode,
        Self::Temperature,
        Self::FanRate,
        Self::FanDirection,
        Self::DeviceList,
    ];

    /// Returns the next focus, wrapping.
    #[must_use]
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, true)
    }

    /// Returns the previous focus, wrapping.
    #[must_use]
    pub fn previous(self) -> Self {
        cycle(&Self::ALL, self, false)
    }

    /// Returns a short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Power => "Power",
            Self::Mode => "Mode",
            Self::Temperature => "Temp",
            Self::FanRate => "Fan",
            Self::FanDirection => "Wings",
            Self::DeviceList => "Devices",
        }
    }
}

/// Modal layer above the control screen. At most one is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overlay {
    /// No overlay.
    #[default]
    None,
    /// Key binding help.
    Help,
    /// Apply confirmation.
    Confirm,
    /// Results of the last apply.
    Results,
}

/// Key binding summary for help screens.
pub const HELP: &[(&str, &str)] = &[
    ("Tab / Shift+Tab", "move focus"),
    ("Up/Down, k/j", "select device, or step temperature"),
    ("Left/Right", "change focused field"),
    ("+ / -", "temperature up / down"),
    ("p m f d", "power, mode, fan rate, fan direction"),
    ("r", "refresh live values"),
    ("a", "apply to all devices"),
    ("h", "toggle help"),
    ("Esc", "close overlay"),
    ("q, Ctrl+C", "quit"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_ring_wraps_both_ways() {
        assert_eq!(Focus::DeviceList.next(), Focus::Power);
        assert_eq!(Focus::Power.previous(), Focus::DeviceList);
        assert_eq!(Focus::Mode.next(), Focus::Temperature);
    }

    #[test]
    fn quit_keys() {
        assert!(Key::Char('q').is_quit());
        assert!(Key::Ctrl('c').is_quit());
        assert!(!Key::Char('Q').is_quit());
        assert!(!Key::Esc.is_quit());
    }
}
