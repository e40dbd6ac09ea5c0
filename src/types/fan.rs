// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan rate and fan direction types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Fan speed, sent as the `f_rate` key.
///
/// # Examples
///
/// ```
/// use climctl::types::FanRate;
///
/// let rate: FanRate = "A".parse().unwrap();
/// assert_eq!(rate, FanRate::Auto);
/// assert_eq!(FanRate::Level5.next(), FanRate::Auto);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FanRate {
    /// Unit chooses the speed.
    #[default]
    Auto,
    /// Quiet operation.
    Silent,
    /// Lowest fixed speed.
    Level1,
    /// Fixed speed 2.
    Level2,
    /// Fixed speed 3.
    Level3,
    /// Fixed speed 4.
    Level4,
    /// Highest fixed speed.
    Level5,
}

impl FanRate {
    /// Every rate a unit may report.
    pub const ALL: [Self; 7] = [
        Self::Auto,
        Self::Silent,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Level4,
        Self::Level5,
    ];

    /// Rates offered when cycling. `Silent` is accepted from units but
    /// never offered; cycling from it continues as from `Auto`.
    pub const CYCLE: [Self; 6] = [
        Self::Auto,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Level4,
        Self::Level5,
    ];

    /// Returns the protocol value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "A",
            Self::Silent => "B",
            Self::Level1 => "3",
            Self::Level2 => "4",
            Self::Level3 => "5",
            Self::Level4 => "6",
            Self::Level5 => "7",
        }
    }

    /// Returns the next rate, wrapping to the first.
    #[must_use]
    pub fn next(self) -> Self {
        super::cycle(&Self::CYCLE, self, true)
    }

    /// Returns the previous rate, wrapping to the last.
    #[must_use]
    pub fn previous(self) -> Self {
        super::cycle(&Self::CYCLE, self, false)
    }
}

impl fmt::Display for FanRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FanRate {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|rate| rate.as_str() == wanted)
            .ok_or_else(|| ValueError::InvalidFanRate(s.to_string()))
    }
}

impl TryFrom<String> for FanRate {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FanRate> for String {
    fn from(value: FanRate) -> Self {
        value.as_str().to_string()
    }
}

/// Louver motion, sent as the `f_dir` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FanDirection {
    /// All wings stopped.
    #[default]
    Stopped,
    /// Vertical wings motion.
    Vertical,
    /// Horizontal wings motion.
    Horizontal,
    /// Vertical and horizontal wings motion.
    Both,
}

impl FanDirection {
    /// All directions in cycling order.
    pub const ALL: [Self; 4] = [Self::Stopped, Self::Vertical, Self::Horizontal, Self::Both];

    /// Returns the protocol value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "0",
            Self::Vertical => "1",
            Self::Horizontal => "2",
            Self::Both => "3",
        }
    }

    /// Returns a human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "All wings stopped",
            Self::Vertical => "Vertical wings motion",
            Self::Horizontal => "Horizontal wings motion",
            Self::Both => "Vertical and horizontal wings motion",
        }
    }

    /// Returns the next direction, wrapping to the first.
    #[must_use]
    pub fn next(self) -> Self {
        super::cycle(&Self::ALL, self, true)
    }

    /// Returns the previous direction, wrapping to the last.
    #[must_use]
    pub fn previous(self) -> Self {
        super::cycle(&Self::ALL, self, false)
    }
}

impl fmt::Display for FanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FanDirection {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|dir| dir.as_str() == wanted)
            .ok_or_else(|| ValueError::InvalidFanDirection(s.to_string()))
    }
}

impl TryFrom<String> for FanDirection {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FanDirection> for String {
    fn from(value: FanDirection) -> Self {
        value.as_str().to_string()
    }
}
