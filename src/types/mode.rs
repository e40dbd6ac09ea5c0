// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode of a climate unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Operating mode, sent as the `mode` key.
///
/// Modes form a fixed sequence that the interactive session cycles through,
/// wrapping at both ends.
///
/// # Examples
///
/// ```
/// use climctl::types::Mode;
///
/// assert_eq!(Mode::Auto.next(), Mode::Heat);
/// assert_eq!(Mode::Cool.next(), Mode::Auto);
/// assert_eq!(Mode::Auto.previous(), Mode::Cool);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Automatic heating or cooling.
    #[default]
    Auto,
    /// Heating.
    Heat,
    /// Dehumidification.
    Dry,
    /// Ventilation only.
    Fan,
    /// Cooling.
    Cool,
}

impl Mode {
    /// All modes in cycling order.
    pub const ALL: [Self; 5] = [Self::Auto, Self::Heat, Self::Dry, Self::Fan, Self::Cool];

    /// Returns the protocol value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "0",
            Self::Heat => "1",
            Self::Dry => "2",
            Self::Fan => "3",
            Self::Cool => "4",
        }
    }

    /// Returns a human readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Heat => "HEAT",
            Self::Dry => "DRY",
            Self::Fan => "FAN",
            Self::Cool => "COOL",
        }
    }

    /// Returns the next mode, wrapping to the first.
    #[must_use]
    pub fn next(self) -> Self {
        super::cycle(&Self::ALL, self, true)
    }

    /// Returns the previous mode, wrapping to the last.
    #[must_use]
    pub fn previous(self) -> Self {
        super::cycle(&Self::ALL, self, false)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "0" | "AUTO" => Ok(Self::Auto),
            "1" | "HEAT" => Ok(Self::Heat),
            "2" | "DRY" => Ok(Self::Dry),
            "3" | "FAN" => Ok(Self::Fan),
            "4" | "COOL" => Ok(Self::Cool),
            _ => Err(ValueError::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(value: Mode) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_forward_wraps() {
        let mut mode = Mode::Auto;
        for _ in 0..Mode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, Mode::Auto);
        assert_eq!(Mode::Cool.next(), Mode::Auto);
    }

    #[test]
    fn mode_cycle_backward_wraps() {
        assert_eq!(Mode::Auto.previous(), Mode::Cool);
        assert_eq!(Mode::Heat.previous(), Mode::Auto);
    }

    #[test]
    fn mode_parse() {
        assert_eq!("4".parse::<Mode>().unwrap(), Mode::Cool);
        assert_eq!("dry".parse::<Mode>().unwrap(), Mode::Dry);
        assert_eq!(
            "7".parse::<Mode>(),
            Err(ValueError::InvalidMode("7".to_string()))
        );
    }

    #[test]
    fn mode_wire_values() {
        let wire: Vec<&str> = Mode::ALL.iter().map(Mode::as_str).collect();
        assert_eq!(wire, ["0", "1", "2", "3", "4"]);
    }
}
