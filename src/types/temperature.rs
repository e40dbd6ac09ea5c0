// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target temperature type.
//!
//! This module provides a type-safe representation of the target
//! temperature, ensuring values always stay within the range accepted by
//! the units.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Target temperature in tenths of a degree Celsius.
///
/// Sent as the `stemp` key with one decimal (`"22.0"`).
///
/// # Examples
///
/// ```
/// use climctl::types::Temperature;
///
/// let t: Temperature = "22.5".parse().unwrap();
/// assert_eq!(t.to_string(), "22.5");
///
/// // Stepping clamps at the bounds instead of wrapping
/// assert_eq!(Temperature::MAX.step(1), Temperature::MAX);
///
/// // Invalid values return error
/// assert!("35".parse::<Temperature>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Temperature(u16);

impl Temperature {
    /// Lowest accepted target (16.0 °C).
    pub const MIN: Self = Self(160);

    /// Highest accepted target (30.0 °C).
    pub const MAX: Self = Self(300);

    /// Creates a temperature from tenths of a degree.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the value is outside 16.0-30.0.
    pub fn from_tenths(tenths: u16) -> Result<Self, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&tenths) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN.to_string(),
                max: Self::MAX.to_string(),
                actual: format_tenths(tenths),
            });
        }
        Ok(Self(tenths))
    }

    /// Creates a temperature from whole degrees.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the value is outside 16-30.
    pub fn from_degrees(degrees: u8) -> Result<Self, ValueError> {
        Self::from_tenths(u16::from(degrees) * 10)
    }

    /// Returns the value in tenths of a degree.
    #[must_use]
    pub const fn tenths(&self) -> u16 {
        self.0
    }

    /// Moves the target by whole degrees, clamped to the accepted range.
    #[must_use]
    pub fn step(self, degrees: i16) -> Self {
        let moved = i32::from(self.0) + i32::from(degrees) * 10;
        let clamped = moved.clamp(i32::from(Self::MIN.0), i32::from(Self::MAX.0));
        Self(u16::try_from(clamped).unwrap_or(Self::MAX.0))
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(240)
    }
}

fn format_tenths(tenths: u16) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_tenths(self.0))
    }
}

impl FromStr for Temperature {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidTemperature(s.to_string());
        let trimmed = s.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, "0"),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // Only one decimal is meaningful to the units; "22.50" is accepted,
        // "22.55" is not.
        let mut digits = fraction.bytes();
        let tenth = match digits.next() {
            Some(b) if b.is_ascii_digit() => u16::from(b - b'0'),
            None => 0,
            Some(_) => return Err(invalid()),
        };
        if digits.any(|b| b != b'0') {
            return Err(invalid());
        }
        let whole: u16 = whole.parse().map_err(|_| invalid())?;
        let tenths = whole
            .checked_mul(10)
            .and_then(|t| t.checked_add(tenth))
            .ok_or_else(invalid)?;
        Self::from_tenths(tenths)
    }
}

impl TryFrom<String> for Temperature {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Temperature> for String {
    fn from(value: Temperature) -> Self {
        value.to_string()
    }
}
