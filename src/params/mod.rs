// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control parameter sets.
//!
//! Three shapes of the same five settings are used across the library:
//!
//! - [`ControlParams`]: a partial set, as written in batch scripts and
//!   overrides. Unset fields mean "keep whatever applies next" (the group
//!   default during resolution, the unit's live value during apply).
//! - [`ControlSettings`]: a complete set, used for the values staged in an
//!   interactive session and for configured defaults.
//! - [`SetControlCommand`]: the raw protocol values sent to one unit.

mod command;

pub use command::SetControlCommand;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{FanDirection, FanRate, Mode, Power, Temperature};

/// Protocol key/value pairs reported by a unit.
///
/// The key set is not enumerated; unknown keys are kept verbatim.
pub type ControlInfo = BTreeMap<String, String>;

/// Protocol key for the power state.
pub const KEY_POWER: &str = "pow";
/// Protocol key for the operating mode.
pub const KEY_MODE: &str = "mode";
/// Protocol key for the target temperature.
pub const KEY_TEMPERATURE: &str = "stemp";
/// Protocol key for the target humidity.
pub const KEY_HUMIDITY: &str = "shum";
/// Protocol key for the fan rate.
pub const KEY_FAN_RATE: &str = "f_rate";
/// Protocol key for the fan direction.
pub const KEY_FAN_DIRECTION: &str = "f_dir";

/// A partial set of control parameters.
///
/// Serialized with the field names used in batch scripts. Empty strings are
/// read as unset, and invalid values fail deserialization.
///
/// # Examples
///
/// ```
/// use climctl::params::ControlParams;
///
/// let defaults: ControlParams = serde_json::from_str(r#"{"power":"1","temp":"22.0"}"#).unwrap();
/// let over: ControlParams = serde_json::from_str(r#"{"temp":"25.0","mode":""}"#).unwrap();
///
/// let merged = defaults.overlay(&over);
/// assert_eq!(merged.power.unwrap().as_str(), "1");
/// assert_eq!(merged.temperature.unwrap().to_string(), "25.0");
/// assert!(merged.mode.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlParams {
    /// Power state.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub power: Option<Power>,

    /// Operating mode.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<Mode>,

    /// Target temperature.
    #[serde(
        rename = "temp",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<Temperature>,

    /// Fan rate.
    #[serde(
        rename = "fan-rate",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fan_rate: Option<FanRate>,

    /// Fan direction.
    #[serde(
        rename = "fan-dir",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub fan_direction: Option<FanDirection>,
}

impl ControlParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the power state.
    #[must_use]
    pub fn with_power(mut self, power: Power) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the operating mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Sets the target temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the fan rate.
    #[must_use]
    pub fn with_fan_rate(mut self, fan_rate: FanRate) -> Self {
        self.fan_rate = Some(fan_rate);
        self
    }

    /// Sets the fan direction.
    #[must_use]
    pub fn with_fan_direction(mut self, fan_direction: FanDirection) -> Self {
        self.fan_direction = Some(fan_direction);
        self
    }

    /// Parses a parameter set from optional raw strings.
    ///
    /// Empty strings are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns the first `ValueError` encountered.
    pub fn parse(
        power: &str,
        mode: &str,
        temperature: &str,
        fan_rate: &str,
        fan_direction: &str,
    ) -> Result<Self, crate::error::ValueError> {
        Ok(Self {
            power: parse_non_empty(power)?,
            mode: parse_non_empty(mode)?,
            temperature: parse_non_empty(temperature)?,
            fan_rate: parse_non_empty(fan_rate)?,
            fan_direction: parse_non_empty(fan_direction)?,
        })
    }

    /// Returns a copy where every field set in `other` replaces this one.
    #[must_use]
    pub fn overlay(&self, other: &Self) -> Self {
        Self {
            power: other.power.or(self.power),
            mode: other.mode.or(self.mode),
            temperature: other.temperature.or(self.temperature),
            fan_rate: other.fan_rate.or(self.fan_rate),
            fan_direction: other.fan_direction.or(self.fan_direction),
        }
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns true if every field is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.power.is_some()
            && self.mode.is_some()
            && self.temperature.is_some()
            && self.fan_rate.is_some()
            && self.fan_direction.is_some()
    }
}

impl From<ControlSettings> for ControlParams {
    fn from(value: ControlSettings) -> Self {
        Self {
            power: Some(value.power),
            mode: Some(value.mode),
            temperature: Some(value.temperature),
            fan_rate: Some(value.fan_rate),
            fan_direction: Some(value.fan_direction),
        }
    }
}

/// A complete set of control values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Power state.
    pub power: Power,
    /// Operating mode.
    pub mode: Mode,
    /// Target temperature.
    #[serde(rename = "temp")]
    pub temperature: Temperature,
    /// Fan rate.
    #[serde(rename = "fan-rate")]
    pub fan_rate: FanRate,
    /// Fan direction.
    #[serde(rename = "fan-dir")]
    pub fan_direction: FanDirection,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            power: Power::On,
            mode: Mode::Cool,
            temperature: Temperature::from_tenths(190).unwrap_or_default(),
            fan_rate: FanRate::Auto,
            fan_direction: FanDirection::Stopped,
        }
    }
}

impl ControlSettings {
    /// Replaces each field with the unit's reported value when that value
    /// is valid, keeping the current field otherwise.
    ///
    /// Units report placeholder temperatures (`"M"`, `"--"`) in some modes;
    /// those are skipped rather than treated as errors.
    #[must_use]
    pub fn merged_with_info(mut self, info: &ControlInfo) -> Self {
        fn read<T: FromStr>(info: &ControlInfo, key: &str) -> Option<T> {
            info.get(key).and_then(|v| v.parse().ok())
        }
        if let Some(power) = read(info, KEY_POWER) {
            self.power = power;
        }
        if let Some(mode) = read(info, KEY_MODE) {
            self.mode = mode;
        }
        if let Some(temperature) = read(info, KEY_TEMPERATURE) {
            self.temperature = temperature;
        }
        if let Some(fan_rate) = read(info, KEY_FAN_RATE) {
            self.fan_rate = fan_rate;
        }
        if let Some(fan_direction) = read(info, KEY_FAN_DIRECTION) {
            self.fan_direction = fan_direction;
        }
        self
    }
}

impl fmt::Display for ControlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pow={} mode={} stemp={} f_rate={} f_dir={}",
            self.power, self.mode, self.temperature, self.fan_rate, self.fan_direction
        )
    }
}

fn parse_non_empty<T>(raw: &str) -> Result<Option<T>, T::Err>
where
    T: FromStr,
{
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_non_empty(&raw).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    #[test]
    fn params_deserialize_script_names() {
        let json = r#"{"power":"0","mode":"4","temp":"21.5","fan-rate":"A","fan-dir":"3"}"#;
        let params: ControlParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.power, Some(Power::Off));
        assert_eq!(params.mode, Some(Mode::Cool));
        assert_eq!(params.temperature.unwrap().tenths(), 215);
        assert_eq!(params.fan_rate, Some(FanRate::Auto));
        assert_eq!(params.fan_direction, Some(FanDirection::Both));
        assert!(params.is_complete());
    }

    #[test]
    fn params_empty_strings_are_unset() {
        let params: ControlParams =
            serde_json::from_str(r#"{"power":"","temp":"  ","mode":null}"#).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn params_invalid_value_rejected() {
        let result = serde_json::from_str::<ControlParams>(r#"{"temp":"40"}"#);
        assert!(result.is_err());
        let result = serde_json::from_str::<ControlParams>(r#"{"mode":"9"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn params_serialize_skips_unset() {
        let params = ControlParams::new().with_power(Power::On);
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"power":"1"}"#);
    }

    #[test]
    fn params_overlay_prefers_other() {
        let base = ControlParams::new()
            .with_power(Power::On)
            .with_temperature(Temperature::from_degrees(22).unwrap());
        let over = ControlParams::new().with_temperature(Temperature::from_degrees(25).unwrap());
        let merged = base.overlay(&over);
        assert_eq!(merged.power, Some(Power::On));
        assert_eq!(merged.temperature, Temperature::from_degrees(25).ok());
        assert_eq!(merged.mode, None);
    }

    #[test]
    fn params_parse_raw() {
        let params = ControlParams::parse("1", "", "23", "", "2").unwrap();
        assert_eq!(params.power, Some(Power::On));
        assert_eq!(params.mode, None);
        assert_eq!(params.fan_direction, Some(FanDirection::Horizontal));
        assert_eq!(
            ControlParams::parse("", "", "", "Z", ""),
            Err(ValueError::InvalidFanRate("Z".to_string()))
        );
    }

    #[test]
    fn settings_merge_skips_placeholders() {
        let mut info = ControlInfo::new();
        info.insert("pow".to_string(), "0".to_string());
        info.insert("mode".to_string(), "2".to_string());
        info.insert("stemp".to_string(), "M".to_string());
        info.insert("f_rate".to_string(), "5".to_string());
        let merged = ControlSettings::default().merged_with_info(&info);
        assert_eq!(merged.power, Power::Off);
        assert_eq!(merged.mode, Mode::Dry);
        assert_eq!(merged.temperature.to_string(), "19.0");
        assert_eq!(merged.fan_rate, FanRate::Level3);
        assert_eq!(merged.fan_direction, FanDirection::Stopped);
    }

    #[test]
    fn settings_display() {
        let settings = ControlSettings::default();
        assert_eq!(
            settings.to_string(),
            "pow=1 mode=4 stemp=19.0 f_rate=A f_dir=0"
        );
    }
}
