// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The set-control request sent to one unit.

use super::{
    ControlInfo, ControlParams, KEY_FAN_DIRECTION, KEY_FAN_RATE, KEY_HUMIDITY, KEY_MODE,
    KEY_POWER, KEY_TEMPERATURE,
};

/// Raw protocol values for one `set_control_info` request.
///
/// Units expect every key on each request, so a command is always complete.
/// Values that the caller did not choose come from the unit's current
/// control info; humidity is never edited and is always passed through.
///
/// # Examples
///
/// ```
/// use climctl::params::{ControlInfo, ControlParams, SetControlCommand};
/// use climctl::types::Power;
///
/// let mut current = ControlInfo::new();
/// current.insert("pow".into(), "1".into());
/// current.insert("stemp".into(), "21.0".into());
/// current.insert("shum".into(), "0".into());
///
/// let params = ControlParams::new().with_power(Power::Off);
/// let cmd = SetControlCommand::resolve(&params, &current);
/// assert_eq!(cmd.power, "0");
/// assert_eq!(cmd.temperature, "21.0");
/// assert_eq!(cmd.humidity, "0");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetControlCommand {
    /// `pow`
    pub power: String,
    /// `stemp`
    pub temperature: String,
    /// `mode`
    pub mode: String,
    /// `shum`
    pub humidity: String,
    /// `f_rate`
    pub fan_rate: String,
    /// `f_dir`
    pub fan_direction: String,
}

impl SetControlCommand {
    /// Builds a command from a parameter set, falling back to the unit's
    /// current values for every unset field.
    #[must_use]
    pub fn resolve(params: &ControlParams, current: &ControlInfo) -> Self {
        let live = |key: &str| current.get(key).cloned().unwrap_or_default();
        Self {
            power: params
                .power
                .map_or_else(|| live(KEY_POWER), |v| v.as_str().to_string()),
            temperature: params
                .temperature
                .map_or_else(|| live(KEY_TEMPERATURE), |v| v.to_string()),
            mode: params
                .mode
                .map_or_else(|| live(KEY_MODE), |v| v.as_str().to_string()),
            humidity: live(KEY_HUMIDITY),
            fan_rate: params
                .fan_rate
                .map_or_else(|| live(KEY_FAN_RATE), |v| v.as_str().to_string()),
            fan_direction: params
                .fan_direction
                .map_or_else(|| live(KEY_FAN_DIRECTION), |v| v.as_str().to_string()),
        }
    }

    /// Returns the key/value pairs in the order the units document them.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            (KEY_POWER, self.power.as_str()),
            (KEY_TEMPERATURE, self.temperature.as_str()),
            (KEY_MODE, self.mode.as_str()),
            (KEY_HUMIDITY, self.humidity.as_str()),
            (KEY_FAN_RATE, self.fan_rate.as_str()),
            (KEY_FAN_DIRECTION, self.fan_direction.as_str()),
        ]
    }

    /// Encodes the command as a URL query string.
    #[must_use]
    pub fn to_query(&self) -> String {
        self.pairs()
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ControlSettings;
    use crate::types::{FanRate, Mode, Temperature};

    fn current() -> ControlInfo {
        [
            ("pow", "0"),
            ("mode", "3"),
            ("stemp", "20.0"),
            ("shum", "AUTO"),
            ("f_rate", "5"),
            ("f_dir", "1"),
            ("adv", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn resolve_falls_back_to_live_values() {
        let params = ControlParams::new()
            .with_mode(Mode::Heat)
            .with_temperature(Temperature::from_degrees(23).unwrap());
        let cmd = SetControlCommand::resolve(&params, &current());
        assert_eq!(cmd.power, "0");
        assert_eq!(cmd.mode, "1");
        assert_eq!(cmd.temperature, "23.0");
        assert_eq!(cmd.humidity, "AUTO");
        assert_eq!(cmd.fan_rate, "5");
        assert_eq!(cmd.fan_direction, "1");
    }

    #[test]
    fn resolve_complete_params_without_live_values() {
        let params = ControlParams::from(ControlSettings::default()).with_fan_rate(FanRate::Silent);
        let cmd = SetControlCommand::resolve(&params, &ControlInfo::new());
        assert_eq!(cmd.power, "1");
        assert_eq!(cmd.fan_rate, "B");
        assert_eq!(cmd.humidity, "");
    }

    #[test]
    fn query_order_and_encoding() {
        let cmd = SetControlCommand {
            power: "1".to_string(),
            temperature: "22.0".to_string(),
            mode: "4".to_string(),
            humidity: "50 %".to_string(),
            fan_rate: "A".to_string(),
            fan_direction: "0".to_string(),
        };
        assert_eq!(
            cmd.to_query(),
            "pow=1&stemp=22.0&mode=4&shum=50%20%25&f_rate=A&f_dir=0"
        );
    }
}
