use std::collections::{BTreeMap, HashMap};

use ciborium::value::Value;
use serde::Serialize;
use thiserror::Error;

use crate::blob::decode_device_settings;
use crate::types::Side;

/// Raised when the device's status response is missing fields or carries
/// values of the wrong shape. Never partially accepted: every violated
/// field is listed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed device status, invalid fields: {}", fields.join(", "))]
pub struct MalformedStatus {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SideStatus {
    #[serde(rename = "currentTemperatureF")]
    pub current_temperature_f: i32,
    #[serde(rename = "targetTemperatureF")]
    pub target_temperature_f: i32,
    #[serde(rename = "secondsRemaining")]
    pub seconds_remaining: u32,
    #[serde(rename = "isOn")]
    pub is_on: bool,
    /// Ephemeral; the device does not report this, it is merged in from
    /// the in-memory alarm state by whoever serves the status.
    #[serde(rename = "isAlarmVibrating")]
    pub is_alarm_vibrating: bool,
}

/// Transient device-reported snapshot. Always fetched live, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub left: SideStatus,
    pub right: SideStatus,
    #[serde(rename = "sensorLabel")]
    pub sensor_label: String,
    #[serde(rename = "waterLevel")]
    pub water_level: String,
    #[serde(rename = "isPriming")]
    pub is_priming: bool,
    /// Device settings decoded from the hex-armoured CBOR blob, with the
    /// terse device keys remapped; see [`crate::blob`].
    pub settings: BTreeMap<String, Value>,
}

impl DeviceStatus {
    pub fn side(&self, side: Side) -> &SideStatus {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

enum Shape {
    SignedInt,
    UnsignedInt,
    Bool,
    Any,
}

const EXPECTED_FIELDS: &[(&str, Shape)] = &[
    ("tgHeatLevelR", Shape::SignedInt),
    ("tgHeatLevelL", Shape::SignedInt),
    ("heatTimeL", Shape::UnsignedInt),
    ("heatLevelL", Shape::SignedInt),
    ("heatTimeR", Shape::UnsignedInt),
    ("heatLevelR", Shape::SignedInt),
    ("sensorLabel", Shape::Any),
    ("waterLevel", Shape::Bool),
    ("priming", Shape::Bool),
    ("settings", Shape::Any),
];

fn matches_shape(value: &str, shape: &Shape) -> bool {
    // Widths match the fields they feed, so a value that passes the shape
    // check always converts losslessly.
    match shape {
        Shape::SignedInt => value.parse::<i32>().is_ok(),
        Shape::UnsignedInt => value.parse::<u32>().is_ok(),
        Shape::Bool => value == "true" || value == "false",
        Shape::Any => true,
    }
}

fn parse_raw(response: &str) -> Result<HashMap<&str, &str>, MalformedStatus> {
    let pairs: HashMap<&str, &str> = response
        .lines()
        .filter_map(|line| line.split_once(" = "))
        .collect();

    let violations: Vec<String> = EXPECTED_FIELDS
        .iter()
        .filter(|(key, shape)| {
            !pairs
                .get(key)
                .copied()
                .is_some_and(|value| matches_shape(value, shape))
        })
        .map(|(key, _)| key.to_string())
        .collect();

    if violations.is_empty() {
        Ok(pairs)
    } else {
        Err(MalformedStatus { fields: violations })
    }
}

/// Converts the device's native temperature level (-100..=100) to °F.
/// Level 0 maps to 83 (82.5 rounded); the extremes interpolate linearly
/// to 55°F at -100 and 110°F at +100.
pub fn level_to_f(level: i32) -> i32 {
    if level == 0 {
        83
    } else {
        (82.5 + (level as f64 / 100.0) * 27.5).round() as i32
    }
}

/// Inverse of [`level_to_f`] within rounding. One degree Fahrenheit spans
/// about 3.6 levels, so a round trip through °F can move a level by up to
/// two units; the formula is kept byte-compatible with the device firmware
/// rather than tightened.
pub fn level_from_f(temperature_f: i32) -> i32 {
    ((temperature_f as f64 - 82.5) / 27.5 * 100.0).round() as i32
}

/// Decodes the raw status response (newline-separated `key = value` pairs)
/// into a typed snapshot, remapping the terse device keys to readable names.
pub fn parse_device_status(response: &str) -> Result<DeviceStatus, MalformedStatus> {
    let raw = parse_raw(response)?;
    let settings = decode_device_settings(raw["settings"]).map_err(|_| MalformedStatus {
        fields: vec!["settings".to_string()],
    })?;
    // Shapes were validated above, so these cannot fail.
    let level = |key: &str| raw[key].parse::<i32>().unwrap_or_default();
    let seconds = |key: &str| raw[key].parse::<u32>().unwrap_or_default();

    let left_seconds = seconds("heatTimeL");
    let right_seconds = seconds("heatTimeR");

    Ok(DeviceStatus {
        left: SideStatus {
            current_temperature_f: level_to_f(level("heatLevelL")),
            target_temperature_f: level_to_f(level("tgHeatLevelL")),
            seconds_remaining: left_seconds,
            is_on: left_seconds > 0,
            is_alarm_vibrating: false,
        },
        right: SideStatus {
            current_temperature_f: level_to_f(level("heatLevelR")),
            target_temperature_f: level_to_f(level("tgHeatLevelR")),
            seconds_remaining: right_seconds,
            is_on: right_seconds > 0,
            is_alarm_vibrating: false,
        },
        sensor_label: raw["sensorLabel"].to_string(),
        water_level: raw["waterLevel"].to_string(),
        is_priming: raw["priming"] == "true",
        settings,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const RESPONSE: &str = "tgHeatLevelR = 10\n\
                            tgHeatLevelL = -40\n\
                            heatTimeL = 3600\n\
                            heatLevelL = -20\n\
                            heatTimeR = 0\n\
                            heatLevelR = 50\n\
                            sensorLabel = 00000-0000-A00-00000000\n\
                            waterLevel = true\n\
                            priming = false\n\
                            settings = a1626c621864";

    #[test]
    fn parses_a_full_status_response() {
        let status = parse_device_status(RESPONSE).unwrap();

        assert_eq!(status.left.seconds_remaining, 3600);
        assert!(status.left.is_on);
        assert_eq!(status.left.current_temperature_f, level_to_f(-20));
        assert_eq!(status.left.target_temperature_f, level_to_f(-40));

        assert_eq!(status.right.seconds_remaining, 0);
        assert!(!status.right.is_on);
        assert_eq!(status.right.target_temperature_f, level_to_f(10));

        assert_eq!(status.sensor_label, "00000-0000-A00-00000000");
        assert_eq!(status.water_level, "true");
        assert!(!status.is_priming);
        // a1626c621864: {"lb": 100}, remapped to the readable key.
        assert_eq!(
            status.settings,
            BTreeMap::from([("ledBrightness".to_string(), Value::Integer(100.into()))])
        );
    }

    #[test]
    fn undecodable_settings_blob_is_a_malformed_status() {
        let broken = RESPONSE.replace("settings = a1626c621864", "settings = zz");
        let err = parse_device_status(&broken).unwrap_err();
        assert_eq!(err.fields, vec!["settings".to_string()]);
    }

    #[test]
    fn malformed_status_lists_every_offending_field() {
        let broken = RESPONSE
            .replace("heatLevelL = -20", "heatLevelL = warm")
            .replace("waterLevel = true\n", "");
        let err = parse_device_status(&broken).unwrap_err();
        assert_eq!(err.fields, vec!["heatLevelL".to_string(), "waterLevel".to_string()]);
    }

    #[test]
    fn level_endpoints_map_to_limit_temperatures() {
        assert_eq!(level_to_f(0), 83);
        assert_eq!(level_to_f(-100), 55);
        assert_eq!(level_to_f(100), 110);
        assert_eq!(level_from_f(55), -100);
        assert_eq!(level_from_f(110), 100);
    }

    #[test]
    fn level_round_trips_within_device_granularity() {
        // Each whole °F covers three to four levels, so two units is the
        // tightest bound any inverse can achieve (-98 → 56°F → -96).
        for level in -100..=100 {
            let back = level_from_f(level_to_f(level));
            assert!(
                (back - level).abs() <= 2,
                "level {level} round-tripped to {back}"
            );
        }
    }

    #[test]
    fn durations_wider_than_the_field_are_rejected() {
        let broken = RESPONSE.replace("heatTimeL = 3600", "heatTimeL = 4294967296");
        let err = parse_device_status(&broken).unwrap_err();
        assert_eq!(err.fields, vec!["heatTimeL".to_string()]);
    }
}
