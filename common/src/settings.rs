use serde::{Deserialize, Serialize};

use crate::types::{Side, TemperatureFormat, TimeOfDay};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSettings {
    pub name: String,
    #[serde(rename = "awayMode")]
    pub away_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimePodDaily {
    pub enabled: bool,
    pub time: TimeOfDay,
}

/// User settings document. `time_zone` being `None` is a meaningful
/// "not configured" state: every time-based job is suppressed until the
/// user picks a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
    #[serde(rename = "temperatureFormat")]
    pub temperature_format: TemperatureFormat,
    #[serde(rename = "rebootDaily")]
    pub reboot_daily: bool,
    pub left: SideSettings,
    pub right: SideSettings,
    #[serde(rename = "primePodDaily")]
    pub prime_pod_daily: PrimePodDaily,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_zone: None,
            temperature_format: TemperatureFormat::Fahrenheit,
            reboot_daily: true,
            left: SideSettings {
                name: "Left".to_string(),
                away_mode: false,
            },
            right: SideSettings {
                name: "Right".to_string(),
                away_mode: false,
            },
            prime_pod_daily: PrimePodDaily {
                enabled: false,
                time: TimeOfDay::new(14, 0).unwrap(),
            },
        }
    }
}

impl Settings {
    pub fn side(&self, side: Side) -> &SideSettings {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// The pod cannot drive one zone independently while the other is
    /// unattended, so updates fan out to both sides whenever this is true.
    pub fn either_side_away(&self) -> bool {
        self.left.away_mode || self.right.away_mode
    }
}
