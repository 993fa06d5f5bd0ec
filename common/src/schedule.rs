use std::collections::BTreeMap;
use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::types::{Side, TimeOfDay, VibrationPattern};

/// Days use the original store convention: sunday is index 0, matching
/// chrono's `num_days_from_sunday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        Self::Sunday,
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    pub fn index(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        Self::from_index(weekday.num_days_from_sunday())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MIN_TEMPERATURE_F: i32 = 55;
pub const MAX_TEMPERATURE_F: i32 = 110;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSchedule {
    pub on: TimeOfDay,
    pub off: TimeOfDay,
    pub enabled: bool,
    #[serde(rename = "onTemperature")]
    pub on_temperature: i32,
}

impl Default for PowerSchedule {
    fn default() -> Self {
        Self {
            on: TimeOfDay::new(21, 0).unwrap(),
            off: TimeOfDay::new(9, 0).unwrap(),
            enabled: false,
            on_temperature: 82,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSchedule {
    pub time: TimeOfDay,
    #[serde(rename = "vibrationIntensity")]
    pub vibration_intensity: u8,
    #[serde(rename = "vibrationPattern")]
    pub vibration_pattern: VibrationPattern,
    /// Vibration duration in seconds.
    pub duration: u32,
    pub enabled: bool,
    #[serde(rename = "alarmTemperature")]
    pub alarm_temperature: i32,
}

impl Default for AlarmSchedule {
    fn default() -> Self {
        Self {
            time: TimeOfDay::new(9, 0).unwrap(),
            vibration_intensity: 1,
            vibration_pattern: VibrationPattern::Rise,
            duration: 1,
            enabled: false,
            alarm_temperature: 82,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySchedule {
    pub power: PowerSchedule,
    /// Sparse intraday target adjustments, ordered by time of day.
    #[serde(default)]
    pub temperatures: BTreeMap<TimeOfDay, i32>,
    pub alarm: AlarmSchedule,
}

impl DailySchedule {
    fn sanitize(&mut self) {
        self.power.on_temperature = self
            .power
            .on_temperature
            .clamp(MIN_TEMPERATURE_F, MAX_TEMPERATURE_F);
        self.alarm.alarm_temperature = self
            .alarm
            .alarm_temperature
            .clamp(MIN_TEMPERATURE_F, MAX_TEMPERATURE_F);
        for temperature in self.temperatures.values_mut() {
            *temperature = (*temperature).clamp(MIN_TEMPERATURE_F, MAX_TEMPERATURE_F);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SideSchedule {
    pub sunday: DailySchedule,
    pub monday: DailySchedule,
    pub tuesday: DailySchedule,
    pub wednesday: DailySchedule,
    pub thursday: DailySchedule,
    pub friday: DailySchedule,
    pub saturday: DailySchedule,
}

impl SideSchedule {
    pub fn day(&self, day: DayOfWeek) -> &DailySchedule {
        match day {
            DayOfWeek::Sunday => &self.sunday,
            DayOfWeek::Monday => &self.monday,
            DayOfWeek::Tuesday => &self.tuesday,
            DayOfWeek::Wednesday => &self.wednesday,
            DayOfWeek::Thursday => &self.thursday,
            DayOfWeek::Friday => &self.friday,
            DayOfWeek::Saturday => &self.saturday,
        }
    }

    pub fn day_mut(&mut self, day: DayOfWeek) -> &mut DailySchedule {
        match day {
            DayOfWeek::Sunday => &mut self.sunday,
            DayOfWeek::Monday => &mut self.monday,
            DayOfWeek::Tuesday => &mut self.tuesday,
            DayOfWeek::Wednesday => &mut self.wednesday,
            DayOfWeek::Thursday => &mut self.thursday,
            DayOfWeek::Friday => &mut self.friday,
            DayOfWeek::Saturday => &mut self.saturday,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = (DayOfWeek, &DailySchedule)> {
        DayOfWeek::ALL.into_iter().map(move |day| (day, self.day(day)))
    }
}

/// The whole weekly schedule document, one side schedule per thermal zone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schedules {
    pub left: SideSchedule,
    pub right: SideSchedule,
}

impl Schedules {
    pub fn side(&self, side: Side) -> &SideSchedule {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Clamps every configured temperature into the device's supported range.
    pub fn sanitize(&mut self) {
        for side in [&mut self.left, &mut self.right] {
            for day in DayOfWeek::ALL {
                side.day_mut(day).sanitize();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn day_index_round_trips() {
        for day in DayOfWeek::ALL {
            assert_eq!(DayOfWeek::from_index(day.index()), day);
        }
        assert_eq!(DayOfWeek::Saturday.next(), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::Sunday.index(), 0);
    }

    #[test]
    fn matches_chrono_sunday_indexing() {
        assert_eq!(DayOfWeek::from_chrono(chrono::Weekday::Sun), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::from_chrono(chrono::Weekday::Wed), DayOfWeek::Wednesday);
    }

    #[test]
    fn serializes_with_store_field_names() {
        let schedules = Schedules::default();
        let json = serde_json::to_value(&schedules).unwrap();
        let monday = &json["left"]["monday"];
        assert_eq!(monday["power"]["on"], "21:00");
        assert_eq!(monday["power"]["off"], "09:00");
        assert_eq!(monday["power"]["onTemperature"], 82);
        assert_eq!(monday["alarm"]["vibrationPattern"], "rise");
        assert_eq!(monday["alarm"]["duration"], 1);
    }

    #[test]
    fn temperature_map_round_trips_with_time_keys() {
        let mut daily = DailySchedule::default();
        daily.temperatures.insert(TimeOfDay::new(22, 0).unwrap(), 78);
        daily.temperatures.insert(TimeOfDay::new(2, 30).unwrap(), 68);

        let json = serde_json::to_string(&daily).unwrap();
        let back: DailySchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, daily);
        // BTreeMap keys stay ordered by wall clock.
        let times: Vec<String> = back.temperatures.keys().map(|t| t.to_string()).collect();
        assert_eq!(times, vec!["02:30", "22:00"]);
    }

    #[test]
    fn sanitize_clamps_out_of_range_temperatures() {
        let mut schedules = Schedules::default();
        schedules.left.monday.power.on_temperature = 300;
        schedules
            .left
            .monday
            .temperatures
            .insert(TimeOfDay::new(3, 0).unwrap(), 12);
        schedules.sanitize();
        assert_eq!(schedules.left.monday.power.on_temperature, MAX_TEMPERATURE_F);
        assert_eq!(
            schedules.left.monday.temperatures[&TimeOfDay::new(3, 0).unwrap()],
            MIN_TEMPERATURE_F
        );
    }
}
