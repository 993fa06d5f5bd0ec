use std::fmt;

use pod_common::Side;

/// The fixed command set the device firmware understands. Each symbolic
/// command maps to the numeric code sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hello,
    SetTemp,
    SetAlarm,
    AlarmLeft,
    AlarmRight,
    SetSettings,
    LeftTempDuration,
    RightTempDuration,
    TempLevelLeft,
    TempLevelRight,
    Prime,
    DeviceStatus,
    AlarmClear,
}

impl Command {
    pub fn code(self) -> &'static str {
        match self {
            Self::Hello => "0",
            Self::SetTemp => "1",
            Self::SetAlarm => "2",
            Self::AlarmLeft => "5",
            Self::AlarmRight => "6",
            Self::SetSettings => "8",
            Self::LeftTempDuration => "9",
            Self::RightTempDuration => "10",
            Self::TempLevelLeft => "11",
            Self::TempLevelRight => "12",
            Self::Prime => "13",
            Self::DeviceStatus => "14",
            Self::AlarmClear => "16",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::SetTemp => "set-temp",
            Self::SetAlarm => "set-alarm",
            Self::AlarmLeft => "alarm-left",
            Self::AlarmRight => "alarm-right",
            Self::SetSettings => "set-settings",
            Self::LeftTempDuration => "left-temp-duration",
            Self::RightTempDuration => "right-temp-duration",
            Self::TempLevelLeft => "temp-level-left",
            Self::TempLevelRight => "temp-level-right",
            Self::Prime => "prime",
            Self::DeviceStatus => "device-status",
            Self::AlarmClear => "alarm-clear",
        }
    }

    pub fn alarm_for(side: Side) -> Self {
        match side {
            Side::Left => Self::AlarmLeft,
            Side::Right => Self::AlarmRight,
        }
    }

    pub fn temp_duration_for(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftTempDuration,
            Side::Right => Self::RightTempDuration,
        }
    }

    pub fn temp_level_for(side: Side) -> Self {
        match side {
            Side::Left => Self::TempLevelLeft,
            Side::Right => Self::TempLevelRight,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
