//! Pure job planning: turns the persisted settings and weekly schedules
//! into a flat list of named trigger/action pairs. The scheduler rebuilds
//! this list from scratch whenever the data files change.

use chrono_tz::Tz;
use pod_common::{AlarmSchedule, DayOfWeek, Schedules, Settings, Side, TimeOfDay};
use tracing::warn;

use super::rules::{offset_trigger, resolve_session_end_day, RecurrenceRule};

/// Sleep analysis runs shortly after the power-off so the night's vitals
/// are complete.
pub const ANALYZE_SLEEP_OFFSET_MINUTES: i32 = 15;
/// The device reboots shortly before the daily prime so it comes back
/// with a fresh water circuit.
pub const REBOOT_OFFSET_MINUTES: i32 = -10;
/// Sensor calibration runs per side once priming has settled.
pub const CALIBRATE_LEFT_OFFSET_MINUTES: i32 = 20;
pub const CALIBRATE_RIGHT_OFFSET_MINUTES: i32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    PowerOn { side: Side, temperature_f: i32 },
    PowerOff { side: Side },
    AnalyzeSleep { side: Side },
    AdjustTemperature { side: Side, temperature_f: i32 },
    Alarm { side: Side, alarm: AlarmSchedule },
    Prime,
    Reboot,
    CalibrateSensors { side: Side },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub name: String,
    pub rule: RecurrenceRule,
    pub action: PlannedAction,
}

/// Builds the full job list. Returns an empty list when no time zone is
/// configured, since wall-clock triggers are meaningless without one.
pub fn build_jobs(settings: &Settings, schedules: &Schedules) -> Vec<JobSpec> {
    let Some(zone_name) = settings.time_zone.as_deref() else {
        return Vec::new();
    };
    let tz: Tz = match zone_name.parse() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(zone = zone_name, "unknown time zone, scheduling nothing");
            return Vec::new();
        }
    };

    let mut jobs = Vec::new();

    for side in Side::BOTH {
        if settings.side(side).away_mode {
            continue;
        }
        for (day, daily) in schedules.side(side).days() {
            plan_power(&mut jobs, side, day, daily, tz);
            plan_temperatures(&mut jobs, side, day, daily, tz);
            plan_alarm(&mut jobs, side, day, daily, tz);
        }
    }

    plan_prime_family(&mut jobs, settings, tz);
    jobs
}

fn plan_power(
    jobs: &mut Vec<JobSpec>,
    side: Side,
    day: DayOfWeek,
    daily: &pod_common::DailySchedule,
    tz: Tz,
) {
    if !daily.power.enabled {
        return;
    }

    jobs.push(JobSpec {
        name: trigger_name(side, day, daily.power.on, "power-on"),
        rule: RecurrenceRule::weekly(day, daily.power.on, tz),
        action: PlannedAction::PowerOn {
            side,
            temperature_f: daily.power.on_temperature,
        },
    });

    let off_day = resolve_session_end_day(day, daily.power.off);
    jobs.push(JobSpec {
        name: trigger_name(side, off_day, daily.power.off, "power-off"),
        rule: RecurrenceRule::weekly(off_day, daily.power.off, tz),
        action: PlannedAction::PowerOff { side },
    });

    let (analyze_day, analyze_time) =
        offset_trigger(off_day, daily.power.off, ANALYZE_SLEEP_OFFSET_MINUTES);
    jobs.push(JobSpec {
        name: format!("daily-analyze-sleep-{analyze_time}-{side}"),
        rule: RecurrenceRule::weekly(analyze_day, analyze_time, tz),
        action: PlannedAction::AnalyzeSleep { side },
    });
}

fn plan_temperatures(
    jobs: &mut Vec<JobSpec>,
    side: Side,
    day: DayOfWeek,
    daily: &pod_common::DailySchedule,
    tz: Tz,
) {
    for (&time, &temperature_f) in &daily.temperatures {
        // Adjustments after midnight belong to the tail of the session.
        let actual_day = resolve_session_end_day(day, time);
        jobs.push(JobSpec {
            name: trigger_name(side, actual_day, time, "temperature-adjustment"),
            rule: RecurrenceRule::weekly(actual_day, time, tz),
            action: PlannedAction::AdjustTemperature { side, temperature_f },
        });
    }
}

fn plan_alarm(
    jobs: &mut Vec<JobSpec>,
    side: Side,
    day: DayOfWeek,
    daily: &pod_common::DailySchedule,
    tz: Tz,
) {
    if !daily.power.enabled || !daily.alarm.enabled {
        return;
    }
    // The alarm belongs to whichever morning the session ends on, so its
    // weekday is resolved from the power-off time, not its own.
    let alarm_day = resolve_session_end_day(day, daily.power.off);
    jobs.push(JobSpec {
        name: trigger_name(side, alarm_day, daily.alarm.time, "alarm"),
        rule: RecurrenceRule::weekly(alarm_day, daily.alarm.time, tz),
        action: PlannedAction::Alarm {
            side,
            alarm: daily.alarm.clone(),
        },
    });
}

fn plan_prime_family(jobs: &mut Vec<JobSpec>, settings: &Settings, tz: Tz) {
    let prime = &settings.prime_pod_daily;
    if !prime.enabled {
        return;
    }

    jobs.push(JobSpec {
        name: format!("daily-priming-{}", prime.time),
        rule: RecurrenceRule::daily(prime.time, tz),
        action: PlannedAction::Prime,
    });

    if settings.reboot_daily {
        let (_, reboot_time) =
            offset_trigger(DayOfWeek::Sunday, prime.time, REBOOT_OFFSET_MINUTES);
        jobs.push(JobSpec {
            name: format!("daily-reboot-{reboot_time}"),
            rule: RecurrenceRule::daily(reboot_time, tz),
            action: PlannedAction::Reboot,
        });
    }

    for (side, offset) in [
        (Side::Left, CALIBRATE_LEFT_OFFSET_MINUTES),
        (Side::Right, CALIBRATE_RIGHT_OFFSET_MINUTES),
    ] {
        let (_, calibrate_time) = offset_trigger(DayOfWeek::Sunday, prime.time, offset);
        jobs.push(JobSpec {
            name: format!("daily-calibration-{calibrate_time}-{side}"),
            rule: RecurrenceRule::daily(calibrate_time, tz),
            action: PlannedAction::CalibrateSensors { side },
        });
    }
}

fn trigger_name(side: Side, day: DayOfWeek, time: TimeOfDay, kind: &str) -> String {
    format!("{side}-{day}-{time}-{kind}")
}
