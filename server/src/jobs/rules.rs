//! Recurrence math for scheduled jobs. All rules are local wall-clock
//! times in the user's IANA time zone; occurrences are resolved to UTC
//! instants at run time so DST transitions are handled by the zone data.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use pod_common::{DayOfWeek, TimeOfDay};
use tracing::warn;

/// Sessions whose off time falls at or before this hour are treated as
/// ending on the morning after the nominal day. A schedule of 21:00 to
/// 09:00 on "monday" therefore switches off Tuesday morning.
pub const DAY_NIGHT_BOUNDARY_HOUR: u8 = 12;

/// A weekly or daily wall-clock trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub weekday: Option<DayOfWeek>,
    pub time: TimeOfDay,
    pub tz: Tz,
}

impl RecurrenceRule {
    pub fn weekly(weekday: DayOfWeek, time: TimeOfDay, tz: Tz) -> Self {
        Self {
            weekday: Some(weekday),
            time,
            tz,
        }
    }

    pub fn daily(time: TimeOfDay, tz: Tz) -> Self {
        Self {
            weekday: None,
            time,
            tz,
        }
    }

    /// The first occurrence strictly after `after`. Scans up to a week
    /// ahead; a wall-clock time skipped by a DST gap on its day simply
    /// rolls over to the next matching day.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_after = after.with_timezone(&self.tz);

        for day_offset in 0..=7 {
            let date = local_after.date_naive() + Duration::days(day_offset);
            if let Some(weekday) = self.weekday {
                if DayOfWeek::from_chrono(date.weekday()) != weekday {
                    continue;
                }
            }
            let Some(naive) = date.and_hms_opt(
                u32::from(self.time.hour()),
                u32::from(self.time.minute()),
                0,
            ) else {
                continue;
            };
            let Some(local) = self.tz.from_local_datetime(&naive).earliest() else {
                warn!(%naive, zone = %self.tz, "wall-clock time does not exist, skipping day");
                continue;
            };
            let candidate = local.with_timezone(&Utc);
            if candidate > after {
                return Some(candidate);
            }
        }

        None
    }
}

/// Resolves the calendar day a session actually ends on. End times in the
/// morning belong to the following day.
pub fn resolve_session_end_day(nominal: DayOfWeek, end: TimeOfDay) -> DayOfWeek {
    if end.hour() <= DAY_NIGHT_BOUNDARY_HOUR {
        nominal.next()
    } else {
        nominal
    }
}

/// Shifts a day/time pair by a signed number of minutes, carrying across
/// midnight in either direction.
pub fn offset_trigger(day: DayOfWeek, time: TimeOfDay, offset_minutes: i32) -> (DayOfWeek, TimeOfDay) {
    let total = time.minutes_since_midnight() as i32 + offset_minutes;
    let day_shift = total.div_euclid(24 * 60);
    let minutes = total.rem_euclid(24 * 60) as u32;

    let mut day_index = day.index() as i32 + day_shift;
    day_index = day_index.rem_euclid(7);
    (DayOfWeek::from_index(day_index as u32), TimeOfDay::from_minutes(minutes))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use chrono_tz::America::New_York;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn weekly_rule_finds_the_next_matching_weekday() {
        // 2025-01-01 is a Wednesday.
        let after = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let rule = RecurrenceRule::weekly(DayOfWeek::Friday, at(21, 0), New_York);

        let next = rule.next_occurrence(after).unwrap();
        let local = next.with_timezone(&New_York);
        assert_eq!(local.weekday(), chrono::Weekday::Fri);
        assert_eq!((local.hour(), local.minute()), (21, 0));
    }

    #[test]
    fn daily_rule_rolls_to_tomorrow_when_todays_time_has_passed() {
        let after = Utc.with_ymd_and_hms(2025, 6, 10, 23, 0, 0).unwrap();
        let rule = RecurrenceRule::daily(at(14, 0), New_York);

        // 23:00 UTC is 19:00 in New York, so today's 14:00 has passed.
        let next = rule.next_occurrence(after).unwrap();
        let local = next.with_timezone(&New_York);
        assert_eq!(local.date_naive().to_string(), "2025-06-11");
        assert_eq!((local.hour(), local.minute()), (14, 0));
    }

    #[test]
    fn occurrence_exactly_at_after_is_excluded() {
        let rule = RecurrenceRule::daily(at(9, 0), chrono_tz::UTC);
        let after = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();

        let next = rule.next_occurrence(after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap());
    }

    #[test]
    fn morning_end_times_land_on_the_next_day() {
        assert_eq!(
            resolve_session_end_day(DayOfWeek::Monday, at(8, 0)),
            DayOfWeek::Tuesday
        );
        assert_eq!(
            resolve_session_end_day(DayOfWeek::Monday, at(12, 0)),
            DayOfWeek::Tuesday
        );
        assert_eq!(
            resolve_session_end_day(DayOfWeek::Monday, at(23, 0)),
            DayOfWeek::Monday
        );
        assert_eq!(
            resolve_session_end_day(DayOfWeek::Saturday, at(6, 30)),
            DayOfWeek::Sunday
        );
    }

    #[test]
    fn trigger_offsets_carry_across_midnight() {
        assert_eq!(
            offset_trigger(DayOfWeek::Monday, at(9, 0), 15),
            (DayOfWeek::Monday, at(9, 15))
        );
        assert_eq!(
            offset_trigger(DayOfWeek::Monday, at(0, 5), -10),
            (DayOfWeek::Sunday, at(23, 55))
        );
        assert_eq!(
            offset_trigger(DayOfWeek::Saturday, at(23, 50), 30),
            (DayOfWeek::Sunday, at(0, 20))
        );
    }
}
