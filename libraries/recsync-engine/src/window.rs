//! Sync window resolution

use chrono::{Duration, NaiveDateTime, Timelike};
use recsync_core::types::{Period, SyncWindowSpec};

/// Truncate to the start of the hour
pub fn begin_of_hour(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::seconds(i64::from(t.minute() * 60 + t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// Truncate to midnight
pub fn begin_of_day(t: NaiveDateTime) -> NaiveDateTime {
    t - Duration::seconds(i64::from(t.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// Resolve the window a run covers, relative to `now` (local wall clock).
///
/// Relative windows end at the next boundary after the last whole unit, so
/// `Hours(3)` at 10:25 covers `[07:00, 10:00)` and `Days(2)` covers the two
/// whole days before today.
pub fn resolve_window(spec: SyncWindowSpec, now: NaiveDateTime) -> Period {
    match spec {
        SyncWindowSpec::Period { start, end } => Period::new(start, end),
        SyncWindowSpec::Days(days) => {
            let first = now - Duration::days(i64::from(days));
            let last = now - Duration::days(1);
            Period::new(begin_of_day(first), begin_of_day(last) + Duration::days(1))
        }
        SyncWindowSpec::Hours(hours) => {
            let first = now - Duration::hours(i64::from(hours));
            let last = now - Duration::hours(1);
            Period::new(begin_of_hour(first), begin_of_hour(last) + Duration::hours(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_truncation() {
        assert_eq!(begin_of_hour(dt(5, 10, 25, 13)), dt(5, 10, 0, 0));
        assert_eq!(begin_of_day(dt(5, 10, 25, 13)), dt(5, 0, 0, 0));
    }

    #[test]
    fn test_hours_window() {
        let window = resolve_window(SyncWindowSpec::Hours(3), dt(5, 10, 25, 0));
        assert_eq!(window, Period::new(dt(5, 7, 0, 0), dt(5, 10, 0, 0)));
    }

    #[test]
    fn test_single_hour_window_is_previous_hour() {
        let window = resolve_window(SyncWindowSpec::Hours(1), dt(5, 0, 5, 0));
        assert_eq!(window, Period::new(dt(4, 23, 0, 0), dt(5, 0, 0, 0)));
    }

    #[test]
    fn test_days_window() {
        let window = resolve_window(SyncWindowSpec::Days(2), dt(5, 10, 25, 0));
        assert_eq!(window, Period::new(dt(3, 0, 0, 0), dt(5, 0, 0, 0)));
    }

    #[test]
    fn test_explicit_period_is_kept() {
        let spec = SyncWindowSpec::Period {
            start: dt(1, 0, 0, 0),
            end: dt(1, 2, 0, 0),
        };
        assert_eq!(
            resolve_window(spec, dt(5, 0, 0, 0)),
            Period::new(dt(1, 0, 0, 0), dt(1, 2, 0, 0))
        );
    }
}
