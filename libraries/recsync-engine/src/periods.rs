//! Interval algebra over recorded coverage
//!
//! Coverage for one stream is merged from its approved records, clipped to
//! the sync window, and complemented into gaps. Gaps are then cut into
//! hour-aligned buckets so each remote query stays narrow.

use crate::window::begin_of_hour;
use chrono::{Duration, NaiveDateTime};
use recsync_core::types::Period;

/// Longest bucket: one hour plus a minute of overlap for boundary jitter
pub const BUCKET_LENGTH_MINUTES: i64 = 61;

/// Insert `[start, end)` into `periods`.
///
/// The interval is merged into the first period it overlaps or touches,
/// extending that period to the union. Otherwise it is appended. This is a
/// single scan: feeding intervals in start order keeps the set merged and
/// sorted.
pub fn merge_interval(periods: &mut Vec<Period>, start: NaiveDateTime, end: NaiveDateTime) {
    for p in periods.iter_mut() {
        if start <= p.end && p.start <= end {
            p.start = p.start.min(start);
            p.end = p.end.max(end);
            return;
        }
    }
    periods.push(Period::new(start, end));
}

/// Merge intervals into a sorted, pairwise disjoint set
pub fn merge_periods(intervals: &[Period]) -> Vec<Period> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|p| p.start);

    let mut merged = Vec::new();
    for p in sorted {
        merge_interval(&mut merged, p.start, p.end);
    }
    merged
}

/// Drop coverage ending at or before `window_start` and truncate the first
/// period straddling it. Expects `recorded` in start order.
pub fn clip_to_window(recorded: &mut Vec<Period>, window_start: NaiveDateTime) {
    while let Some(first) = recorded.first_mut() {
        if first.start >= window_start {
            break;
        }
        if first.end <= window_start {
            recorded.remove(0);
            continue;
        }
        first.start = window_start;
        break;
    }
}

/// Complement of `recorded` inside `[window_start, window_end)`.
///
/// `recorded` must be merged, sorted and clipped so nothing starts before
/// `window_start`.
pub fn derive_gaps(
    recorded: &[Period],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<Period> {
    let mut gaps = Vec::new();
    let mut push = |start: NaiveDateTime, end: NaiveDateTime| {
        if start < end {
            gaps.push(Period::new(start, end));
        }
    };

    let (Some(first), Some(last)) = (recorded.first(), recorded.last()) else {
        push(window_start, window_end);
        return gaps;
    };

    push(window_start, first.start);
    for pair in recorded.windows(2) {
        push(pair[0].end, pair[1].start);
    }
    push(last.end, window_end);

    gaps
}

/// Split a gap into hour-aligned buckets of at most
/// [`BUCKET_LENGTH_MINUTES`], clipped to the gap
pub fn bucket_gap(gap_start: NaiveDateTime, gap_end: NaiveDateTime) -> Vec<Period> {
    let mut buckets = Vec::new();
    let hours = (gap_end - gap_start).num_hours().max(0);

    for i in 0..hours + 2 {
        let hour = begin_of_hour(gap_start + Duration::hours(i));
        let start = hour.max(gap_start);
        let end = (hour + Duration::minutes(BUCKET_LENGTH_MINUTES)).min(gap_end);

        if start < end {
            buckets.push(Period::new(start, end));
        }
        if gap_end - end < Duration::seconds(1) {
            break;
        }
    }

    buckets
}

/// Bucketed gaps of one stream's coverage within the window.
///
/// `intervals` are the stream's approved record intervals, as selected from
/// up to one bucket before the window start.
pub fn non_recorded_periods(
    intervals: &[Period],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<Period> {
    let mut recorded = merge_periods(intervals);
    clip_to_window(&mut recorded, window_start);

    derive_gaps(&recorded, window_start, window_end)
        .into_iter()
        .flat_map(|gap| bucket_gap(gap.start, gap.end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn p(start: NaiveDateTime, end: NaiveDateTime) -> Period {
        Period::new(start, end)
    }

    #[test]
    fn test_merge_extends_first_overlapping_period() {
        let mut periods = vec![p(at(0, 0), at(0, 30)), p(at(1, 0), at(1, 30))];

        merge_interval(&mut periods, at(0, 20), at(0, 40));
        assert_eq!(periods, vec![p(at(0, 0), at(0, 40)), p(at(1, 0), at(1, 30))]);

        merge_interval(&mut periods, at(0, 50), at(2, 0));
        assert_eq!(periods, vec![p(at(0, 0), at(0, 40)), p(at(0, 50), at(2, 0))]);
    }

    #[test]
    fn test_merge_touching_and_contained_intervals() {
        let mut periods = vec![p(at(0, 0), at(0, 30))];

        merge_interval(&mut periods, at(0, 30), at(0, 45));
        merge_interval(&mut periods, at(0, 10), at(0, 20));
        assert_eq!(periods, vec![p(at(0, 0), at(0, 45))]);
    }

    #[test]
    fn test_merge_appends_disjoint_interval() {
        let mut periods = Vec::new();
        merge_interval(&mut periods, at(1, 0), at(2, 0));
        merge_interval(&mut periods, at(3, 0), at(4, 0));
        assert_eq!(periods.len(), 2);
    }

    #[test]
    fn test_clip_drops_and_truncates_leading_periods() {
        let mut recorded = vec![
            p(at(0, 0), at(0, 30)),
            p(at(0, 40), at(1, 20)),
            p(at(1, 30), at(2, 0)),
        ];
        clip_to_window(&mut recorded, at(1, 0));
        assert_eq!(recorded, vec![p(at(1, 0), at(1, 20)), p(at(1, 30), at(2, 0))]);
    }

    #[test]
    fn test_clip_drops_period_ending_at_window_start() {
        let mut recorded = vec![p(at(0, 0), at(1, 0)), p(at(1, 10), at(1, 20))];
        clip_to_window(&mut recorded, at(1, 0));
        assert_eq!(recorded, vec![p(at(1, 10), at(1, 20))]);
    }

    #[test]
    fn test_gaps_around_single_recording() {
        let gaps = derive_gaps(&[p(at(0, 10), at(0, 50))], at(0, 0), at(2, 0));
        assert_eq!(gaps, vec![p(at(0, 0), at(0, 10)), p(at(0, 50), at(2, 0))]);
    }

    #[test]
    fn test_no_coverage_is_one_gap() {
        assert_eq!(derive_gaps(&[], at(0, 0), at(2, 0)), vec![p(at(0, 0), at(2, 0))]);
    }

    #[test]
    fn test_coverage_past_window_end_leaves_no_trailing_gap() {
        let gaps = derive_gaps(&[p(at(1, 0), at(3, 0))], at(0, 0), at(2, 0));
        assert_eq!(gaps, vec![p(at(0, 0), at(1, 0))]);
    }

    #[test]
    fn test_bucket_aligns_to_hours_with_overlap() {
        let buckets = bucket_gap(at(0, 50), at(2, 0));
        assert_eq!(buckets, vec![p(at(0, 50), at(1, 1)), p(at(1, 0), at(2, 0))]);
    }

    #[test]
    fn test_bucket_short_gap_is_single_bucket() {
        assert_eq!(bucket_gap(at(0, 0), at(0, 10)), vec![p(at(0, 0), at(0, 10))]);
    }

    #[test]
    fn test_bucket_multi_hour_gap() {
        let buckets = bucket_gap(at(3, 15), at(6, 5));
        assert_eq!(
            buckets,
            vec![
                p(at(3, 15), at(4, 1)),
                p(at(4, 0), at(5, 1)),
                p(at(5, 0), at(6, 1)),
                p(at(6, 0), at(6, 5)),
            ]
        );
    }

    #[test]
    fn test_non_recorded_window_scenario() {
        let intervals = [p(at(0, 10), at(0, 50))];
        let gaps = non_recorded_periods(&intervals, at(0, 0), at(2, 0));

        assert_eq!(gaps[0], p(at(0, 0), at(0, 10)));
        let second: Vec<_> = gaps[1..].to_vec();
        assert!(second.len() >= 2);
        assert_eq!(second[0].start, at(0, 50));
        assert_eq!(second.last().map(|g| g.end), Some(at(2, 0)));
        for bucket in &second {
            assert!(bucket.duration() <= Duration::minutes(BUCKET_LENGTH_MINUTES));
        }
    }

    #[test]
    fn test_non_recorded_uses_coverage_started_before_window() {
        let intervals = [p(at(0, 0), at(1, 30))];
        let gaps = non_recorded_periods(&intervals, at(1, 0), at(2, 0));
        assert_eq!(gaps, vec![p(at(1, 30), at(2, 0))]);
    }
}
