//! Property-based tests for the interval algebra and candidate scoring


use chrono::{Duration, NaiveDateTime};
use proptest::prelude::*;
use recsync_core::types::Period;
use recsync_engine::periods::{bucket_gap, derive_gaps, merge_periods, BUCKET_LENGTH_MINUTES};
use recsync_engine::selector::{comparison_score, coverage_rate, pick_best};
use test_helpers::{at, record};

const WINDOW_MINUTES: i64 = 600;

fn minute(offset: i64) -> NaiveDateTime {
    at(0, 0) + Duration::minutes(offset)
}

// ===== Strategies =====

fn arbitrary_interval() -> impl Strategy<Value = Period> {
    (0i64..WINDOW_MINUTES, 1i64..180).prop_map(|(start, len)| {
        Period::new(minute(start), minute((start + len).min(WINDOW_MINUTES)))
    })
}

fn arbitrary_intervals() -> impl Strategy<Value = Vec<Period>> {
    prop::collection::vec(arbitrary_interval(), 0..30)
}

// ===== Property Tests =====

proptest! {
    /// Property: merged periods are sorted and strictly disjoint
    #[test]
    fn merged_periods_are_sorted_and_disjoint(intervals in arbitrary_intervals()) {
        let merged = merge_periods(&intervals);

        for pair in merged.windows(2) {
            prop_assert!(pair[0].end < pair[1].start, "{} touches {}", pair[0], pair[1]);
        }
        for p in &intervals {
            prop_assert!(merged.iter().any(|m| m.start <= p.start && p.end <= m.end));
        }
    }

    /// Property: merging an already merged set changes nothing
    #[test]
    fn merge_is_idempotent(intervals in arbitrary_intervals()) {
        let merged = merge_periods(&intervals);
        prop_assert_eq!(merge_periods(&merged), merged);
    }

    /// Property: coverage and gaps tile the window exactly
    #[test]
    fn gaps_and_coverage_partition_window(intervals in arbitrary_intervals()) {
        let window_start = minute(0);
        let window_end = minute(WINDOW_MINUTES);
        let recorded = merge_periods(&intervals);
        let gaps = derive_gaps(&recorded, window_start, window_end);

        for gap in &gaps {
            prop_assert!(gap.start < gap.end);
            prop_assert!(recorded.iter().all(|r| !r.overlaps(gap)));
        }

        let mut tiles: Vec<Period> = recorded.iter().chain(gaps.iter()).copied().collect();
        tiles.sort_by_key(|p| p.start);

        prop_assert_eq!(tiles.first().map(|p| p.start), Some(window_start));
        prop_assert_eq!(tiles.last().map(|p| p.end), Some(window_end));
        for pair in tiles.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
    }

    /// Property: buckets stay inside the gap, are at most 61 minutes, and
    /// cover it without holes
    #[test]
    fn buckets_are_bounded_and_cover_gap(start in 0i64..86_400, len in 1i64..36_000) {
        let gap_start = at(0, 0) + Duration::seconds(start);
        let gap_end = gap_start + Duration::seconds(len);
        let buckets = bucket_gap(gap_start, gap_end);

        prop_assert!(!buckets.is_empty());
        for b in &buckets {
            prop_assert!(b.start >= gap_start && b.end <= gap_end);
            prop_assert!(b.start < b.end);
            prop_assert!(b.duration() <= Duration::minutes(BUCKET_LENGTH_MINUTES));
        }
        prop_assert_eq!(buckets[0].start, gap_start);
        prop_assert_eq!(buckets[buckets.len() - 1].end, gap_end);
        for pair in buckets.windows(2) {
            prop_assert!(pair[1].start <= pair[0].end);
        }
    }

    /// Property: coverage is within [0, 1]; 0 when disjoint, 1 when containing
    #[test]
    fn coverage_rate_is_bounded(a in arbitrary_interval(), b in arbitrary_interval()) {
        let rate = coverage_rate(&a, &b);

        prop_assert!((0.0..=1.0).contains(&rate));
        if !a.overlaps(&b) {
            prop_assert_eq!(rate, 0.0);
        }
        if a.start <= b.start && b.end <= a.end {
            prop_assert_eq!(rate, 1.0);
        }
    }

    /// Property: the winner holds the maximum score and no earlier server
    /// reached it
    #[test]
    fn best_candidate_is_first_at_max_score(
        candidates in prop::collection::vec(
            (arbitrary_interval(), 0u32..=100),
            1..12,
        )
    ) {
        let target = Period::new(minute(120), minute(180));
        let results: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(i, (interval, rate))| {
                let id = i as i64 + 1;
                (id, vec![record(id, interval.start, interval.end, f64::from(*rate) / 100.0)])
            })
            .collect();

        let scores: Vec<f64> = results
            .iter()
            .map(|(_, records)| comparison_score(&records[0], &target))
            .collect();
        let max = scores.iter().copied().fold(0.0, f64::max);

        match pick_best(results, &target) {
            None => prop_assert!(max <= 0.0),
            Some(best) => {
                prop_assert_eq!(best.score, max);
                let first_at_max = scores.iter().position(|s| *s == max).unwrap();
                prop_assert_eq!(best.server_id, first_at_max as i64 + 1);
            }
        }
    }
}
