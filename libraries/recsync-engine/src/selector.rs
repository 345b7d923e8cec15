//! Candidate scoring
//!
//! Pure functions only. A candidate's score is its quality rate weighted by
//! how much of the target interval it covers, rounded to cents so that
//! near-equal candidates tie and the server priority order decides.

use recsync_core::types::{Period, Record, ServerId};

/// A remote record chosen to fill a target interval
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub server_id: ServerId,
    pub record: Record,
    pub score: f64,
}

/// Fraction of `target` overlapped by `candidate`, in `[0, 1]`
pub fn coverage_rate(candidate: &Period, target: &Period) -> f64 {
    let target_ms = target.duration().num_milliseconds();
    if target_ms <= 0 {
        return 0.0;
    }

    let overlap_start = candidate.start.max(target.start);
    let overlap_end = candidate.end.min(target.end);
    let overlap_ms = (overlap_end - overlap_start).num_milliseconds();

    (overlap_ms.max(0) as f64 / target_ms as f64).min(1.0)
}

/// Round to two decimals, halves away from zero for positive values
pub fn round_half_up(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// `record_rate × coverage`, rounded
pub fn comparison_score(record: &Record, target: &Period) -> f64 {
    round_half_up(record.record_rate * coverage_rate(&record.interval(), target))
}

/// Best candidate over all servers' results.
///
/// `results` must be in server priority order, each server's records in the
/// order the query returned them. Only a strictly greater score displaces
/// the current best, so ties go to the earlier server. `None` when nothing
/// scores above zero.
pub fn pick_best(results: Vec<(ServerId, Vec<Record>)>, target: &Period) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    let mut max_score = 0.0;

    for (server_id, records) in results {
        for record in records {
            let score = comparison_score(&record, target);
            if score > max_score {
                max_score = score;
                best = Some(Candidate {
                    server_id,
                    record,
                    score,
                });
            }
        }
    }

    best
}
