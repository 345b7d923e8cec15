//! Candidate queries against remote servers
//!
//! The filter builders describe which remote records may fill a gap or
//! replace a problem record. [`CandidateScanner`] runs them with a per-server
//! timeout; a failing or slow server contributes no candidates.

use crate::window::begin_of_hour;
use chrono::Duration;
use futures::future::join_all;
use recsync_core::types::{
    Period, Record, RecordColumn, RecordCondition, RecordFilter, RecordFlag, ServerId, StreamId,
    StreamType,
};
use recsync_core::RemoteServers;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tolerance on a replacement's start and end
pub const REPLACEMENT_DELTA_SECS: i64 = 10;

/// Duration floor for a replacement never exceeds one hour
pub const MAX_DURATION_FLOOR_MINUTES: f64 = 60.0;

/// A replacement must beat the local rate by at least this much
pub const RATE_STEP: f64 = 0.001;
pub const MAX_RATE_FLOOR: f64 = 0.999;

/// Add mode accepts records ending up to this long after the hour
pub const ADD_MODE_MARGIN_MINUTES: i64 = 63;

/// Conditions every importable record satisfies
fn importable(filter: RecordFilter, stream_id: StreamId, stream_type: StreamType) -> RecordFilter {
    let filter = filter
        .with(RecordCondition::StreamIs(stream_id))
        .with(RecordCondition::Flag(RecordFlag::Approved, true))
        .with(RecordCondition::Flag(RecordFlag::ConvertedToMp3, true));

    if stream_type == StreamType::Video {
        filter.with(RecordCondition::Flag(RecordFlag::ConvertedToLow, true))
    } else {
        filter
    }
}

/// Intact records only: not deleted, clean exit
fn intact(filter: RecordFilter) -> RecordFilter {
    filter
        .with(RecordCondition::Flag(RecordFlag::Deleted, false))
        .with(RecordCondition::ReturnCodeIs(0))
        .order_by(RecordColumn::Duration, true)
        .order_by(RecordColumn::StartedAt, false)
}

/// Remote records overlapping a gap bucket
pub fn gap_filter(gap: &Period, stream_id: StreamId, stream_type: StreamType) -> RecordFilter {
    let filter = RecordFilter::new()
        .with(RecordCondition::StartedBefore(gap.end))
        .with(RecordCondition::EndedAfter(gap.start))
        .with(RecordCondition::StartedAtOrAfter(begin_of_hour(gap.start)));

    intact(importable(filter, stream_id, stream_type))
}

/// Remote records strictly better than `local` over the same interval
pub fn replacement_filter(local: &Record, stream_type: StreamType) -> RecordFilter {
    let delta = Duration::seconds(REPLACEMENT_DELTA_SECS);
    let min_duration = local.duration.min(MAX_DURATION_FLOOR_MINUTES);
    let min_rate = (local.record_rate + RATE_STEP).min(MAX_RATE_FLOOR);

    let filter = RecordFilter::new()
        .with(RecordCondition::AnyOf(vec![
            RecordCondition::StartedBefore(local.started_at + delta),
            RecordCondition::StartedBetween(local.started_at - delta, local.started_at + delta),
        ]))
        .with(RecordCondition::EffectiveEndAfter(local.ended_at - delta))
        .with(RecordCondition::DurationAbove(min_duration))
        .with(RecordCondition::RateAbove(min_rate))
        .with(RecordCondition::StartedAtOrAfter(begin_of_hour(local.started_at)));

    intact(importable(filter, local.stream_id, stream_type))
}

/// Any usable remote record within the gap's hour, for add mode
pub fn add_mode_filter(gap: &Period, stream_id: StreamId, stream_type: StreamType) -> RecordFilter {
    let hour = begin_of_hour(gap.start);

    let filter = RecordFilter::new()
        .with(RecordCondition::StartedAfter(hour))
        .with(RecordCondition::EndedBefore(hour + Duration::minutes(ADD_MODE_MARGIN_MINUTES)))
        .with(RecordCondition::DurationAbove(0.0));

    importable(filter, stream_id, stream_type).order_by(RecordColumn::StartedAt, false)
}

/// Runs candidate queries against remote servers
#[derive(Clone)]
pub struct CandidateScanner {
    remotes: Arc<dyn RemoteServers>,
    timeout: std::time::Duration,
}

impl CandidateScanner {
    pub fn new(remotes: Arc<dyn RemoteServers>, timeout: std::time::Duration) -> Self {
        Self { remotes, timeout }
    }

    /// Records on `server_id` matching `filter`; empty on error or timeout
    pub async fn scan(&self, server_id: ServerId, filter: &RecordFilter) -> Vec<Record> {
        let query = async {
            let source = self.remotes.source(server_id).await?;
            Some(source.select_records(filter).await)
        };

        match tokio::time::timeout(self.timeout, query).await {
            Ok(Some(Ok(records))) => {
                debug!(server_id, found = records.len(), "Remote query finished");
                records
            }
            Ok(Some(Err(e))) => {
                warn!(server_id, error = %e, "Remote query failed");
                Vec::new()
            }
            Ok(None) => {
                debug!(server_id, "Remote server unavailable");
                Vec::new()
            }
            Err(_) => {
                warn!(server_id, timeout = ?self.timeout, "Remote query timed out");
                Vec::new()
            }
        }
    }

    /// Query every server concurrently; results keep the order of `servers`
    pub async fn scan_all(
        &self,
        servers: &[ServerId],
        filter: &RecordFilter,
    ) -> Vec<(ServerId, Vec<Record>)> {
        let scans = servers.iter().map(|&server_id| async move {
            (server_id, self.scan(server_id, filter).await)
        });
        join_all(scans).await
    }

    /// The first server, in priority order, returning any rows
    pub async fn first_with_rows(
        &self,
        servers: &[ServerId],
        filter: &RecordFilter,
    ) -> Option<(ServerId, Vec<Record>)> {
        for &server_id in servers {
            let records = self.scan(server_id, filter).await;
            if !records.is_empty() {
                return Some((server_id, records));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn remote(start: NaiveDateTime, end: NaiveDateTime, duration: f64, rate: f64) -> Record {
        Record {
            id: 1,
            stream_id: 5,
            stream_type: StreamType::Audio,
            path: "./5/a.wav".to_string(),
            started_at: start,
            ended_at: end,
            duration,
            duration_recorded: duration,
            return_code: 0,
            url_index: 0,
            record_rate: rate,
            is_record_approved: true,
            processed: true,
            converted_to_mp3: true,
            converted_to_low: false,
            is_deleted: false,
            is_record_checked: false,
            is_preprocessed: false,
            imported_record_id: None,
            imported_source_id: None,
            sampling_rate: 0,
            frame_width: 0,
            shape: String::new(),
            fps: 0.0,
            frame_step: 0.0,
            v_shape: String::new(),
        }
    }

    #[test]
    fn test_gap_filter_accepts_overlap_within_hour() {
        let gap = Period::new(at(1, 10, 0), at(1, 50, 0));
        let filter = gap_filter(&gap, 5, StreamType::Audio);

        assert!(filter.matches(&remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.5)));
        // Started in the previous hour
        assert!(!filter.matches(&remote(at(0, 59, 0), at(2, 0, 0), 61.0, 0.5)));
        // Ends before the gap
        assert!(!filter.matches(&remote(at(1, 0, 0), at(1, 10, 0), 10.0, 1.0)));

        let mut deleted = remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.5);
        deleted.is_deleted = true;
        assert!(!filter.matches(&deleted));

        let mut failed = remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.5);
        failed.return_code = 1;
        assert!(!filter.matches(&failed));
    }

    #[test]
    fn test_video_requires_low_conversion() {
        let gap = Period::new(at(1, 10, 0), at(1, 50, 0));
        let filter = gap_filter(&gap, 5, StreamType::Video);

        let mut record = remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.5);
        assert!(!filter.matches(&record));
        record.converted_to_low = true;
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_replacement_must_be_strictly_better() {
        let local = remote(at(1, 0, 0), at(2, 0, 0), 45.0, 0.8);
        let filter = replacement_filter(&local, StreamType::Audio);

        assert!(filter.matches(&remote(at(1, 0, 5), at(2, 0, 0), 60.0, 0.9)));
        // Same rate is not better
        assert!(!filter.matches(&remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.8)));
        // Shorter is not better
        assert!(!filter.matches(&remote(at(1, 0, 0), at(2, 0, 0), 45.0, 0.9)));
        // Starts too late
        assert!(!filter.matches(&remote(at(1, 0, 11), at(2, 0, 0), 60.0, 0.9)));
        // Recorded content ends too early
        assert!(!filter.matches(&remote(at(1, 0, 0), at(2, 0, 0), 49.0, 0.9)));
    }

    #[test]
    fn test_replacement_floors_are_capped() {
        let local = remote(at(1, 0, 0), at(2, 10, 0), 70.0, 1.0);
        let filter = replacement_filter(&local, StreamType::Audio);

        // Duration floor is 60 minutes and the rate floor 0.999
        assert!(filter.matches(&remote(at(1, 0, 0), at(2, 10, 0), 70.0, 1.0)));
        assert!(!filter.matches(&remote(at(1, 0, 0), at(2, 10, 0), 70.0, 0.999)));
    }

    #[test]
    fn test_add_mode_window_is_the_gap_hour() {
        let gap = Period::new(at(1, 20, 0), at(1, 40, 0));
        let filter = add_mode_filter(&gap, 5, StreamType::Audio);

        assert!(filter.matches(&remote(at(1, 5, 0), at(2, 2, 0), 57.0, 0.1)));
        assert!(!filter.matches(&remote(at(1, 0, 0), at(2, 0, 0), 60.0, 0.1)));
        assert!(!filter.matches(&remote(at(1, 5, 0), at(2, 3, 0), 58.0, 0.1)));
        assert!(!filter.matches(&remote(at(1, 5, 0), at(1, 50, 0), 0.0, 0.1)));
    }
}
