//! Recorded segment types

use super::ids::{RecordId, ServerId, StreamId};
use super::period::Period;
use super::stream::StreamType;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One recorded segment, as stored in the `records` table of any server.
///
/// A record is *approved* while it is the authoritative source for its
/// interval. Superseded records are flagged unapproved, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub stream_id: StreamId,
    pub stream_type: StreamType,
    /// Storage path relative to the recording root (may start with `./`)
    pub path: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    /// Recorded minutes
    pub duration: f64,
    pub duration_recorded: f64,
    pub return_code: i64,
    pub url_index: i64,
    /// Signal quality / coverage in `[0, 1]`
    pub record_rate: f64,

    pub is_record_approved: bool,
    pub processed: bool,
    pub converted_to_mp3: bool,
    pub converted_to_low: bool,
    pub is_deleted: bool,
    pub is_record_checked: bool,
    pub is_preprocessed: bool,

    /// Record id on the server this row was imported from
    pub imported_record_id: Option<RecordId>,
    /// Server this row was imported from
    pub imported_source_id: Option<ServerId>,

    // Media description, copied verbatim on import
    pub sampling_rate: i64,
    pub frame_width: i64,
    pub shape: String,
    pub fps: f64,
    pub frame_step: f64,
    pub v_shape: String,
}

impl Record {
    /// The `[started_at, ended_at)` interval of this record
    pub fn interval(&self) -> Period {
        Period::new(self.started_at, self.ended_at).for_stream(self.stream_id)
    }

    /// End of the actually recorded content: the earlier of `ended_at` and
    /// `started_at + duration`.
    pub fn effective_end(&self) -> NaiveDateTime {
        let recorded_end = self.started_at + Duration::milliseconds((self.duration * 60_000.0) as i64);
        recorded_end.min(self.ended_at)
    }

    /// Whether this row was imported from another server
    pub fn is_imported(&self) -> bool {
        self.imported_record_id.is_some_and(|id| id > 0)
    }
}

/// Data for inserting a record imported from another server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub stream_id: StreamId,
    pub stream_type: StreamType,
    pub path: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub duration: f64,
    pub duration_recorded: f64,
    pub return_code: i64,
    pub url_index: i64,
    pub record_rate: f64,
    pub is_record_approved: bool,
    pub processed: bool,
    pub converted_to_mp3: bool,
    pub converted_to_low: bool,
    pub is_preprocessed: bool,
    pub imported_record_id: RecordId,
    pub imported_source_id: ServerId,
    pub sampling_rate: i64,
    pub frame_width: i64,
    pub shape: String,
    pub fps: f64,
    pub frame_step: f64,
    pub v_shape: String,
}

impl NewRecord {
    /// Build the local row for `remote`, fetched from `source_server`.
    ///
    /// The new row is approved and unprocessed, with provenance pointing at
    /// the remote row.
    pub fn imported_from(remote: &Record, source_server: ServerId) -> Self {
        Self {
            stream_id: remote.stream_id,
            stream_type: remote.stream_type,
            path: remote.path.clone(),
            started_at: remote.started_at,
            ended_at: remote.ended_at,
            duration: remote.duration,
            duration_recorded: remote.duration_recorded,
            return_code: remote.return_code,
            url_index: remote.url_index,
            record_rate: remote.record_rate,
            is_record_approved: true,
            processed: false,
            converted_to_mp3: remote.converted_to_mp3,
            converted_to_low: remote.converted_to_low,
            is_preprocessed: remote.is_preprocessed,
            imported_record_id: remote.id,
            imported_source_id: source_server,
            sampling_rate: remote.sampling_rate,
            frame_width: remote.frame_width,
            shape: remote.shape.clone(),
            fps: remote.fps,
            frame_step: remote.frame_step,
            v_shape: remote.v_shape.clone(),
        }
    }

    /// The row as it reads back after insertion under `id`
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            stream_id: self.stream_id,
            stream_type: self.stream_type,
            path: self.path,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration: self.duration,
            duration_recorded: self.duration_recorded,
            return_code: self.return_code,
            url_index: self.url_index,
            record_rate: self.record_rate,
            is_record_approved: self.is_record_approved,
            processed: self.processed,
            converted_to_mp3: self.converted_to_mp3,
            converted_to_low: self.converted_to_low,
            is_deleted: false,
            is_record_checked: false,
            is_preprocessed: self.is_preprocessed,
            imported_record_id: Some(self.imported_record_id),
            imported_source_id: Some(self.imported_source_id),
            sampling_rate: self.sampling_rate,
            frame_width: self.frame_width,
            shape: self.shape,
            fps: self.fps,
            frame_step: self.frame_step,
            v_shape: self.v_shape,
        }
    }
}
