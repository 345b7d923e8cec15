//! Test helpers and fixtures for storage integration tests
//!
//! Databases are REAL SQLite files in a temp dir (NOT in-memory) so
//! migrations, constraints and indexes behave as in production.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use recsync_core::types::*;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub pool: SqlitePool,
    pub url: String,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("records.db");
        let url = format!("sqlite://{}", db_path.display());

        let pool = recsync_storage::create_pool(&url)
            .await
            .expect("Failed to create pool");

        recsync_storage::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            url,
            _temp_dir: temp_dir,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// 2024-01-01 at the given wall-clock time
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// An approved, converted, non-imported audio record spanning `[start, end)`
pub fn sample_record(stream_id: StreamId, start: NaiveDateTime, end: NaiveDateTime) -> Record {
    Record {
        id: 0,
        stream_id,
        stream_type: StreamType::Audio,
        path: format!("./{}/{}.wav", stream_id, start.format("%Y%m%d%H%M")),
        started_at: start,
        ended_at: end,
        duration: (end - start).num_seconds() as f64 / 60.0,
        duration_recorded: (end - start).num_seconds() as f64 / 60.0,
        return_code: 0,
        url_index: 0,
        record_rate: 1.0,
        is_record_approved: true,
        processed: true,
        converted_to_mp3: true,
        converted_to_low: false,
        is_deleted: false,
        is_record_checked: false,
        is_preprocessed: false,
        imported_record_id: None,
        imported_source_id: None,
        sampling_rate: 16000,
        frame_width: 0,
        shape: String::new(),
        fps: 0.0,
        frame_step: 0.0,
        v_shape: String::new(),
    }
}

/// Insert a record row verbatim (the `id` field is ignored)
pub async fn insert_record_row(pool: &SqlitePool, r: &Record) -> RecordId {
    let result = sqlx::query(
        "INSERT INTO records (
            stream_id, stream_type, path, started_at, ended_at, duration, duration_recorded,
            return_code, url_index, record_rate, is_record_approved, processed,
            converted_to_mp3, converted_to_low, is_deleted, is_record_checked, is_preprocessed,
            imported_record_id, imported_source_id,
            sampling_rate, frame_width, shape, fps, frame_step, v_shape
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(r.stream_id)
    .bind(r.stream_type.code())
    .bind(r.path.as_str())
    .bind(r.started_at.and_utc().timestamp())
    .bind(r.ended_at.and_utc().timestamp())
    .bind(r.duration)
    .bind(r.duration_recorded)
    .bind(r.return_code)
    .bind(r.url_index)
    .bind(r.record_rate)
    .bind(r.is_record_approved)
    .bind(r.processed)
    .bind(r.converted_to_mp3)
    .bind(r.converted_to_low)
    .bind(r.is_deleted)
    .bind(r.is_record_checked)
    .bind(r.is_preprocessed)
    .bind(r.imported_record_id)
    .bind(r.imported_source_id)
    .bind(r.sampling_rate)
    .bind(r.frame_width)
    .bind(r.shape.as_str())
    .bind(r.fps)
    .bind(r.frame_step)
    .bind(r.v_shape.as_str())
    .execute(pool)
    .await
    .expect("Failed to insert record");

    result.last_insert_rowid()
}

/// Insert a result row for a record, returning its id
pub async fn insert_result_row(pool: &SqlitePool, record_id: RecordId) -> i64 {
    sqlx::query("INSERT INTO results (record_id, is_approved, active_status) VALUES (?, 1, 1)")
        .bind(record_id)
        .execute(pool)
        .await
        .expect("Failed to insert result")
        .last_insert_rowid()
}

/// Shift a time by whole seconds
pub fn plus_secs(t: NaiveDateTime, secs: i64) -> NaiveDateTime {
    t + Duration::seconds(secs)
}
