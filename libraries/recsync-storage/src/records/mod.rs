//! `records` table
//!
//! Every read goes through [`RecordFilter`]: conditions become a
//! parameterized `WHERE` clause, the ordering becomes `ORDER BY`.

use crate::error::{Result, StorageError};
use crate::timestamps::{from_stored, to_stored};
use recsync_core::types::{
    NewRecord, Record, RecordCondition, RecordFilter, RecordId, StreamType,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const RECORD_COLUMNS: &str = "id, stream_id, stream_type, path, started_at, ended_at, \
     duration, duration_recorded, return_code, url_index, record_rate, \
     is_record_approved, processed, converted_to_mp3, converted_to_low, is_deleted, \
     is_record_checked, is_preprocessed, imported_record_id, imported_source_id, \
     sampling_rate, frame_width, shape, fps, frame_step, v_shape";

/// End of recorded content in stored seconds, mirroring `Record::effective_end`
const EFFECTIVE_END: &str = "MIN(ended_at, started_at + duration * 60.0)";

/// Build the `SELECT` statement for a filter
pub fn build_select(filter: &RecordFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(RECORD_COLUMNS).push(" FROM records");

    for (i, condition) in filter.conditions().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(&mut qb, condition);
    }

    for (i, (column, descending)) in filter.ordering().iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(column.column());
        if *descending {
            qb.push(" DESC");
        }
    }

    qb
}

fn push_int(qb: &mut QueryBuilder<'static, Sqlite>, lhs: &str, value: i64) {
    qb.push(lhs).push_bind(value);
}

fn push_real(qb: &mut QueryBuilder<'static, Sqlite>, lhs: &str, value: f64) {
    qb.push(lhs).push_bind(value);
}

fn push_condition(qb: &mut QueryBuilder<'static, Sqlite>, condition: &RecordCondition) {
    match condition {
        RecordCondition::StartedAfter(t) => push_int(qb, "started_at > ", to_stored(*t)),
        RecordCondition::StartedBefore(t) => push_int(qb, "started_at < ", to_stored(*t)),
        RecordCondition::StartedAtOrAfter(t) => push_int(qb, "started_at >= ", to_stored(*t)),
        RecordCondition::StartedBetween(a, b) => {
            push_int(qb, "started_at BETWEEN ", to_stored(*a));
            push_int(qb, " AND ", to_stored(*b));
        }
        RecordCondition::EndedAfter(t) => push_int(qb, "ended_at > ", to_stored(*t)),
        RecordCondition::EndedBefore(t) => push_int(qb, "ended_at < ", to_stored(*t)),
        RecordCondition::EndedBetween(a, b) => {
            push_int(qb, "ended_at BETWEEN ", to_stored(*a));
            push_int(qb, " AND ", to_stored(*b));
        }
        RecordCondition::EffectiveEndAfter(t) => {
            qb.push(EFFECTIVE_END);
            push_int(qb, " > ", to_stored(*t));
        }
        RecordCondition::StreamIs(id) => push_int(qb, "stream_id = ", *id),
        RecordCondition::StreamTypeIs(stream_type) => {
            push_int(qb, "stream_type = ", stream_type.code());
        }
        RecordCondition::Flag(flag, value) => {
            qb.push(flag.column()).push(" = ").push_bind(*value);
        }
        RecordCondition::DurationAbove(v) => push_real(qb, "duration > ", *v),
        RecordCondition::DurationBelow(v) => push_real(qb, "duration < ", *v),
        RecordCondition::RateAbove(v) => push_real(qb, "record_rate > ", *v),
        RecordCondition::RateBelow(v) => push_real(qb, "record_rate < ", *v),
        RecordCondition::RateBetween(a, b) => {
            push_real(qb, "record_rate BETWEEN ", *a);
            push_real(qb, " AND ", *b);
        }
        RecordCondition::ReturnCodeIs(code) => push_int(qb, "return_code = ", *code),
        RecordCondition::ImportedFrom { source, record } => {
            push_int(qb, "(imported_source_id = ", *source);
            push_int(qb, " AND imported_record_id = ", *record);
            qb.push(")");
        }
        RecordCondition::HasImportedRecord => {
            qb.push("imported_record_id > 0");
        }
        RecordCondition::AnyOf(any) => {
            if any.is_empty() {
                qb.push("0");
                return;
            }
            qb.push("(");
            for (i, nested) in any.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_condition(qb, nested);
            }
            qb.push(")");
        }
    }
}

fn from_row(row: &SqliteRow) -> Result<Record> {
    let code: i64 = row.try_get("stream_type")?;
    let stream_type = StreamType::from_code(code)
        .ok_or_else(|| StorageError::invalid_data("stream_type", format!("unknown code {}", code)))?;

    Ok(Record {
        id: row.try_get("id")?,
        stream_id: row.try_get("stream_id")?,
        stream_type,
        path: row.try_get("path")?,
        started_at: from_stored("started_at", row.try_get("started_at")?)?,
        ended_at: from_stored("ended_at", row.try_get("ended_at")?)?,
        duration: row.try_get("duration")?,
        duration_recorded: row.try_get("duration_recorded")?,
        return_code: row.try_get("return_code")?,
        url_index: row.try_get("url_index")?,
        record_rate: row.try_get("record_rate")?,
        is_record_approved: row.try_get("is_record_approved")?,
        processed: row.try_get("processed")?,
        converted_to_mp3: row.try_get("converted_to_mp3")?,
        converted_to_low: row.try_get("converted_to_low")?,
        is_deleted: row.try_get("is_deleted")?,
        is_record_checked: row.try_get("is_record_checked")?,
        is_preprocessed: row.try_get("is_preprocessed")?,
        imported_record_id: row.try_get("imported_record_id")?,
        imported_source_id: row.try_get("imported_source_id")?,
        sampling_rate: row.try_get("sampling_rate")?,
        frame_width: row.try_get("frame_width")?,
        shape: row.try_get("shape")?,
        fps: row.try_get("fps")?,
        frame_step: row.try_get("frame_step")?,
        v_shape: row.try_get("v_shape")?,
    })
}

/// Select records matching `filter`
pub async fn select(pool: &SqlitePool, filter: &RecordFilter) -> Result<Vec<Record>> {
    let mut query = build_select(filter);
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn get_by_id(pool: &SqlitePool, id: RecordId) -> Result<Option<Record>> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
    qb.push(RECORD_COLUMNS).push(" FROM records WHERE id = ").push_bind(id);
    let row = qb.build().fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

/// Insert an imported record and return its id
pub async fn insert(pool: &SqlitePool, record: &NewRecord) -> Result<RecordId> {
    let result = sqlx::query(
        "INSERT INTO records (
            stream_id, stream_type, path, started_at, ended_at, duration, duration_recorded,
            return_code, url_index, record_rate, is_record_approved, processed,
            converted_to_mp3, converted_to_low, is_preprocessed,
            imported_record_id, imported_source_id,
            sampling_rate, frame_width, shape, fps, frame_step, v_shape
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.stream_id)
    .bind(record.stream_type.code())
    .bind(record.path.as_str())
    .bind(to_stored(record.started_at))
    .bind(to_stored(record.ended_at))
    .bind(record.duration)
    .bind(record.duration_recorded)
    .bind(record.return_code)
    .bind(record.url_index)
    .bind(record.record_rate)
    .bind(record.is_record_approved)
    .bind(record.processed)
    .bind(record.converted_to_mp3)
    .bind(record.converted_to_low)
    .bind(record.is_preprocessed)
    .bind(record.imported_record_id)
    .bind(record.imported_source_id)
    .bind(record.sampling_rate)
    .bind(record.frame_width)
    .bind(record.shape.as_str())
    .bind(record.fps)
    .bind(record.frame_step)
    .bind(record.v_shape.as_str())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Set `is_record_approved = 0` on every listed record
pub async fn mark_not_approved(pool: &SqlitePool, ids: &[RecordId]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE records SET is_record_approved = 0 WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}
