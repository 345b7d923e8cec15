//! `streams` table

use crate::error::{Result, StorageError};
use recsync_core::types::{Stream, StreamId, StreamType};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Stream> {
    let code: i64 = row.try_get("stream_type")?;
    let stream_type = StreamType::from_code(code)
        .ok_or_else(|| StorageError::invalid_data("stream_type", format!("unknown code {}", code)))?;

    Ok(Stream {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        enabled: row.try_get("enabled")?,
        stream_type,
        server_import_order: row.try_get("server_import_order")?,
    })
}

/// Enabled streams of a type, optionally a single one, ordered by id
pub async fn get_enabled(
    pool: &SqlitePool,
    stream_type: StreamType,
    stream_id: Option<StreamId>,
) -> Result<Vec<Stream>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, name, enabled, stream_type, server_import_order FROM streams \
         WHERE enabled = 1 AND stream_type = ",
    );
    qb.push_bind(stream_type.code());
    if let Some(id) = stream_id {
        qb.push(" AND id = ").push_bind(id);
    }
    qb.push(" ORDER BY id");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn get_name(pool: &SqlitePool, id: StreamId) -> Result<Option<String>> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM streams WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}

/// Insert or replace a stream definition
pub async fn upsert(pool: &SqlitePool, stream: &Stream) -> Result<()> {
    sqlx::query(
        "INSERT INTO streams (id, name, enabled, stream_type, server_import_order)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            enabled = excluded.enabled,
            stream_type = excluded.stream_type,
            server_import_order = excluded.server_import_order",
    )
    .bind(stream.id)
    .bind(stream.name.as_str())
    .bind(stream.enabled)
    .bind(stream.stream_type.code())
    .bind(stream.server_import_order.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}
