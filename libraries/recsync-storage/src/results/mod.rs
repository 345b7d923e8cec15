//! `results` table
//!
//! Results are derived from a record. When the record is superseded its
//! results are unapproved and flagged with [`SUPERSEDED_STATUS`].

use crate::error::Result;
use recsync_core::types::RecordId;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// `active_status` of results whose record was replaced by an import
pub const SUPERSEDED_STATUS: i64 = 7;

/// Unapprove and deactivate every result of the listed records
pub async fn disable_for_records(pool: &SqlitePool, record_ids: &[RecordId]) -> Result<u64> {
    if record_ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE results SET is_approved = 0, active_status = ");
    qb.push_bind(SUPERSEDED_STATUS);
    qb.push(" WHERE record_id IN (");
    let mut separated = qb.separated(", ");
    for id in record_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let result = qb.build().execute(pool).await?;
    Ok(result.rows_affected())
}
