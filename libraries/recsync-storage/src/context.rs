use crate::{records, results, streams};
use async_trait::async_trait;
use recsync_core::types::{NewRecord, Record, RecordFilter, RecordId, ServerId, Stream, StreamId, StreamType};
use recsync_core::{RecordSource, RecordStore, Result};
use sqlx::SqlitePool;

/// The local `SQLite` record store
pub struct LocalRecordStore {
    pool: SqlitePool,
}

impl LocalRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordSource for LocalRecordStore {
    async fn select_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        Ok(records::select(&self.pool, filter).await?)
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn select_streams(
        &self,
        stream_type: StreamType,
        stream_id: Option<StreamId>,
    ) -> Result<Vec<Stream>> {
        Ok(streams::get_enabled(&self.pool, stream_type, stream_id).await?)
    }

    async fn insert_record(&self, record: &NewRecord) -> Result<RecordId> {
        Ok(records::insert(&self.pool, record).await?)
    }

    async fn mark_not_approved(&self, ids: &[RecordId]) -> Result<()> {
        records::mark_not_approved(&self.pool, ids).await?;
        Ok(())
    }

    async fn disable_results(&self, ids: &[RecordId]) -> Result<()> {
        results::disable_for_records(&self.pool, ids).await?;
        Ok(())
    }
}

/// Read-only view of another server's `records` table
pub struct RemoteRecordSource {
    server_id: ServerId,
    pool: SqlitePool,
}

impl RemoteRecordSource {
    pub fn new(server_id: ServerId, pool: SqlitePool) -> Self {
        Self { server_id, pool }
    }

    pub fn server_id(&self) -> ServerId {
        self.server_id
    }
}

#[async_trait]
impl RecordSource for RemoteRecordSource {
    async fn select_records(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        records::select(&self.pool, filter)
            .await
            .map_err(|e| recsync_core::RecSyncError::remote(self.server_id, e.to_string()))
    }
}
