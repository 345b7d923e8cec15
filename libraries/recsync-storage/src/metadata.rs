use crate::{parameters, streams, tasks};
use async_trait::async_trait;
use recsync_core::types::{StreamId, TaskId, TaskOutcome, TaskRegistration};
use recsync_core::{MetadataService, RecSyncError, Result};
use sqlx::SqlitePool;

/// Metadata service backed by the local `parameters`, `tasks` and
/// `streams` tables
pub struct SqliteMetadataService {
    pool: SqlitePool,
}

impl SqliteMetadataService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataService for SqliteMetadataService {
    async fn get_parameter(&self, key: &str) -> Result<Option<String>> {
        Ok(parameters::get(&self.pool, key).await?)
    }

    async fn create_task(&self, task_type: &str, check_running: bool) -> Result<TaskRegistration> {
        Ok(tasks::create(&self.pool, task_type, check_running).await?)
    }

    async fn update_completion_percentage(&self, task_id: TaskId, percent: f64) -> Result<()> {
        Ok(tasks::update_percentage(&self.pool, task_id, percent).await?)
    }

    async fn finish_task(&self, task_id: TaskId, outcome: TaskOutcome) -> Result<()> {
        Ok(tasks::finish(&self.pool, task_id, outcome).await?)
    }

    async fn stream_name(&self, stream_id: StreamId) -> Result<String> {
        streams::get_name(&self.pool, stream_id)
            .await?
            .ok_or_else(|| RecSyncError::not_found("Stream", stream_id.to_string()))
    }
}
