//! Capability traits consumed by the sync engine
//!
//! The engine never touches connections or file systems directly. Storage,
//! remote servers, the metadata service and the file mover are injected as
//! trait objects so tests can substitute in-memory fakes.

use crate::error::Result;
use crate::types::{
    NewRecord, Record, RecordFilter, RecordId, ServerId, Stream, StreamId, StreamType, TaskId,
    TaskOutcome, TaskRegistration,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to a `records` table
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Select every record matching `filter`, in the filter's order
    async fn select_records(&self, filter: &RecordFilter) -> Result<Vec<Record>>;
}

/// The local store: read access plus the writes an import performs
#[async_trait]
pub trait RecordStore: RecordSource {
    /// Enabled streams of the given type, optionally restricted to one id
    async fn select_streams(
        &self,
        stream_type: StreamType,
        stream_id: Option<StreamId>,
    ) -> Result<Vec<Stream>>;

    /// Insert an imported record, returning the new local id
    async fn insert_record(&self, record: &NewRecord) -> Result<RecordId>;

    /// Flag the given records as no longer approved
    async fn mark_not_approved(&self, ids: &[RecordId]) -> Result<()>;

    /// Deactivate derived results referencing the given records
    async fn disable_results(&self, ids: &[RecordId]) -> Result<()>;
}

/// Registry of remote servers reachable from this one
#[async_trait]
pub trait RemoteServers: Send + Sync {
    /// Record source for `server_id`, or `None` if it is unknown or
    /// unreachable
    async fn source(&self, server_id: ServerId) -> Option<Arc<dyn RecordSource>>;
}

/// Parameter lookup and task tracking
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Value of a named parameter, if set
    async fn get_parameter(&self, key: &str) -> Result<Option<String>>;

    /// Register a task; with `check_running` an unfinished task of the same
    /// type blocks the registration
    async fn create_task(&self, task_type: &str, check_running: bool) -> Result<TaskRegistration>;

    async fn update_completion_percentage(&self, task_id: TaskId, percent: f64) -> Result<()>;

    /// Mark a task finished
    async fn finish_task(&self, task_id: TaskId, outcome: TaskOutcome) -> Result<()>;

    /// Human-readable stream name for log output
    async fn stream_name(&self, stream_id: StreamId) -> Result<String>;
}

/// Copies recording payloads between file systems
#[async_trait]
pub trait FileMover: Send + Sync {
    /// Copy every file matching `pattern` into `dest_dir`.
    ///
    /// `pattern` is a path whose final component may end with `*`. Returns
    /// the number of files copied. Existing files are kept unless
    /// `overwrite` is set; a pattern matching nothing is an error.
    async fn copy_files_matching(
        &self,
        pattern: &str,
        dest_dir: &str,
        overwrite: bool,
        verbose: bool,
    ) -> Result<usize>;
}
