use recsync_core::types::StreamType;
use recsync_core::RecSyncError;
use thiserror::Error;

/// Errors that stop a sync run before any item is processed
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing server order, server number, or processing not enabled
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Another run holds the task registration for this stream type
    #[error("Another records sync for {0} streams is running")]
    AlreadyRunning(StreamType),

    /// A capability failed at run level
    #[error(transparent)]
    Core(#[from] RecSyncError),
}

impl SyncError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
