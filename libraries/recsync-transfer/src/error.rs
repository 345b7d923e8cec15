//! Error types for file transfer

use recsync_core::RecSyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid copy pattern: {0}")]
    InvalidPattern(String),

    #[error("No files match {0}")]
    NoMatch(String),
}

impl From<TransferError> for RecSyncError {
    fn from(err: TransferError) -> Self {
        RecSyncError::transfer(err.to_string())
    }
}
