/// Core error types for record sync
use crate::types::ServerId;
use thiserror::Error;

/// Result type alias using `RecSyncError`
pub type Result<T> = std::result::Result<T, RecSyncError>;

/// Core error type shared by every capability implementation
#[derive(Error, Debug)]
pub enum RecSyncError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A remote server query failed or the server is unreachable
    #[error("Remote server {server_id} error: {message}")]
    Remote {
        /// Remote server identifier
        server_id: ServerId,
        /// Failure description
        message: String,
    },

    /// File transfer errors
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl RecSyncError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a remote error for the given server
    pub fn remote(server_id: ServerId, msg: impl Into<String>) -> Self {
        Self::Remote {
            server_id,
            message: msg.into(),
        }
    }

    /// Create a transfer error
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for RecSyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
