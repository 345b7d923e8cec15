/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value cannot be mapped onto a domain type
    #[error("Invalid data in column {column}: {message}")]
    InvalidData { column: String, message: String },

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<StorageError> for recsync_core::RecSyncError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::storage(other.to_string()),
        }
    }
}
