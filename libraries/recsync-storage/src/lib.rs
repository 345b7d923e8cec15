//! Record Sync Storage
//!
//! `SQLite` implementation of the record sync capabilities.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each table owns its queries (`records`, `streams`,
//!   `results`, `parameters`, `tasks`)
//! - **Typed Filters**: record reads are built from
//!   [`RecordFilter`](recsync_core::RecordFilter) with bound parameters
//! - **Capabilities**: [`LocalRecordStore`], [`SqliteMetadataService`] and
//!   [`SqliteRemoteRegistry`] implement the core traits
//!
//! # Example
//!
//! ```rust,no_run
//! use recsync_core::{RecordCondition, RecordFilter, RecordFlag, RecordSource};
//! use recsync_storage::{create_pool, run_migrations, LocalRecordStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://records.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = LocalRecordStore::new(pool);
//! let approved = store
//!     .select_records(&RecordFilter::new().with(RecordCondition::Flag(RecordFlag::Approved, true)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod metadata;
mod remote;
mod timestamps;

// Vertical slices
pub mod parameters;
pub mod records;
pub mod results;
pub mod streams;
pub mod tasks;

pub use context::{LocalRecordStore, RemoteRecordSource};
pub use error::{Result, StorageError};
pub use metadata::SqliteMetadataService;
pub use remote::SqliteRemoteRegistry;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool for the local database
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    Ok(pool)
}
