//! Record Sync Core
//!
//! Platform-agnostic types, capability traits, and error handling shared by
//! the record synchronization engine and its storage backends.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Record`, `Period`, `Stream`, `SyncRequest`
//! - **Query Description**: `RecordFilter`, a typed filter every backend can
//!   evaluate (SQL translation or in-memory matching)
//! - **Capabilities**: `RecordSource`, `RecordStore`, `RemoteServers`,
//!   `MetadataService`, `FileMover`
//! - **Error Handling**: Unified `RecSyncError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use recsync_core::types::{Period, RecordCondition, RecordFilter, RecordColumn};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(2, 0, 0).unwrap();
//! let window = Period::new(start, end);
//!
//! let filter = RecordFilter::new()
//!     .with(RecordCondition::StartedAfter(window.start))
//!     .with(RecordCondition::StartedBefore(window.end))
//!     .order_by(RecordColumn::StartedAt, false);
//! assert_eq!(filter.conditions().len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod parameters;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RecSyncError, Result};
pub use traits::{FileMover, MetadataService, RecordSource, RecordStore, RemoteServers};

pub use types::{
    NewRecord, Period, Record, RecordColumn, RecordCondition, RecordFilter, RecordFlag, RecordId,
    ServerId, Stream, StreamId, StreamType, SyncRequest, SyncWindowSpec, TaskId, TaskOutcome,
    TaskRegistration,
};
