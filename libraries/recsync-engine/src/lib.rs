//! Record Sync Engine
//!
//! Reconciles the local `records` table of one recording server against its
//! peers. A run looks at a time window for one stream type and:
//!
//! 1. replaces *problem records* (short or poorly rated) with strictly
//!    better remote copies, then
//! 2. fills *gaps* (no approved local coverage) with the best-scoring remote
//!    record, optionally falling back to any available record (add mode).
//!
//! # Architecture
//!
//! - `periods`: merging coverage, deriving and bucketing gaps
//! - `server_order`: per-stream priority list of remote servers
//! - `scanner`: candidate queries with per-server timeouts
//! - `selector`: coverage-weighted scoring and tie-break
//! - `tracker`: remote identities already imported
//! - `importer`: copy, insert, supersede
//! - `manager`: the orchestrator, [`SyncManager`]
//!
//! Everything outside the process (databases, files, task tracking) is
//! reached through the capability traits of `recsync-core`.

mod error;
mod manager;
mod types;

pub mod importer;
pub mod periods;
pub mod scanner;
pub mod selector;
pub mod server_order;
pub mod tracker;
pub mod window;

// Public exports
pub use error::{Result, SyncError};
pub use manager::{coverage_filter, history_filter, problem_filter, SyncManager, SyncSettings};
pub use types::{ImportOutcome, SyncPhase, SyncProgress, SyncSummary, SyncTally};
