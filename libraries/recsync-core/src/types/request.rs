//! Validated parameters for one sync run

use super::ids::StreamId;
use super::stream::StreamType;
use crate::error::{RecSyncError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How the sync window is specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncWindowSpec {
    /// Explicit `[start, end)` window
    Period {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// The last N whole days, ending with yesterday
    Days(u32),
    /// The last N whole hours, ending with the previous hour
    Hours(u32),
}

/// Parameters for one sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub window: SyncWindowSpec,
    pub stream_type: StreamType,
    /// Restrict the run to a single stream
    pub stream_id: Option<StreamId>,
    /// Perform file copies and database writes (otherwise report only)
    pub sync: bool,
    /// Accept any available remote record when no scored candidate exists
    pub add_mode: bool,
    /// Skip task registration and progress tracking
    pub no_task: bool,
}

impl SyncRequest {
    /// Create a report-only request for the given window and stream type
    pub fn new(window: SyncWindowSpec, stream_type: StreamType) -> Self {
        Self {
            window,
            stream_type,
            stream_id: None,
            sync: false,
            add_mode: false,
            no_task: false,
        }
    }

    /// Check the invariants a request must hold before a run starts
    pub fn validate(&self) -> Result<()> {
        match self.window {
            SyncWindowSpec::Period { start, end } if start >= end => {
                Err(RecSyncError::invalid_input(format!(
                    "window start {} must be before end {}",
                    start, end
                )))
            }
            SyncWindowSpec::Days(0) => Err(RecSyncError::invalid_input("days must be at least 1")),
            SyncWindowSpec::Hours(0) => {
                Err(RecSyncError::invalid_input("hours must be at least 1"))
            }
            _ => Ok(()),
        }
    }
}
