use chrono::NaiveDateTime;
use recsync_core::types::{Period, ServerId, StreamId, StreamType, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of processing one problem record or gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// A better record was imported (or would be, in a dry run)
    Updated,
    /// Nothing to do: already imported, similar record present, or the
    /// item was superseded earlier in the run
    NoNeed,
    /// No remote server offered a usable candidate
    NoFind,
    /// The payload copy failed; left for a later run
    NoSuccess,
}

impl ImportOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportOutcome::Updated => "updated",
            ImportOutcome::NoNeed => "no_need",
            ImportOutcome::NoFind => "no_find",
            ImportOutcome::NoSuccess => "no_success",
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running counters of item outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTally {
    pub updated: usize,
    pub no_need: usize,
    pub no_find: usize,
    pub no_success: usize,
}

impl SyncTally {
    pub fn record(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Updated => self.updated += 1,
            ImportOutcome::NoNeed => self.no_need += 1,
            ImportOutcome::NoFind => self.no_find += 1,
            ImportOutcome::NoSuccess => self.no_success += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.updated + self.no_need + self.no_find + self.no_success
    }
}

/// Orchestrator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Init,
    ResolveOrder,
    ProcessProblems,
    ProcessGaps,
    Report,
    Done,
}

/// Progress snapshot sent while a run is in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub total_items: usize,
    pub processed_items: usize,
    pub tally: SyncTally,
    pub current_item: Option<String>,
    pub percentage: f64,
}

/// Summary of a finished (or cancelled) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub local_server: ServerId,
    pub task_id: Option<TaskId>,
    pub window: Period,
    pub stream_id: Option<StreamId>,
    pub stream_type: StreamType,
    pub sync: bool,
    pub add_mode: bool,
    pub processed_items: usize,
    pub tally: SyncTally,
    pub cancelled: bool,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub elapsed_ms: u64,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stream = self
            .stream_id
            .map_or_else(|| "all".to_string(), |id| id.to_string());
        let task = self
            .task_id
            .map_or_else(|| "none".to_string(), |id| id.to_string());

        writeln!(f, "local_server      = {}", self.local_server)?;
        writeln!(f, "task_id           = {}", task)?;
        writeln!(f, "window            = {}", self.window)?;
        writeln!(f, "stream_id         = {}", stream)?;
        writeln!(f, "stream_type       = {}", self.stream_type)?;
        writeln!(f, "sync_mode         = {}", self.sync)?;
        writeln!(f, "add_mode          = {}", self.add_mode)?;
        writeln!(f)?;
        writeln!(f, "Processed items   = {}", self.processed_items)?;
        writeln!(f, "Updated           = {}", self.tally.updated)?;
        writeln!(f, "No need           = {}", self.tally.no_need)?;
        writeln!(f, "Not found         = {}", self.tally.no_find)?;
        writeln!(f, "No success        = {}", self.tally.no_success)?;
        if self.cancelled {
            writeln!(f, "Cancelled before all items were processed")?;
        }
        writeln!(f)?;
        writeln!(f, "Started  at {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Finished at {}", self.finished_at.format("%Y-%m-%d %H:%M:%S"))?;
        write!(f, "Duration    {:.1}s", self.elapsed_ms as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_each_outcome() {
        let mut tally = SyncTally::default();
        for outcome in [
            ImportOutcome::Updated,
            ImportOutcome::Updated,
            ImportOutcome::NoNeed,
            ImportOutcome::NoFind,
            ImportOutcome::NoSuccess,
        ] {
            tally.record(outcome);
        }

        assert_eq!(
            tally,
            SyncTally {
                updated: 2,
                no_need: 1,
                no_find: 1,
                no_success: 1,
            }
        );
        assert_eq!(tally.total(), 5);
    }
}
