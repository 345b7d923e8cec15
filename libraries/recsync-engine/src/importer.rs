//! Record import: copy the payload, insert the row, supersede what it covers
//!
//! Per-item failures never escape as errors. Each call ends in an
//! [`ImportOutcome`] and the run moves on.

use crate::tracker::ImportedSet;
use crate::types::ImportOutcome;
use chrono::Duration;
use recsync_core::types::{
    NewRecord, Record, RecordCondition, RecordFilter, RecordFlag, RecordId, ServerId,
};
use recsync_core::{FileMover, RecordStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Start/end tolerance of the similar-record check
pub const SIMILAR_DELTA_SECS: i64 = 10;
/// Quality tolerance of the similar-record check
pub const SIMILAR_RATE_DELTA: f64 = 0.01;
/// Slack when collecting local records an import covers
pub const COVERED_DELTA_SECS: i64 = 15;

/// Placeholder for the server id in a remote root template
pub const SERVER_PLACEHOLDER: &str = "{server}";

/// Record path relative to a recording root
pub fn relative_path(path: &str) -> String {
    path.replace("./", "").trim_start_matches('/').to_string()
}

/// Copy pattern for a payload: the path without extension plus `*`, so
/// every sibling artifact of the recording is included
pub fn copy_pattern(path: &Path) -> String {
    format!("{}*", path.with_extension("").display())
}

pub fn parent_dir(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

/// Recording roots of the local and remote servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub local_root: PathBuf,
    /// Mount point of a remote server's recordings, with `{server}` in place
    /// of its id
    pub remote_root_template: String,
    /// This server; its own recordings are read from `local_root`
    pub local_server: Option<ServerId>,
}

impl StoragePaths {
    pub fn new(local_root: impl Into<PathBuf>, remote_root_template: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_root_template: remote_root_template.into(),
            local_server: None,
        }
    }

    pub fn with_local_server(mut self, server_id: ServerId) -> Self {
        self.local_server = Some(server_id);
        self
    }

    pub fn root_for(&self, server_id: ServerId) -> PathBuf {
        if self.local_server == Some(server_id) {
            return self.local_root.clone();
        }
        PathBuf::from(
            self.remote_root_template
                .replace(SERVER_PLACEHOLDER, &server_id.to_string()),
        )
    }

    /// Where the payload of `record` lives on `server_id`
    pub fn source_path(&self, server_id: ServerId, record: &Record) -> PathBuf {
        self.root_for(server_id).join(relative_path(&record.path))
    }

    /// Where the payload of `record` lands locally
    pub fn destination_path(&self, record: &Record) -> PathBuf {
        self.local_root.join(relative_path(&record.path))
    }
}

/// Imports remote records into the local store
pub struct RecordImporter {
    store: Arc<dyn RecordStore>,
    mover: Arc<dyn FileMover>,
    paths: StoragePaths,
    sync: bool,
}

impl RecordImporter {
    /// With `sync` off every import is simulated: reported as updated but
    /// nothing is copied or written
    pub fn new(
        store: Arc<dyn RecordStore>,
        mover: Arc<dyn FileMover>,
        paths: StoragePaths,
        sync: bool,
    ) -> Self {
        Self {
            store,
            mover,
            paths,
            sync,
        }
    }

    /// Import `candidate` from `server_id`.
    ///
    /// `replaces` is the local record the import is meant to replace, if
    /// any. It is superseded together with every approved local record the
    /// candidate covers.
    pub async fn import(
        &self,
        tracker: &mut ImportedSet,
        server_id: ServerId,
        candidate: &Record,
        replaces: Option<RecordId>,
    ) -> ImportOutcome {
        if tracker.contains(server_id, candidate.id) {
            debug!(server_id, record_id = candidate.id, "Already imported");
            return ImportOutcome::NoNeed;
        }

        if self.has_similar(candidate).await {
            debug!(server_id, record_id = candidate.id, "Similar record present locally");
            return ImportOutcome::NoNeed;
        }

        let source = self.paths.source_path(server_id, candidate);
        let destination = self.paths.destination_path(candidate);

        if !self.sync {
            info!(
                server_id,
                record_id = candidate.id,
                source = %source.display(),
                "Would import record"
            );
            tracker.insert(server_id, candidate.id);
            return ImportOutcome::Updated;
        }

        if tracker.contains(server_id, candidate.id) || self.is_in_store(server_id, candidate).await {
            tracker.insert(server_id, candidate.id);
            return ImportOutcome::NoNeed;
        }

        let pattern = copy_pattern(&source);
        let dest_dir = parent_dir(&destination);
        match self
            .mover
            .copy_files_matching(&pattern, &dest_dir, false, true)
            .await
        {
            Ok(copied) => debug!(copied, pattern = %pattern, dest_dir = %dest_dir, "Payload copied"),
            Err(e) => {
                warn!(server_id, record_id = candidate.id, error = %e, "Copy failed");
                return ImportOutcome::NoSuccess;
            }
        }

        let mut superseded = self.covered_by(candidate).await;
        if let Some(id) = replaces {
            if !superseded.contains(&id) {
                superseded.push(id);
            }
        }

        let new_id = match self
            .store
            .insert_record(&NewRecord::imported_from(candidate, server_id))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(server_id, record_id = candidate.id, error = %e, "Insert of imported record failed");
                return ImportOutcome::NoSuccess;
            }
        };

        if !superseded.is_empty() {
            if let Err(e) = self.store.mark_not_approved(&superseded).await {
                warn!(ids = ?superseded, error = %e, "Failed to unapprove superseded records");
            }
            if let Err(e) = self.store.disable_results(&superseded).await {
                warn!(ids = ?superseded, error = %e, "Failed to disable results of superseded records");
            }
        }

        tracker.insert(server_id, candidate.id);
        tracker.mark_superseded(&superseded);

        info!(
            server_id,
            remote_id = candidate.id,
            local_id = new_id,
            superseded = ?superseded,
            "Record imported"
        );
        ImportOutcome::Updated
    }

    /// An approved local record with nearly the same interval and quality
    async fn has_similar(&self, candidate: &Record) -> bool {
        let delta = Duration::seconds(SIMILAR_DELTA_SECS);
        let filter = RecordFilter::new()
            .with(RecordCondition::StreamIs(candidate.stream_id))
            .with(RecordCondition::Flag(RecordFlag::Approved, true))
            .with(RecordCondition::StartedBetween(
                candidate.started_at - delta,
                candidate.started_at + delta,
            ))
            .with(RecordCondition::EndedBetween(
                candidate.ended_at - delta,
                candidate.ended_at + delta,
            ))
            .with(RecordCondition::RateBetween(
                candidate.record_rate - SIMILAR_RATE_DELTA,
                candidate.record_rate + SIMILAR_RATE_DELTA,
            ));

        match self.store.select_records(&filter).await {
            Ok(records) => !records.is_empty(),
            Err(e) => {
                warn!(error = %e, "Similar record check failed");
                false
            }
        }
    }

    /// Whether an approved local row already carries this provenance
    async fn is_in_store(&self, server_id: ServerId, candidate: &Record) -> bool {
        let filter = RecordFilter::new()
            .with(RecordCondition::ImportedFrom {
                source: server_id,
                record: candidate.id,
            })
            .with(RecordCondition::Flag(RecordFlag::Approved, true));

        match self.store.select_records(&filter).await {
            Ok(records) => !records.is_empty(),
            Err(e) => {
                warn!(error = %e, "Provenance check failed");
                false
            }
        }
    }

    /// Approved local records lying within the candidate's interval
    async fn covered_by(&self, candidate: &Record) -> Vec<RecordId> {
        let delta = Duration::seconds(COVERED_DELTA_SECS);
        let filter = RecordFilter::new()
            .with(RecordCondition::StreamIs(candidate.stream_id))
            .with(RecordCondition::Flag(RecordFlag::Approved, true))
            .with(RecordCondition::StartedAfter(candidate.started_at - delta))
            .with(RecordCondition::EndedBefore(candidate.ended_at + delta));

        match self.store.select_records(&filter).await {
            Ok(records) => records.iter().map(|r| r.id).collect(),
            Err(e) => {
                warn!(error = %e, "Covered records lookup failed");
                Vec::new()
            }
        }
    }
}
