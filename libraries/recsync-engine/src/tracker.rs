//! Imports already performed, by remote identity
//!
//! Seeded from the local history at run start and updated in place by the
//! importer, so the same remote record is never copied twice.

use recsync_core::types::{Record, RecordId, ServerId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ImportedSet {
    by_server: HashMap<ServerId, HashSet<RecordId>>,
    superseded: HashSet<RecordId>,
}

impl ImportedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from local rows carrying import provenance. Rows without a
    /// source server or remote id are ignored.
    pub fn from_history(history: &[Record]) -> Self {
        let mut set = Self::new();
        for record in history {
            if let (Some(server_id), Some(record_id)) =
                (record.imported_source_id, record.imported_record_id)
            {
                if record_id > 0 {
                    set.insert(server_id, record_id);
                }
            }
        }
        set
    }

    pub fn contains(&self, server_id: ServerId, record_id: RecordId) -> bool {
        self.by_server
            .get(&server_id)
            .is_some_and(|ids| ids.contains(&record_id))
    }

    /// Returns `false` if the pair was already present
    pub fn insert(&mut self, server_id: ServerId, record_id: RecordId) -> bool {
        self.by_server.entry(server_id).or_default().insert(record_id)
    }

    /// Remember local records replaced during this run
    pub fn mark_superseded(&mut self, local_ids: &[RecordId]) {
        self.superseded.extend(local_ids.iter().copied());
    }

    pub fn is_superseded(&self, local_id: RecordId) -> bool {
        self.superseded.contains(&local_id)
    }

    /// Number of remote records known as imported
    pub fn len(&self) -> usize {
        self.by_server.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use recsync_core::types::StreamType;

    fn imported(source: Option<ServerId>, remote_id: Option<RecordId>) -> Record {
        let t = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Record {
            id: 1,
            stream_id: 1,
            stream_type: StreamType::Audio,
            path: String::new(),
            started_at: t,
            ended_at: t,
            duration: 0.0,
            duration_recorded: 0.0,
            return_code: 0,
            url_index: 0,
            record_rate: 1.0,
            is_record_approved: true,
            processed: false,
            converted_to_mp3: true,
            converted_to_low: false,
            is_deleted: false,
            is_record_checked: false,
            is_preprocessed: false,
            imported_record_id: remote_id,
            imported_source_id: source,
            sampling_rate: 0,
            frame_width: 0,
            shape: String::new(),
            fps: 0.0,
            frame_step: 0.0,
            v_shape: String::new(),
        }
    }

    #[test]
    fn test_history_seeds_known_imports() {
        let set = ImportedSet::from_history(&[
            imported(Some(2), Some(100)),
            imported(Some(3), Some(100)),
            imported(None, Some(5)),
            imported(Some(2), Some(0)),
        ]);

        assert!(set.contains(2, 100));
        assert!(set.contains(3, 100));
        assert!(!set.contains(2, 0));
        assert!(!set.contains(4, 100));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut set = ImportedSet::new();
        assert!(set.is_empty());
        assert!(set.insert(1, 7));
        assert!(!set.insert(1, 7));
        assert!(set.contains(1, 7));
    }

    #[test]
    fn test_superseded_ids() {
        let mut set = ImportedSet::new();
        set.mark_superseded(&[4, 5]);
        assert!(set.is_superseded(5));
        assert!(!set.is_superseded(6));
    }
}
