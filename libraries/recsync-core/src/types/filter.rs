//! Typed record filter
//!
//! A backend-neutral description of a `records` query. SQL backends
//! translate it into a parameterized statement; in-memory backends evaluate
//! it with [`RecordFilter::matches`], which is the reference semantics.

use super::ids::{RecordId, ServerId, StreamId};
use super::record::Record;
use super::stream::StreamType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Boolean columns of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFlag {
    Approved,
    ConvertedToMp3,
    ConvertedToLow,
    Deleted,
    Checked,
    Processed,
}

impl RecordFlag {
    /// Column name in the `records` table
    pub fn column(self) -> &'static str {
        match self {
            RecordFlag::Approved => "is_record_approved",
            RecordFlag::ConvertedToMp3 => "converted_to_mp3",
            RecordFlag::ConvertedToLow => "converted_to_low",
            RecordFlag::Deleted => "is_deleted",
            RecordFlag::Checked => "is_record_checked",
            RecordFlag::Processed => "processed",
        }
    }

    fn value_of(self, record: &Record) -> bool {
        match self {
            RecordFlag::Approved => record.is_record_approved,
            RecordFlag::ConvertedToMp3 => record.converted_to_mp3,
            RecordFlag::ConvertedToLow => record.converted_to_low,
            RecordFlag::Deleted => record.is_deleted,
            RecordFlag::Checked => record.is_record_checked,
            RecordFlag::Processed => record.processed,
        }
    }
}

/// Columns a filter can order by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordColumn {
    Id,
    StreamId,
    StartedAt,
    EndedAt,
    Duration,
    RecordRate,
}

impl RecordColumn {
    /// Column name in the `records` table
    pub fn column(self) -> &'static str {
        match self {
            RecordColumn::Id => "id",
            RecordColumn::StreamId => "stream_id",
            RecordColumn::StartedAt => "started_at",
            RecordColumn::EndedAt => "ended_at",
            RecordColumn::Duration => "duration",
            RecordColumn::RecordRate => "record_rate",
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            RecordColumn::Id => a.id.cmp(&b.id),
            RecordColumn::StreamId => a.stream_id.cmp(&b.stream_id),
            RecordColumn::StartedAt => a.started_at.cmp(&b.started_at),
            RecordColumn::EndedAt => a.ended_at.cmp(&b.ended_at),
            RecordColumn::Duration => a.duration.total_cmp(&b.duration),
            RecordColumn::RecordRate => a.record_rate.total_cmp(&b.record_rate),
        }
    }
}

/// A single predicate over a record. Bounds are strict unless named
/// otherwise; `*Between` bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCondition {
    StartedAfter(NaiveDateTime),
    StartedBefore(NaiveDateTime),
    StartedAtOrAfter(NaiveDateTime),
    StartedBetween(NaiveDateTime, NaiveDateTime),
    EndedAfter(NaiveDateTime),
    EndedBefore(NaiveDateTime),
    EndedBetween(NaiveDateTime, NaiveDateTime),
    /// `min(ended_at, started_at + duration) > t`
    EffectiveEndAfter(NaiveDateTime),
    StreamIs(StreamId),
    StreamTypeIs(StreamType),
    Flag(RecordFlag, bool),
    DurationAbove(f64),
    DurationBelow(f64),
    RateAbove(f64),
    RateBelow(f64),
    RateBetween(f64, f64),
    ReturnCodeIs(i64),
    ImportedFrom {
        source: ServerId,
        record: RecordId,
    },
    HasImportedRecord,
    /// Disjunction of the nested conditions
    AnyOf(Vec<RecordCondition>),
}

impl RecordCondition {
    /// Evaluate the predicate against a record
    pub fn matches(&self, r: &Record) -> bool {
        match self {
            RecordCondition::StartedAfter(t) => r.started_at > *t,
            RecordCondition::StartedBefore(t) => r.started_at < *t,
            RecordCondition::StartedAtOrAfter(t) => r.started_at >= *t,
            RecordCondition::StartedBetween(a, b) => *a <= r.started_at && r.started_at <= *b,
            RecordCondition::EndedAfter(t) => r.ended_at > *t,
            RecordCondition::EndedBefore(t) => r.ended_at < *t,
            RecordCondition::EndedBetween(a, b) => *a <= r.ended_at && r.ended_at <= *b,
            RecordCondition::EffectiveEndAfter(t) => r.effective_end() > *t,
            RecordCondition::StreamIs(id) => r.stream_id == *id,
            RecordCondition::StreamTypeIs(st) => r.stream_type == *st,
            RecordCondition::Flag(flag, value) => flag.value_of(r) == *value,
            RecordCondition::DurationAbove(v) => r.duration > *v,
            RecordCondition::DurationBelow(v) => r.duration < *v,
            RecordCondition::RateAbove(v) => r.record_rate > *v,
            RecordCondition::RateBelow(v) => r.record_rate < *v,
            RecordCondition::RateBetween(a, b) => *a <= r.record_rate && r.record_rate <= *b,
            RecordCondition::ReturnCodeIs(code) => r.return_code == *code,
            RecordCondition::ImportedFrom { source, record } => {
                r.imported_source_id == Some(*source) && r.imported_record_id == Some(*record)
            }
            RecordCondition::HasImportedRecord => r.is_imported(),
            RecordCondition::AnyOf(any) => any.iter().any(|c| c.matches(r)),
        }
    }
}

/// Conjunction of conditions plus an ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    conditions: Vec<RecordCondition>,
    /// `(column, descending)` pairs, most significant first
    order: Vec<(RecordColumn, bool)>,
}

impl RecordFilter {
    /// An empty filter matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition (all conditions must hold)
    pub fn with(mut self, condition: RecordCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a condition only when `condition` is `Some`
    pub fn with_opt(self, condition: Option<RecordCondition>) -> Self {
        match condition {
            Some(c) => self.with(c),
            None => self,
        }
    }

    /// Append an ordering column
    pub fn order_by(mut self, column: RecordColumn, descending: bool) -> Self {
        self.order.push((column, descending));
        self
    }

    /// The conditions of this filter
    pub fn conditions(&self) -> &[RecordCondition] {
        &self.conditions
    }

    /// The ordering of this filter
    pub fn ordering(&self) -> &[(RecordColumn, bool)] {
        &self.order
    }

    /// Whether every condition holds for `record`
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Compare two records by this filter's ordering
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for (column, descending) in &self.order {
            let ord = column.compare(a, b);
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Select and order matching records from an in-memory collection
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
        let mut selected: Vec<Record> = records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}
