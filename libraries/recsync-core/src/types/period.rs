//! Half-open time intervals

use super::ids::StreamId;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open interval `[start, end)`, optionally tagged with a stream.
///
/// Used both for recorded coverage and for non-recorded gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub stream_id: Option<StreamId>,
}

impl Period {
    /// Create an untagged period
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            stream_id: None,
        }
    }

    /// Tag the period with a stream
    pub fn for_stream(mut self, stream_id: StreamId) -> Self {
        self.stream_id = Some(stream_id);
        self
    }

    /// Length of the interval (negative if malformed)
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `other` shares any instant with this period
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} .. {})",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
