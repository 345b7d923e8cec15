//! Conversion between wall-clock times and stored INTEGER seconds

use crate::error::{Result, StorageError};
use chrono::{DateTime, NaiveDateTime};

pub(crate) fn to_stored(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp()
}

pub(crate) fn from_stored(column: &str, secs: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.naive_utc())
        .ok_or_else(|| StorageError::invalid_data(column, format!("timestamp {} out of range", secs)))
}
