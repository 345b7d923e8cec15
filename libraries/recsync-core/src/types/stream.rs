//! Stream types
//!
//! A stream is a continuously recorded source, enabled and configured
//! independently on every server.

use super::ids::StreamId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of recorded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Audio,
    Video,
}

impl StreamType {
    /// Numeric code stored in `streams.stream_type` and `records.stream_type`
    pub fn code(self) -> i64 {
        match self {
            StreamType::Audio => 1,
            StreamType::Video => 2,
        }
    }

    /// Inverse of [`StreamType::code`]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(StreamType::Audio),
            2 => Some(StreamType::Video),
            _ => None,
        }
    }

    /// Lowercase name used in parameter keys and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            StreamType::Audio => "audio",
            StreamType::Video => "video",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(StreamType::Audio),
            "video" => Ok(StreamType::Video),
            other => Err(format!(
                "stream type must be `audio` or `video`, got `{}`",
                other
            )),
        }
    }
}

/// A row of the `streams` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,
    pub name: String,
    pub enabled: bool,
    pub stream_type: StreamType,
    /// Comma-separated server ids overriding the global import order
    pub server_import_order: Option<String>,
}
