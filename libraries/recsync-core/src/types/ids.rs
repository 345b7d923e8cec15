//! Identifier types
//!
//! Every entity in the records database is keyed by a 64-bit integer, and
//! servers in the fleet are numbered the same way.

/// Local or remote `records.id`
pub type RecordId = i64;

/// `streams.id`, shared by every server in the fleet
pub type StreamId = i64;

/// Fleet server number (the `server_number` parameter of each server)
pub type ServerId = i64;

/// Task identifier returned by the metadata service
pub type TaskId = i64;
