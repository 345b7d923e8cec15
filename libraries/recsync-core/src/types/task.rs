//! Task registration types used by the metadata service

use super::ids::TaskId;
use serde::{Deserialize, Serialize};

/// Result of asking the metadata service to register a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRegistration {
    Created(TaskId),
    /// Another task of the same type holds the registration
    AlreadyRunning,
}

/// How a registered task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl TaskOutcome {
    /// Status string persisted for the task
    pub fn as_str(self) -> &'static str {
        match self {
            TaskOutcome::Completed => "completed",
            TaskOutcome::Cancelled => "cancelled",
            TaskOutcome::Failed => "failed",
        }
    }
}
