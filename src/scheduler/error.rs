//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Trigger configuration error
    TriggerConfigError { field: String, reason: String },

    /// `run` called while a loop is already active
    AlreadyRunning,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TriggerConfigError { field, reason } => {
                write!(f, "Invalid trigger config '{}': {}", field, reason)
            }
            Self::AlreadyRunning => write!(f, "Scheduler is already running"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create a trigger config error
    pub fn trigger_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TriggerConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
