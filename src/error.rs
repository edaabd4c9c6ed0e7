//! Unified error handling for the cubewatch crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`CubewatchErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use cubewatch::error::{CubewatchErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Retrying at next tick: {err}");
//!     } else {
//!         tracing::error!("Cycle failed: {err}");
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::i18n::TranslationError;
pub use crate::notifications::ChannelError;
pub use crate::scheduler::SchedulerError;
pub use crate::utils::error::{DateParseError, FetchError, StoreError};

/// Common trait for cubewatch error types
pub trait CubewatchErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Notification delivery errors
    Delivery,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Delivery => "delivery",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the cubewatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Listing or reference feed could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Listing date text could not be parsed
    #[error("Date parse error: {0}")]
    DateParse(#[from] DateParseError),

    /// Competition store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Notification delivery failure
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Translation table could not be loaded
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Scheduler setup or state errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl CubewatchErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Store(StoreError::LockPoisoned) => false,
            Self::Store(StoreError::Corrupt { .. }) => false,
            Self::Store(_) => true,
            Self::DateParse(_) | Self::Translation(_) | Self::Scheduler(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::InvalidPayload(_)) => ErrorCategory::Parsing,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::DateParse(_) => ErrorCategory::Parsing,
            Self::Store(_) => ErrorCategory::Storage,
            Self::Channel(ChannelError::InvalidConfig(_)) => ErrorCategory::Config,
            Self::Channel(_) => ErrorCategory::Delivery,
            Self::Translation(_) | Self::Scheduler(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
