//! Error types for the cubewatch pipeline
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Response body did not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Transient failures are worth another attempt at the next tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::ServerError(_) | Self::Timeout | Self::MaxRetriesExceeded => true,
            Self::InvalidPayload(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// Errors produced while turning listing date text into a date pair
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// Nothing left after trimming
    #[error("Empty date text")]
    Empty,

    /// Token count or separator position did not match a known layout
    #[error("Unexpected date layout: {0:?}")]
    UnexpectedLayout(String),

    /// Month token is not an English three-letter abbreviation
    #[error("Invalid month abbreviation: {0:?}")]
    InvalidMonth(String),

    /// Day or year token is not a number
    #[error("Invalid {field} value: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Components are numeric but do not form a calendar date
    #[error("Not a calendar date: {0:?}")]
    InvalidDate(String),

    /// Range crosses a month or year boundary
    #[error("Range spans more than one month or year: {0:?}")]
    CrossBoundaryRange(String),

    /// End day precedes start day
    #[error("Range ends before it starts: {0:?}")]
    ReversedRange(String),
}

/// Errors raised by the competition store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A competition with the same url is already stored
    #[error("Competition already stored: {0}")]
    DuplicateKey(String),

    /// Filesystem error while opening the database
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored column could not be decoded
    #[error("Corrupt value in column {column}: {value:?}")]
    Corrupt { column: &'static str, value: String },

    /// Connection mutex was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Check if this is the duplicate-key condition
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}
