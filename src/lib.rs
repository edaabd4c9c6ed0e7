//! cubewatch - WCA competition notifier
//!
//! Periodically scrapes the World Cube Association competition listing for a
//! country, diffs it against the competitions already announced, and posts
//! the new ones to a chat webhook.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Country resolution and listing fetch with rate limiting
//! - [`parser`] - Listing HTML extraction and date-range parsing
//! - [`models`] - Core data structures and types
//! - [`storage`] - Persisted set of announced competitions (SQLite)
//! - [`pipeline`] - Diffing and the fetch → diff → notify cycle
//! - [`notifications`] - Message formatting, pagination and delivery channels
//! - [`scheduler`] - Periodic cycle trigger
//! - [`i18n`] - Translation table
//! - [`cache`] - TTL cache for reference data
//! - [`utils`] - Common utilities and domain errors
//!
//! # Example
//!
//! ```no_run
//! use cubewatch::config::Config;
//! use cubewatch::crawler::Crawler;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let crawler = Crawler::new(&config)?;
//!     let (resolution, competitions) = crawler.fetch_current("CL").await?;
//!     println!("{}: {} competitions", resolution.display_name(), competitions.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod i18n;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod pipeline;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{Crawler, Resolution};
    pub use crate::error::{CubewatchErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Competition, CountryReference, Session};
    pub use crate::notifications::{Channel, NotificationFormatter, Outbound};
    pub use crate::pipeline::{CycleReport, Monitor, QueryOutcome};
    pub use crate::storage::{CompetitionRepository, SharedCompetitionRepository};
}

// Direct re-exports for convenience
pub use models::{Competition, Session};
