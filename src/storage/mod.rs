//! Database operations for the competition store
//!
//! This module handles persistence of announced competitions in SQLite.

pub mod repository;

pub use repository::{
    create_mock_repository, create_sqlite_repository, BatchReport, CompetitionRepository,
    InsertOutcome, MockCompetitionRepository, SharedCompetitionRepository,
    SqliteCompetitionRepository, StoreResult,
};

use std::sync::Arc;

use crate::config::DatabaseConfig;

/// Path value selecting a throwaway in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Open the store described by `config`
pub fn open_store(config: &DatabaseConfig) -> StoreResult<SharedCompetitionRepository> {
    if config.sqlite_path.as_os_str() == IN_MEMORY_PATH {
        tracing::warn!("Using in-memory store, state is lost on exit");
        return Ok(Arc::new(SqliteCompetitionRepository::in_memory()?));
    }
    create_sqlite_repository(&config.sqlite_path)
}
