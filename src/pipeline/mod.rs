//! Monitoring pipeline: diffing and cycle orchestration

pub mod cycle;
pub mod diff;

pub use cycle::{CycleReport, Monitor, MonitorOptions, QueryOutcome};
pub use diff::diff;
