//! Periodic monitoring schedule
//!
//! This module runs the fetch → diff → notify cycle on a fixed interval.
//!
//! # Overview
//!
//! One [`CycleTrigger`] drives one [`Monitor`](crate::pipeline::Monitor) for
//! one [`Session`](crate::models::Session). On-demand queries go straight to
//! the monitor and may overlap with a scheduled cycle; the monitor serializes
//! store writes on its own.
//!
//! # Behavior
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Cycle fails (network, store) | Logged, `CycleFailed` event, next tick retries |
//! | Cycle still running at next tick | Tick delayed until the cycle ends |
//! | `stop()` or Ctrl-C while idle | Loop exits immediately |
//! | `stop()` or Ctrl-C during a cycle | Cycle finishes, then the loop exits |
//!
//! # Quick Start
//!
//! ```ignore
//! use cubewatch::scheduler::{CycleTrigger, TriggerConfig};
//!
//! let trigger = CycleTrigger::new(TriggerConfig::default(), monitor, session)?;
//! let mut events = trigger.subscribe();
//! trigger.start().await?;
//! ```

pub mod error;
pub mod trigger;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use trigger::{CycleTrigger, TriggerConfig, TriggerConfigBuilder, TriggerEvent, TriggerStatus};
