//! Periodic cycle trigger
//!
//! Drives [`Monitor::run_cycle`] on a fixed interval until stopped or until
//! the process receives Ctrl-C. A running cycle is always awaited to the end;
//! stop requests and signals that arrive mid-cycle take effect right after it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use super::error::{SchedulerError, SchedulerResult};
use crate::config::SchedulerConfig;
use crate::error::CubewatchErrorTrait;
use crate::models::Session;
use crate::pipeline::Monitor;

// ============================================================================
// Trigger Configuration
// ============================================================================

/// Configuration for the cycle trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    /// Time between two cycle starts
    pub interval: Duration,

    /// Run one cycle immediately instead of waiting a full interval
    pub run_on_startup: bool,

    /// Stop the loop on Ctrl-C
    pub handle_ctrl_c: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2 * 60 * 60),
            run_on_startup: true,
            handle_ctrl_c: true,
        }
    }
}

impl From<&SchedulerConfig> for TriggerConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            run_on_startup: config.run_on_startup,
            handle_ctrl_c: true,
        }
    }
}

impl TriggerConfig {
    /// Create a new config builder
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.interval.is_zero() {
            return Err(SchedulerError::trigger_config(
                "interval",
                "Interval must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Builder for TriggerConfig
#[derive(Debug, Default)]
pub struct TriggerConfigBuilder {
    interval: Option<Duration>,
    run_on_startup: Option<bool>,
    handle_ctrl_c: Option<bool>,
}

impl TriggerConfigBuilder {
    /// Set interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set run on startup
    pub fn run_on_startup(mut self, value: bool) -> Self {
        self.run_on_startup = Some(value);
        self
    }

    /// Set Ctrl-C handling
    pub fn handle_ctrl_c(mut self, value: bool) -> Self {
        self.handle_ctrl_c = Some(value);
        self
    }

    /// Build the config
    pub fn build(self) -> SchedulerResult<TriggerConfig> {
        let defaults = TriggerConfig::default();
        let config = TriggerConfig {
            interval: self.interval.unwrap_or(defaults.interval),
            run_on_startup: self.run_on_startup.unwrap_or(defaults.run_on_startup),
            handle_ctrl_c: self.handle_ctrl_c.unwrap_or(defaults.handle_ctrl_c),
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Trigger Events
// ============================================================================

/// Events emitted by the trigger loop
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    /// A cycle finished
    CycleCompleted {
        tick: u64,
        new: usize,
        stored: usize,
        delivered: bool,
    },

    /// A cycle was aborted; the next tick retries
    CycleFailed {
        tick: u64,
        reason: String,
        recoverable: bool,
    },

    /// The loop exited
    Stopped { cycles: u64 },
}

/// Snapshot of trigger state
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerStatus {
    pub is_running: bool,
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<String>,
}

// ============================================================================
// Cycle Trigger
// ============================================================================

/// Periodic driver for monitoring cycles
pub struct CycleTrigger {
    config: TriggerConfig,
    monitor: Arc<Monitor>,
    session: Session,
    event_sender: broadcast::Sender<TriggerEvent>,
    is_running: Arc<RwLock<bool>>,
    status: RwLock<TriggerStatus>,
    stop_signal: Notify,
}

impl CycleTrigger {
    /// Create a new cycle trigger
    pub fn new(config: TriggerConfig, monitor: Arc<Monitor>, session: Session) -> SchedulerResult<Self> {
        config.validate()?;

        let (event_sender, _) = broadcast::channel(100);

        Ok(Self {
            config,
            monitor,
            session,
            event_sender,
            is_running: Arc::new(RwLock::new(false)),
            status: RwLock::new(TriggerStatus::default()),
            stop_signal: Notify::new(),
        })
    }

    /// Subscribe to trigger events
    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.event_sender.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start the trigger loop (runs until stopped or Ctrl-C)
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if another `start` is active. Cycle failures
    /// never end the loop.
    pub async fn start(&self) -> SchedulerResult<()> {
        self.start_with_shutdown(wait_for_ctrl_c(self.config.handle_ctrl_c))
            .await
    }

    /// Start the trigger loop, ending it when `shutdown` completes
    ///
    /// `shutdown` is polled before the first cycle and kept across cycles,
    /// so a signal that fires while a cycle runs ends the loop once that
    /// cycle finishes.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if another `start` is active.
    pub async fn start_with_shutdown<F>(&self, shutdown: F) -> SchedulerResult<()>
    where
        F: Future<Output = ()>,
    {
        {
            let mut running = self.is_running.write().await;
            if *running {
                return Err(SchedulerError::AlreadyRunning);
            }
            *running = true;
        }
        self.status.write().await.is_running = true;

        tracing::info!(
            country = %self.session.country,
            locale = %self.session.locale,
            interval_secs = self.config.interval.as_secs(),
            run_on_startup = self.config.run_on_startup,
            "Scheduler started"
        );

        let start = if self.config.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.config.interval
        };
        let mut ticker = tokio::time::interval_at(start, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut tick: u64 = 0;
        while *self.is_running.read().await {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
                _ = self.stop_signal.notified() => {
                    break;
                }
                _ = ticker.tick() => {
                    tick += 1;
                    self.run_once(tick).await;
                }
            }
        }

        *self.is_running.write().await = false;
        self.status.write().await.is_running = false;
        let _ = self.event_sender.send(TriggerEvent::Stopped { cycles: tick });
        tracing::info!(cycles = tick, "Scheduler stopped");

        Ok(())
    }

    /// Stop the trigger loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.stop_signal.notify_one();
    }

    /// Check if trigger is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get trigger status
    pub async fn status(&self) -> TriggerStatus {
        self.status.read().await.clone()
    }

    // Internal: run one cycle and record its outcome
    async fn run_once(&self, tick: u64) {
        tracing::debug!(tick, "Cycle triggered");

        match self.monitor.run_cycle_now(&self.session).await {
            Ok(report) => {
                {
                    let mut status = self.status.write().await;
                    status.cycles_run += 1;
                    status.last_success = Some(Utc::now());
                }
                let _ = self.event_sender.send(TriggerEvent::CycleCompleted {
                    tick,
                    new: report.new,
                    stored: report.stored,
                    delivered: report.delivered(),
                });
            }
            Err(e) => {
                tracing::error!(
                    tick,
                    category = %e.category(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Cycle failed, retrying at next tick"
                );
                {
                    let mut status = self.status.write().await;
                    status.cycles_run += 1;
                    status.cycles_failed += 1;
                    status.last_failure = Some(e.to_string());
                }
                let _ = self.event_sender.send(TriggerEvent::CycleFailed {
                    tick,
                    reason: e.to_string(),
                    recoverable: e.is_recoverable(),
                });
            }
        }
    }
}

async fn wait_for_ctrl_c(enabled: bool) {
    if !enabled {
        return std::future::pending().await;
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
