//! Session Module - Monitoring session lifecycle (Idle -> Active -> Stopped)
//!
//! # Architecture
//! - `shared.rs`: state owned by one session (history, thresholds, buses)
//! - `sampler.rs`: fixed-rate sampling loop + adaptation worker
//! - `backoff.rs`: provider retry backoff
//! - `warnings.rs`: rate-limited warning channel
//! - `stats.rs`: per-session counters
//!
//! Nothing here is process-global: every `MonitorHandle` owns its own state
//! and two handles never share anything mutable.

pub mod backoff;
pub mod stats;
pub mod warnings;
mod sampler;
mod shared;

use std::sync::Arc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::logic::analysis::AnalysisReport;
use crate::logic::config::MonitorConfig;
use crate::logic::detector::ChangeEvent;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::events::Subscription;
use crate::logic::provider::StateProvider;
use crate::logic::state::StateVector;
use crate::logic::threshold::ThresholdSet;

use sampler::{run_adaptation_worker, run_sampling_loop, Sampler};
use shared::SessionShared;

pub use stats::MonitorStats;
pub use warnings::{MonitorWarning, WarningKind};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Active,
    Stopped,
}

struct Lifecycle {
    state: SessionState,
    shutdown: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

// ============================================================================
// MONITOR HANDLE
// ============================================================================

pub struct MonitorHandle {
    shared: Arc<SessionShared>,
    provider: Arc<dyn StateProvider>,
    lifecycle: Mutex<Lifecycle>,
}

impl MonitorHandle {
    /// Create an idle session. Invalid configs are rejected here and no
    /// handle is created.
    pub fn new(config: MonitorConfig, provider: Arc<dyn StateProvider>) -> MonitorResult<Self> {
        config.validate()?;

        let shared = Arc::new(SessionShared::new(config));
        log::info!(
            "[{}] Session created (interval: {}ms, history: {}, window: {}, cadence: {})",
            shared.label,
            shared.config.sampling_interval_ms,
            shared.config.history_capacity,
            shared.config.analysis_window,
            shared.config.adaptation_cadence
        );

        Ok(Self {
            shared,
            provider,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Idle,
                shutdown: None,
                tasks: Vec::new(),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.lock().state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    /// Idle -> Active. Spawns the sampling loop and the adaptation worker on
    /// the current tokio runtime.
    ///
    /// Starting an active session only logs a warning.
    pub fn start(&self) -> MonitorResult<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            SessionState::Active => {
                log::warn!("[{}] Start ignored: session already active", self.shared.label);
                return Ok(());
            }
            SessionState::Stopped => return Err(MonitorError::SessionStopped),
            SessionState::Idle => {}
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::Runtime(format!("start requires a tokio runtime: {}", e)))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (adapt_tx, adapt_rx) = mpsc::channel(1);

        let sampler = Sampler::new(Arc::clone(&self.shared), adapt_tx);
        let sampling = runtime.spawn(run_sampling_loop(
            sampler,
            Arc::clone(&self.provider),
            shutdown_rx.clone(),
        ));
        let worker = runtime.spawn(run_adaptation_worker(
            Arc::clone(&self.shared),
            adapt_rx,
            shutdown_rx,
        ));

        lifecycle.tasks = vec![sampling, worker];
        lifecycle.shutdown = Some(shutdown_tx);
        lifecycle.state = SessionState::Active;

        log::info!("[{}] Monitoring started", self.shared.label);
        Ok(())
    }

    /// Active -> Stopped. Returns once both tasks have exited; no
    /// notification is delivered after this returns.
    pub async fn stop(&self) {
        let (shutdown, tasks) = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state == SessionState::Stopped {
                return;
            }
            lifecycle.state = SessionState::Stopped;
            (lifecycle.shutdown.take(), std::mem::take(&mut lifecycle.tasks))
        };

        if let Some(tx) = shutdown {
            let _ = tx.send(true);
        }

        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    log::error!("[{}] Session task panicked: {}", self.shared.label, e);
                }
            }
        }

        self.shared.close();

        let stats = self.stats();
        log::info!(
            "[{}] Monitoring stopped (ticks: {}, accepted: {}, significant: {}, adaptations: {})",
            self.shared.label,
            stats.ticks,
            stats.samples_accepted,
            stats.significant_events,
            stats.threshold_updates
        );
    }

    pub fn subscribe_changes(&self) -> Subscription<ChangeEvent> {
        self.shared.changes.subscribe()
    }

    pub fn subscribe_analysis(&self) -> Subscription<AnalysisReport> {
        self.shared.analysis.subscribe()
    }

    pub fn subscribe_warnings(&self) -> Subscription<MonitorWarning> {
        self.shared.warnings.subscribe()
    }

    /// Owned copies of the most recent `n` snapshots, newest last
    pub fn snapshot_window(&self, n: usize) -> Vec<StateVector> {
        self.shared.history.window(n).to_vec()
    }

    /// Active threshold set; `None` until the first sample arrives
    pub fn thresholds(&self) -> Option<Arc<ThresholdSet>> {
        self.shared.thresholds()
    }

    pub fn stats(&self) -> MonitorStats {
        self.shared.counters.snapshot()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let lifecycle = self.lifecycle.get_mut();
        if let Some(tx) = lifecycle.shutdown.take() {
            let _ = tx.send(true);
        }
        for task in lifecycle.tasks.drain(..) {
            task.abort();
        }
        self.shared.close();
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}
