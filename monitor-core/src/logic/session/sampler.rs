//! Sampling Loop & Adaptation Worker
//!
//! The sampling loop runs on a fixed-period timer. Ticks missed while the
//! provider is slow are skipped, never queued. Adaptation runs on its own
//! task, fed through a capacity-1 channel: when it is still busy the cycle
//! is dropped instead of stalling sampling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior};

use super::backoff::Backoff;
use super::shared::SessionShared;
use super::stats::Counters;
use crate::logic::error::{MonitorError, ProviderError};
use crate::logic::provider::StateProvider;
use crate::logic::state::{AnalysisWindow, StateVector};

// ============================================================================
// SAMPLER
// ============================================================================

/// Per-tick bookkeeping of the sampling loop
pub(crate) struct Sampler {
    shared: Arc<SessionShared>,
    adapt_tx: mpsc::Sender<AnalysisWindow>,
    backoff: Backoff,
    resume_at: Option<Instant>,
    since_adaptation: u64,
}

impl Sampler {
    pub fn new(shared: Arc<SessionShared>, adapt_tx: mpsc::Sender<AnalysisWindow>) -> Self {
        let backoff = Backoff::new(
            shared.config.sampling_interval(),
            shared.config.max_backoff_factor,
        );
        Self {
            shared,
            adapt_tx,
            backoff,
            resume_at: None,
            since_adaptation: 0,
        }
    }

    /// Whether the tick scheduled at `tick` should call the provider
    pub fn should_sample(&mut self, tick: Instant) -> bool {
        match self.resume_at {
            Some(at) if tick < at => {
                Counters::incr(&self.shared.counters.backoff_skipped_ticks);
                false
            }
            _ => {
                self.resume_at = None;
                true
            }
        }
    }

    pub fn on_provider_result(&mut self, tick: Instant, result: Result<StateVector, ProviderError>) {
        match result {
            Ok(sample) => {
                self.backoff.reset();
                self.on_sample(sample);
            }
            Err(e) => {
                Counters::incr(&self.shared.counters.provider_failures);
                let delay = self.backoff.record_failure();
                self.resume_at = Some(tick + delay);
                log::debug!(
                    "[{}] Provider failure #{}; next attempt in {:?}",
                    self.shared.label,
                    self.backoff.failures(),
                    delay
                );
                self.shared.warnings.report_error(&MonitorError::from(e));
            }
        }
    }

    fn on_sample(&mut self, sample: StateVector) {
        match self.shared.ingest(sample) {
            Ok(_) => {
                self.since_adaptation += 1;
                if self.since_adaptation >= self.shared.config.adaptation_cadence {
                    self.since_adaptation = 0;
                    self.dispatch_adaptation();
                }
            }
            Err(e) => {
                Counters::incr(&self.shared.counters.samples_rejected);
                self.shared.warnings.report_error(&e);
            }
        }
    }

    fn dispatch_adaptation(&self) {
        let window = self.shared.history.window(self.shared.config.analysis_window);
        match self.adapt_tx.try_send(window) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                Counters::incr(&self.shared.counters.analysis_skipped);
                log::debug!("[{}] Adaptation worker busy, cycle skipped", self.shared.label);
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

// ============================================================================
// TASKS
// ============================================================================

pub(crate) async fn run_sampling_loop(
    mut sampler: Sampler,
    provider: Arc<dyn StateProvider>,
    mut shutdown: watch::Receiver<bool>,
) {
    let shared = Arc::clone(&sampler.shared);
    let interval = shared.config.sampling_interval();
    let timeout = shared.config.provider_timeout();

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!(
        "[{}] Sampling loop started (interval: {}ms, timeout: {}ms)",
        shared.label,
        interval.as_millis(),
        timeout.as_millis()
    );

    loop {
        let tick = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            tick = ticker.tick() => tick,
        };
        if *shutdown.borrow() {
            break;
        }

        Counters::incr(&shared.counters.ticks);
        if !sampler.should_sample(tick) {
            continue;
        }

        let result = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            outcome = tokio::time::timeout(timeout, provider.get_current_state()) => {
                flatten_timeout(outcome, timeout)
            }
        };

        sampler.on_provider_result(tick, result);
    }

    log::info!("[{}] Sampling loop stopped", shared.label);
}

pub(crate) async fn run_adaptation_worker(
    shared: Arc<SessionShared>,
    mut windows: mpsc::Receiver<AnalysisWindow>,
    mut shutdown: watch::Receiver<bool>,
) {
    log::debug!("[{}] Adaptation worker started", shared.label);

    loop {
        let window = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            window = windows.recv() => match window {
                Some(w) => w,
                None => break,
            },
        };

        shared.run_adaptation_cycle(&window);
    }

    log::debug!("[{}] Adaptation worker stopped", shared.label);
}

fn flatten_timeout(
    outcome: Result<Result<StateVector, ProviderError>, tokio::time::error::Elapsed>,
    timeout: Duration,
) -> Result<StateVector, ProviderError> {
    outcome.unwrap_or(Err(ProviderError::Timeout(timeout)))
}
