//! Session state shared between the handle, the sampling loop and the
//! adaptation worker.

use std::sync::Arc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::stats::Counters;
use super::warnings::WarningChannel;
use crate::logic::analysis::{AnalysisReport, PatternAnalyzer};
use crate::logic::config::MonitorConfig;
use crate::logic::detector::{detect, ChangeEvent};
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::events::EventBus;
use crate::logic::state::{dimension_mismatch, AnalysisWindow, HistoryStore, StateVector};
use crate::logic::threshold::{ThresholdAdapter, ThresholdSet};

pub(crate) struct SessionShared {
    pub id: Uuid,
    pub label: String,
    pub config: MonitorConfig,
    pub history: HistoryStore,
    pub changes: EventBus<ChangeEvent>,
    pub analysis: EventBus<AnalysisReport>,
    pub warnings: WarningChannel,
    pub counters: Counters,
    /// Swapped whole; readers clone the inner `Arc` once per tick
    thresholds: RwLock<Option<Arc<ThresholdSet>>>,
    analyzer: PatternAnalyzer,
    adapter: ThresholdAdapter,
}

impl SessionShared {
    pub fn new(config: MonitorConfig) -> Self {
        let id = Uuid::new_v4();
        let label = format!("Monitor {}", &id.simple().to_string()[..8]);
        Self {
            id,
            history: HistoryStore::new(config.history_capacity),
            changes: EventBus::new(config.subscriber_capacity),
            analysis: EventBus::new(config.subscriber_capacity),
            warnings: WarningChannel::new(
                label.clone(),
                config.subscriber_capacity,
                config.warning_min_interval(),
            ),
            counters: Counters::default(),
            thresholds: RwLock::new(None),
            analyzer: PatternAnalyzer::from_config(&config),
            adapter: ThresholdAdapter::from_config(&config),
            label,
            config,
        }
    }

    pub fn thresholds(&self) -> Option<Arc<ThresholdSet>> {
        self.thresholds.read().clone()
    }

    /// Active thresholds, resolving the initial set from the first sample's
    /// dimensions if none exists yet.
    fn thresholds_for(&self, sample: &StateVector) -> MonitorResult<Arc<ThresholdSet>> {
        if let Some(current) = self.thresholds.read().as_ref() {
            return Ok(Arc::clone(current));
        }

        let mut slot = self.thresholds.write();
        if let Some(current) = slot.as_ref() {
            return Ok(Arc::clone(current));
        }

        let initial = self.config.initial_thresholds.clone().unwrap_or_default();
        let unmatched = initial.unmatched(sample.dimension_names());
        if !unmatched.is_empty() {
            log::warn!(
                "[{}] Initial thresholds configured for dimensions the state does not carry: {:?}",
                self.label,
                unmatched
            );
        }
        let resolved = Arc::new(initial.resolve(
            sample.dimension_names(),
            self.config.default_dim_threshold,
            self.config.composite_multiplier,
        )?);

        log::info!(
            "[{}] Dimension set fixed: {:?} (composite threshold {:.4})",
            self.label,
            resolved.per_dim_map().keys().collect::<Vec<_>>(),
            resolved.composite()
        );

        *slot = Some(Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Validate one sample, run detection against the last accepted sample,
    /// store it and publish the resulting `ChangeEvent`.
    ///
    /// Rejected samples leave the history untouched.
    pub fn ingest(&self, sample: StateVector) -> MonitorResult<bool> {
        sample.validate()?;

        let previous = self.history.last();
        if let Some(prev) = previous.as_deref() {
            if let Some(reason) = dimension_mismatch(prev, &sample) {
                return Err(MonitorError::InvalidStateVector(reason));
            }
            if sample.timestamp() <= prev.timestamp() {
                return Err(MonitorError::InvalidStateVector(format!(
                    "timestamp {} is not after last accepted {}",
                    sample.timestamp().to_rfc3339(),
                    prev.timestamp().to_rfc3339()
                )));
            }
        }

        let thresholds = self.thresholds_for(&sample)?;
        let mut event = detect(previous.as_deref(), &sample, &thresholds)?;
        let significant = event.significant;

        self.history.push(sample);
        event.sequence = Counters::incr(&self.counters.samples_accepted);

        if significant {
            Counters::incr(&self.counters.significant_events);
            log::debug!(
                "[{}] Significant change: magnitude {:.4}, causes {:?}",
                self.label,
                event.magnitude,
                event.causes
            );
        }

        self.changes.publish(event);
        Ok(significant)
    }

    /// One analysis + adaptation cycle over `window`.
    ///
    /// Either both the report and the new thresholds land, or neither does.
    pub fn run_adaptation_cycle(&self, window: &AnalysisWindow) {
        Counters::incr(&self.counters.analysis_cycles);

        let current = match self.thresholds() {
            Some(t) => t,
            None => return,
        };

        let result = self.analyzer.analyze(window).and_then(|report| {
            let adapted = self.adapter.adapt(window, self.config.sensitivity, &current)?;
            Ok((report, adapted))
        });

        match result {
            Ok((report, adapted)) => {
                if adapted != *current {
                    log::debug!(
                        "[{}] Thresholds adapted: composite {:.4} -> {:.4}",
                        self.label,
                        current.composite(),
                        adapted.composite()
                    );
                    *self.thresholds.write() = Some(Arc::new(adapted));
                    Counters::incr(&self.counters.threshold_updates);
                }

                log::debug!(
                    "[{}] Analysis over {} samples: stability {:.3}, {} anomalies",
                    self.label,
                    report.window_size,
                    report.stability,
                    report.anomalies.len()
                );
                self.analysis.publish(report);
            }
            Err(e) => {
                Counters::incr(&self.counters.analysis_failures);
                self.warnings.report_error(&e);
            }
        }
    }

    /// Stop all delivery
    pub fn close(&self) {
        self.changes.close();
        self.analysis.close();
        self.warnings.close();
    }
}
