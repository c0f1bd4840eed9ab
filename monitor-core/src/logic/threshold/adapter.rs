//! Threshold Adapter - Retune limits from observed deltas
//!
//! Per dimension: collect |step delta| over the window and take the
//! `(1 - sensitivity)` percentile, raised to the floor. Higher sensitivity
//! means lower thresholds and more events.

use std::collections::BTreeMap;

use super::set::ThresholdSet;
use crate::logic::analysis::stats::{abs_deltas, percentile};
use crate::logic::config::MonitorConfig;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::state::AnalysisWindow;

#[derive(Debug, Clone)]
pub struct ThresholdAdapter {
    floor: f64,
    composite_multiplier: f64,
}

impl ThresholdAdapter {
    pub fn new(floor: f64, composite_multiplier: f64) -> Self {
        Self {
            floor,
            composite_multiplier,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.threshold_floor, config.composite_multiplier)
    }

    /// Compute a replacement for `current` from `window`.
    ///
    /// Windows with fewer than 2 samples carry no deltas; `current` is
    /// returned unchanged.
    pub fn adapt(
        &self,
        window: &AnalysisWindow,
        sensitivity: f64,
        current: &ThresholdSet,
    ) -> MonitorResult<ThresholdSet> {
        if !(sensitivity > 0.0 && sensitivity <= 1.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "sensitivity must be in (0, 1] (got {})",
                sensitivity
            )));
        }

        if window.len() < 2 {
            return Ok(current.clone());
        }

        let p = 1.0 - sensitivity;
        let mut per_dim = BTreeMap::new();

        for name in window.dimension_names() {
            let values = window.series(&name).map_err(|index| {
                MonitorError::AnalysisFailure(format!(
                    "dimension '{}' missing at window index {}",
                    name, index
                ))
            })?;

            let mut deltas = abs_deltas(&values);
            if let Some(bad) = deltas.iter().find(|d| !d.is_finite()) {
                return Err(MonitorError::AnalysisFailure(format!(
                    "delta for '{}' is not finite ({})",
                    name, bad
                )));
            }
            deltas.sort_by(f64::total_cmp);

            let value = percentile(&deltas, p).unwrap_or(self.floor).max(self.floor);
            per_dim.insert(name, value);
        }

        let adapted = ThresholdSet::derived(per_dim, self.composite_multiplier).map_err(|e| {
            MonitorError::AnalysisFailure(format!("adapted thresholds rejected: {}", e))
        })?;

        log::debug!(
            "[ThresholdAdapter] p{:.0} over {} samples -> composite {:.6}",
            p * 100.0,
            window.len(),
            adapted.composite()
        );

        Ok(adapted)
    }
}

impl Default for ThresholdAdapter {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
