//! Pattern Analyzer - Window statistics
//!
//! Stability score, per-dimension linear trend, z-score anomalies and a
//! short-horizon linear prediction over one `AnalysisWindow`.

use std::collections::BTreeMap;
use chrono::Utc;

use super::stats::{self, abs_deltas};
use super::types::{AnalysisReport, Anomaly, TrendDirection};
use crate::logic::config::MonitorConfig;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::state::AnalysisWindow;

/// Standard deviations at or below this count as "no spread"
const ZERO_SPREAD_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    stability_scale: f64,
    anomaly_z_threshold: f64,
    prediction_horizon: f64,
    trend_tolerance: f64,
}

impl PatternAnalyzer {
    pub fn new(
        stability_scale: f64,
        anomaly_z_threshold: f64,
        prediction_horizon: f64,
        trend_tolerance: f64,
    ) -> Self {
        Self {
            stability_scale,
            anomaly_z_threshold,
            prediction_horizon,
            trend_tolerance,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.stability_scale,
            config.anomaly_z_threshold,
            config.prediction_horizon,
            config.trend_tolerance,
        )
    }

    /// Analyze a window.
    ///
    /// Windows with fewer than 2 samples yield an empty report with
    /// `stability = 0`; this is not an error.
    pub fn analyze(&self, window: &AnalysisWindow) -> MonitorResult<AnalysisReport> {
        if window.len() < 2 {
            return Ok(AnalysisReport::insufficient(window.len()));
        }

        let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for name in window.dimension_names() {
            let values = window.series(&name).map_err(|index| {
                MonitorError::AnalysisFailure(format!(
                    "dimension '{}' missing at window index {}",
                    name, index
                ))
            })?;
            series.insert(name, values);
        }

        let stability = self.stability(&series, window.len())?;

        let mut trends = BTreeMap::new();
        let mut directions = BTreeMap::new();
        let mut prediction = BTreeMap::new();
        let mut anomalies = Vec::new();

        for (name, values) in &series {
            let slope = stats::ols_slope(values).unwrap_or(0.0);
            ensure_finite("trend", name, slope)?;

            let last = values[values.len() - 1];
            let predicted = last + slope * self.prediction_horizon;
            ensure_finite("prediction", name, predicted)?;

            trends.insert(name.clone(), slope);
            directions.insert(name.clone(), TrendDirection::from_slope(slope, self.trend_tolerance));
            prediction.insert(name.clone(), predicted);
            anomalies.extend(self.anomalies(name, values)?);
        }

        anomalies.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.dimension.cmp(&b.dimension)));

        Ok(AnalysisReport {
            window_size: window.len(),
            stability,
            trends,
            directions,
            anomalies,
            prediction,
            generated_at: Utc::now(),
        })
    }

    /// 1 - scale * mean per-step total variation, clamped to [0, 1]
    fn stability(&self, series: &BTreeMap<String, Vec<f64>>, len: usize) -> MonitorResult<f64> {
        let steps = (len - 1) as f64;
        let total: f64 = series
            .values()
            .map(|values| abs_deltas(values).iter().sum::<f64>())
            .sum();
        let mean_step = total / steps;

        if !mean_step.is_finite() {
            return Err(MonitorError::AnalysisFailure(format!(
                "step variation is not finite ({})",
                mean_step
            )));
        }

        Ok((1.0 - self.stability_scale * mean_step).clamp(0.0, 1.0))
    }

    fn anomalies(&self, name: &str, values: &[f64]) -> MonitorResult<Vec<Anomaly>> {
        let mean = stats::mean(values).unwrap_or(0.0);
        let std = stats::population_std(values, mean);
        ensure_finite("mean", name, mean)?;
        ensure_finite("stddev", name, std)?;

        if std <= ZERO_SPREAD_EPSILON {
            return Ok(Vec::new());
        }

        Ok(values
            .iter()
            .enumerate()
            .filter_map(|(index, v)| {
                let zscore = (v - mean).abs() / std;
                (zscore > self.anomaly_z_threshold).then(|| Anomaly {
                    index,
                    dimension: name.to_string(),
                    zscore,
                })
            })
            .collect())
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

fn ensure_finite(what: &str, name: &str, value: f64) -> MonitorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MonitorError::AnalysisFailure(format!(
            "{} for '{}' is not finite ({})",
            what, name, value
        )))
    }
}
