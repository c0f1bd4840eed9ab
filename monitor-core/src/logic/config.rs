//! Monitor Configuration
//!
//! Every tunable of a monitoring session. Defaults live in `constants.rs`;
//! `from_env()` overrides them from `STATE_MONITOR_*` variables.

use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::threshold::InitialThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling period in milliseconds
    pub sampling_interval_ms: u64,

    /// Snapshots kept in the history ring buffer
    pub history_capacity: usize,

    /// Samples handed to each analysis/adaptation cycle
    pub analysis_window: usize,

    /// Adaptation sensitivity in (0, 1]
    pub sensitivity: f64,

    /// Accepted samples between adaptation cycles
    pub adaptation_cadence: u64,

    /// z-score above which a sample is anomalous
    pub anomaly_z_threshold: f64,

    /// Limits used until the first adaptation cycle
    pub initial_thresholds: Option<InitialThresholds>,

    /// stability = 1 - scale * mean step variation
    pub stability_scale: f64,

    /// Lowest adapted per-dimension threshold
    pub threshold_floor: f64,

    /// composite = multiplier * max(per_dim)
    pub composite_multiplier: f64,

    /// Limit for dimensions missing from `initial_thresholds`
    pub default_dim_threshold: f64,

    /// Prediction horizon, in sampling intervals
    pub prediction_horizon: f64,

    /// |slope| at or below this is "stable"
    pub trend_tolerance: f64,

    /// Pending notifications per subscriber
    pub subscriber_capacity: usize,

    /// Upper bound on one provider call
    pub provider_timeout_ms: u64,

    /// Backoff cap as a multiple of the sampling interval
    pub max_backoff_factor: u32,

    /// Minimum spacing of same-kind warnings
    pub warning_min_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            analysis_window: DEFAULT_ANALYSIS_WINDOW,
            sensitivity: DEFAULT_SENSITIVITY,
            adaptation_cadence: DEFAULT_ADAPTATION_CADENCE,
            anomaly_z_threshold: DEFAULT_ANOMALY_Z_THRESHOLD,
            initial_thresholds: None,
            stability_scale: DEFAULT_STABILITY_SCALE,
            threshold_floor: DEFAULT_THRESHOLD_FLOOR,
            composite_multiplier: DEFAULT_COMPOSITE_MULTIPLIER,
            default_dim_threshold: DEFAULT_DIM_THRESHOLD,
            prediction_horizon: DEFAULT_PREDICTION_HORIZON,
            trend_tolerance: DEFAULT_TREND_TOLERANCE,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            max_backoff_factor: DEFAULT_MAX_BACKOFF_FACTOR,
            warning_min_interval_ms: DEFAULT_WARNING_MIN_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            sampling_interval_ms: env_or("SAMPLING_INTERVAL_MS", d.sampling_interval_ms),
            history_capacity: env_or("HISTORY_CAPACITY", d.history_capacity),
            analysis_window: env_or("ANALYSIS_WINDOW", d.analysis_window),
            sensitivity: env_or("SENSITIVITY", d.sensitivity),
            adaptation_cadence: env_or("ADAPTATION_CADENCE", d.adaptation_cadence),
            anomaly_z_threshold: env_or("ANOMALY_Z_THRESHOLD", d.anomaly_z_threshold),
            initial_thresholds: None,
            stability_scale: env_or("STABILITY_SCALE", d.stability_scale),
            threshold_floor: env_or("THRESHOLD_FLOOR", d.threshold_floor),
            composite_multiplier: env_or("COMPOSITE_MULTIPLIER", d.composite_multiplier),
            default_dim_threshold: env_or("DEFAULT_DIM_THRESHOLD", d.default_dim_threshold),
            prediction_horizon: env_or("PREDICTION_HORIZON", d.prediction_horizon),
            trend_tolerance: env_or("TREND_TOLERANCE", d.trend_tolerance),
            subscriber_capacity: env_or("SUBSCRIBER_CAPACITY", d.subscriber_capacity),
            provider_timeout_ms: env_or("PROVIDER_TIMEOUT_MS", d.provider_timeout_ms),
            max_backoff_factor: env_or("MAX_BACKOFF_FACTOR", d.max_backoff_factor),
            warning_min_interval_ms: env_or("WARNING_MIN_INTERVAL_MS", d.warning_min_interval_ms),
        }
    }

    pub fn with_initial_thresholds(mut self, thresholds: InitialThresholds) -> Self {
        self.initial_thresholds = Some(thresholds);
        self
    }

    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn warning_min_interval(&self) -> Duration {
        Duration::from_millis(self.warning_min_interval_ms)
    }

    /// Reject configurations a session cannot run with
    pub fn validate(&self) -> MonitorResult<()> {
        if self.sampling_interval_ms == 0 {
            return Err(invalid("sampling_interval_ms must be > 0"));
        }
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity must be > 0"));
        }
        if self.analysis_window < 2 || self.analysis_window > self.history_capacity {
            return Err(invalid(format!(
                "analysis_window must be in [2, history_capacity={}] (got {})",
                self.history_capacity, self.analysis_window
            )));
        }
        if !(self.sensitivity > 0.0 && self.sensitivity <= 1.0) {
            return Err(invalid(format!(
                "sensitivity must be in (0, 1] (got {})",
                self.sensitivity
            )));
        }
        if self.adaptation_cadence == 0 {
            return Err(invalid("adaptation_cadence must be > 0"));
        }

        positive("anomaly_z_threshold", self.anomaly_z_threshold)?;
        positive("stability_scale", self.stability_scale)?;
        positive("threshold_floor", self.threshold_floor)?;
        positive("composite_multiplier", self.composite_multiplier)?;
        positive("default_dim_threshold", self.default_dim_threshold)?;
        non_negative("prediction_horizon", self.prediction_horizon)?;
        non_negative("trend_tolerance", self.trend_tolerance)?;

        if self.subscriber_capacity == 0 {
            return Err(invalid("subscriber_capacity must be > 0"));
        }
        if self.provider_timeout_ms == 0 {
            return Err(invalid("provider_timeout_ms must be > 0"));
        }
        if self.max_backoff_factor == 0 {
            return Err(invalid("max_backoff_factor must be >= 1"));
        }

        if let Some(initial) = &self.initial_thresholds {
            initial.validate()?;
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> MonitorError {
    MonitorError::InvalidConfig(msg.into())
}

fn positive(name: &str, value: f64) -> MonitorResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be > 0 (got {})", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> MonitorResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be >= 0 (got {})", name, value)))
    }
}

/// Read `STATE_MONITOR_<key>`, falling back to `default` when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(format!("{}{}", ENV_PREFIX, key)).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
