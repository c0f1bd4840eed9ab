//! Central Configuration Constants
//!
//! Single source of truth for all engine defaults.
//! `MonitorConfig::default()` and `MonitorConfig::from_env()` read from here.

/// Default sampling interval (10 ms = 100 Hz)
pub const DEFAULT_SAMPLING_INTERVAL_MS: u64 = 10;

/// Default number of snapshots kept in the history ring buffer
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default analysis window size (samples)
pub const DEFAULT_ANALYSIS_WINDOW: usize = 100;

/// Default adaptation sensitivity, in (0, 1]
///
/// Thresholds are set to the (1 - sensitivity) percentile of observed deltas.
pub const DEFAULT_SENSITIVITY: f64 = 0.1;

/// Default adaptation cadence (accepted samples between adaptation cycles)
pub const DEFAULT_ADAPTATION_CADENCE: u64 = 100;

/// Default z-score above which a sample is flagged as anomalous
pub const DEFAULT_ANOMALY_Z_THRESHOLD: f64 = 3.0;

/// Default stability sensitivity scale
pub const DEFAULT_STABILITY_SCALE: f64 = 10.0;

/// Lowest value an adapted per-dimension threshold may take
pub const DEFAULT_THRESHOLD_FLOOR: f64 = 1e-3;

/// composite = multiplier * max(per_dim)
pub const DEFAULT_COMPOSITE_MULTIPLIER: f64 = 1.5;

/// Per-dimension threshold used before the first adaptation cycle
pub const DEFAULT_DIM_THRESHOLD: f64 = 0.05;

/// Prediction horizon, in sampling intervals
pub const DEFAULT_PREDICTION_HORIZON: f64 = 1.0;

/// |slope| at or below this is reported as a stable trend
pub const DEFAULT_TREND_TOLERANCE: f64 = 1e-3;

/// Pending notifications kept per subscriber before the oldest is dropped
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

/// Upper bound on a single state provider call
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 50;

/// Backoff cap, as a multiple of the sampling interval
pub const DEFAULT_MAX_BACKOFF_FACTOR: u32 = 5;

/// Minimum spacing between two warnings of the same kind
pub const DEFAULT_WARNING_MIN_INTERVAL_MS: u64 = 1000;

/// Prefix for all environment overrides
pub const ENV_PREFIX: &str = "STATE_MONITOR_";
