use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TREND DIRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Stable,
    Increasing,
    Decreasing,
}

impl TrendDirection {
    pub fn from_slope(slope: f64, tolerance: f64) -> Self {
        if slope > tolerance {
            TrendDirection::Increasing
        } else if slope < -tolerance {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }
}

// ============================================================================
// ANOMALY
// ============================================================================

/// One sample flagged by z-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Position in the analysis window (0 = oldest)
    pub index: usize,
    pub dimension: String,
    pub zscore: f64,
}

// ============================================================================
// ANALYSIS REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub window_size: usize,
    /// 1.0 = perfectly stable
    pub stability: f64,
    /// OLS slope per dimension, in value units per sample
    pub trends: BTreeMap<String, f64>,
    pub directions: BTreeMap<String, TrendDirection>,
    pub anomalies: Vec<Anomaly>,
    pub prediction: BTreeMap<String, f64>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Report for windows too small to analyze
    pub fn insufficient(window_size: usize) -> Self {
        Self {
            window_size,
            stability: 0.0,
            trends: BTreeMap::new(),
            directions: BTreeMap::new(),
            anomalies: Vec::new(),
            prediction: BTreeMap::new(),
            generated_at: Utc::now(),
        }
    }

    /// Convert to JSON for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "window_size": self.window_size,
            "stability": self.stability,
            "trends": self.trends,
            "directions": self.directions,
            "anomaly_count": self.anomalies.len(),
            "prediction": self.prediction,
            "generated_at": self.generated_at.to_rfc3339(),
        })
    }
}
