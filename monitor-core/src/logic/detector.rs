//! Change Detector - Compare consecutive snapshots against a threshold set
//!
//! A change is significant when any dimension moves more than its own limit
//! OR the Euclidean norm of all deltas exceeds the composite limit.

use std::collections::{BTreeMap, BTreeSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::{MonitorError, MonitorResult};
use crate::logic::state::{dimension_mismatch, StateVector};
use crate::logic::threshold::ThresholdSet;

// ============================================================================
// CHANGE EVENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Position in the session's event stream, starting at 1; 0 when
    /// produced by `detect` outside a session
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// `None` for the first sample of a session
    pub previous: Option<StateVector>,
    pub current: StateVector,
    pub per_dim_delta: BTreeMap<String, f64>,
    /// Euclidean norm of `per_dim_delta`
    pub magnitude: f64,
    pub significant: bool,
    /// Dimensions that individually exceeded their threshold
    pub causes: BTreeSet<String>,
}

impl ChangeEvent {
    pub fn delta(&self, name: &str) -> Option<f64> {
        self.per_dim_delta.get(name).copied()
    }

    /// Convert to JSON for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "sequence": self.sequence,
            "timestamp": self.timestamp.to_rfc3339(),
            "magnitude": self.magnitude,
            "significant": self.significant,
            "causes": self.causes,
            "deltas": self.per_dim_delta,
        })
    }
}

// ============================================================================
// DETECTION
// ============================================================================

/// Compare `current` with `previous`.
///
/// Dimensions without a threshold entry never trigger individually but still
/// count toward the magnitude.
pub fn detect(
    previous: Option<&StateVector>,
    current: &StateVector,
    thresholds: &ThresholdSet,
) -> MonitorResult<ChangeEvent> {
    let previous = match previous {
        Some(p) => p,
        None => {
            return Ok(ChangeEvent {
                sequence: 0,
                timestamp: current.timestamp(),
                previous: None,
                current: current.clone(),
                per_dim_delta: BTreeMap::new(),
                magnitude: 0.0,
                significant: false,
                causes: BTreeSet::new(),
            });
        }
    };

    if let Some(reason) = dimension_mismatch(previous, current) {
        return Err(MonitorError::InvalidStateVector(reason));
    }

    let mut per_dim_delta = BTreeMap::new();
    let mut causes = BTreeSet::new();
    let mut sum_sq = 0.0;

    for (name, value) in current.dims() {
        // Both sides carry the same names after the mismatch check
        let before = previous.get(name).unwrap_or(*value);
        let delta = value - before;

        sum_sq += delta * delta;
        if let Some(limit) = thresholds.per_dim(name) {
            if delta.abs() > limit {
                causes.insert(name.clone());
            }
        }
        per_dim_delta.insert(name.clone(), delta);
    }

    let magnitude = sum_sq.sqrt();
    let significant = !causes.is_empty() || magnitude > thresholds.composite();

    Ok(ChangeEvent {
        sequence: 0,
        timestamp: current.timestamp(),
        previous: Some(previous.clone()),
        current: current.clone(),
        per_dim_delta,
        magnitude,
        significant,
        causes,
    })
}
