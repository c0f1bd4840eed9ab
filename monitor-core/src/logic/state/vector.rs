//! State Vector - One timestamped sample of named scalar dimensions
//!
//! Snapshots are immutable once built: fields are private and only readable
//! through accessors. The dimension set of a session is fixed by its first
//! accepted sample (see `dimension_mismatch`).

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::{MonitorError, MonitorResult};

// ============================================================================
// STATE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    timestamp: DateTime<Utc>,
    dims: BTreeMap<String, f64>,
}

impl StateVector {
    pub fn new(timestamp: DateTime<Utc>, dims: BTreeMap<String, f64>) -> Self {
        Self { timestamp, dims }
    }

    /// Build a snapshot stamped with the given time
    pub fn at<I, K>(timestamp: DateTime<Utc>, dims: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            timestamp,
            dims: dims.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build a snapshot stamped with `Utc::now()`
    pub fn now<I, K>(dims: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::at(Utc::now(), dims)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn dims(&self) -> &BTreeMap<String, f64> {
        &self.dims
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.dims.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dims.keys().map(String::as_str)
    }

    pub fn same_dimensions(&self, other: &StateVector) -> bool {
        self.dims.keys().eq(other.dims.keys())
    }

    /// Reject empty snapshots and non-finite values
    pub fn validate(&self) -> MonitorResult<()> {
        if self.dims.is_empty() {
            return Err(MonitorError::InvalidStateVector(
                "snapshot has no dimensions".to_string(),
            ));
        }

        if let Some((name, value)) = self.dims.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MonitorError::InvalidStateVector(format!(
                "dimension '{}' has non-finite value {}",
                name, value
            )));
        }

        Ok(())
    }

    /// Convert to JSON for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339(),
            "dims": self.dims,
        })
    }
}

/// Describe how `actual`'s dimension set differs from `expected`'s.
///
/// Returns `None` when both carry exactly the same names.
pub fn dimension_mismatch(expected: &StateVector, actual: &StateVector) -> Option<String> {
    if expected.same_dimensions(actual) {
        return None;
    }

    let missing: Vec<&str> = expected
        .dimension_names()
        .filter(|name| !actual.dims.contains_key(*name))
        .collect();
    let unexpected: Vec<&str> = actual
        .dimension_names()
        .filter(|name| !expected.dims.contains_key(*name))
        .collect();

    Some(format!(
        "dimension set mismatch (missing: {:?}, unexpected: {:?})",
        missing, unexpected
    ))
}
