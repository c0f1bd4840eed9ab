//! Threshold Set
//!
//! Per-dimension and composite limits used by the change detector.
//! A set is never mutated in place: adaptation builds a new one and the
//! session swaps it in whole.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_COMPOSITE_MULTIPLIER;
use crate::logic::error::{MonitorError, MonitorResult};

// ============================================================================
// THRESHOLD SET
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    per_dim: BTreeMap<String, f64>,
    composite: f64,
}

impl ThresholdSet {
    /// Build from per-dimension limits, deriving `composite = multiplier * max(per_dim)`
    pub fn derived(per_dim: BTreeMap<String, f64>, multiplier: f64) -> MonitorResult<Self> {
        let max = per_dim.values().copied().fold(0.0, f64::max);
        Self::with_composite(per_dim, multiplier * max)
    }

    /// Build from per-dimension limits with the default composite multiplier
    pub fn from_per_dim<I, K>(per_dim: I) -> MonitorResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let per_dim = per_dim.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::derived(per_dim, DEFAULT_COMPOSITE_MULTIPLIER)
    }

    /// Build with an explicit composite limit
    pub fn with_composite(per_dim: BTreeMap<String, f64>, composite: f64) -> MonitorResult<Self> {
        let set = Self { per_dim, composite };
        set.validate()?;
        Ok(set)
    }

    pub fn per_dim(&self, name: &str) -> Option<f64> {
        self.per_dim.get(name).copied()
    }

    pub fn per_dim_map(&self) -> &BTreeMap<String, f64> {
        &self.per_dim
    }

    pub fn composite(&self) -> f64 {
        self.composite
    }

    pub fn max_per_dim(&self) -> f64 {
        self.per_dim.values().copied().fold(0.0, f64::max)
    }

    /// All limits must be finite and strictly positive
    pub fn validate(&self) -> MonitorResult<()> {
        if self.per_dim.is_empty() {
            return Err(MonitorError::InvalidConfig(
                "threshold set has no dimensions".to_string(),
            ));
        }

        for (name, value) in &self.per_dim {
            if !(value.is_finite() && *value > 0.0) {
                return Err(MonitorError::InvalidConfig(format!(
                    "threshold for '{}' must be > 0 (got {})",
                    name, value
                )));
            }
        }

        if !(self.composite.is_finite() && self.composite > 0.0) {
            return Err(MonitorError::InvalidConfig(format!(
                "composite threshold must be > 0 (got {})",
                self.composite
            )));
        }

        Ok(())
    }
}

// ============================================================================
// INITIAL THRESHOLDS (CONFIG FORM)
// ============================================================================

/// Thresholds as configured before the dimension set is known.
///
/// `composite: None` means "derive from per_dim".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialThresholds {
    #[serde(default)]
    pub per_dim: BTreeMap<String, f64>,
    #[serde(default)]
    pub composite: Option<f64>,
}

impl InitialThresholds {
    pub fn new<I, K>(per_dim: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            per_dim: per_dim.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            composite: None,
        }
    }

    pub fn with_composite(mut self, composite: f64) -> Self {
        self.composite = Some(composite);
        self
    }

    pub fn validate(&self) -> MonitorResult<()> {
        for (name, value) in &self.per_dim {
            if !(value.is_finite() && *value > 0.0) {
                return Err(MonitorError::InvalidConfig(format!(
                    "initial threshold for '{}' must be > 0 (got {})",
                    name, value
                )));
            }
        }

        match self.composite {
            Some(c) if !(c.is_finite() && c > 0.0) => Err(MonitorError::InvalidConfig(format!(
                "initial composite threshold must be > 0 (got {})",
                c
            ))),
            _ => Ok(()),
        }
    }

    /// Configured dimensions that are not in `names`; their limits are unused
    pub fn unmatched<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: BTreeSet<&str> = names.into_iter().collect();
        self.per_dim
            .keys()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Resolve against the session's dimension set.
    ///
    /// Dimensions without a configured limit get `default_value`.
    pub fn resolve<'a, I>(&self, names: I, default_value: f64, multiplier: f64) -> MonitorResult<ThresholdSet>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let per_dim: BTreeMap<String, f64> = names
            .into_iter()
            .map(|name| {
                let value = self.per_dim.get(name).copied().unwrap_or(default_value);
                (name.to_string(), value)
            })
            .collect();

        match self.composite {
            Some(c) => ThresholdSet::with_composite(per_dim, c),
            None => ThresholdSet::derived(per_dim, multiplier),
        }
    }
}
