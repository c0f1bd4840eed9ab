//! Analysis Module - Sliding-window pattern analysis
//!
//! - `types.rs`: `AnalysisReport`, `Anomaly`, `TrendDirection`
//! - `pattern.rs`: `PatternAnalyzer`
//! - `stats.rs`: mean / stddev / OLS slope / percentile helpers

pub mod types;
pub mod pattern;
pub mod stats;

pub use types::{AnalysisReport, Anomaly, TrendDirection};
pub use pattern::PatternAnalyzer;
