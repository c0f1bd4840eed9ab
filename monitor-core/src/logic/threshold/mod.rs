//! Threshold Module - Detection limits & adaptation
//!
//! - `set.rs`: `ThresholdSet` (active limits) and `InitialThresholds` (config form)
//! - `adapter.rs`: `ThresholdAdapter`, percentile-based retuning from history

pub mod set;
pub mod adapter;

pub use set::{ThresholdSet, InitialThresholds};
pub use adapter::ThresholdAdapter;
