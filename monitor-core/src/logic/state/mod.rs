//! State Module - Snapshots & bounded history
//!
//! - `vector.rs`: immutable `StateVector` snapshot
//! - `history.rs`: `HistoryStore` ring buffer and read-only `AnalysisWindow`

pub mod vector;
pub mod history;

pub use vector::{StateVector, dimension_mismatch};
pub use history::{HistoryStore, AnalysisWindow};
