//! Logic Module - Monitoring engine
//!
//! ## Architecture
//! - `state/` - State vectors and the bounded history store
//! - `detector` - Per-sample change detection
//! - `analysis/` - Window statistics (stability, trends, anomalies)
//! - `threshold/` - Threshold sets and percentile adaptation
//! - `events` - Per-subscriber bounded event queues
//! - `session/` - Session lifecycle, sampling loop, adaptation worker

pub mod config;
pub mod error;
pub mod events;
pub mod provider;

pub mod state;
pub mod detector;
pub mod analysis;
pub mod threshold;

pub mod session;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult, ProviderError};
pub use events::{EventBus, Subscription};
pub use provider::{FnProvider, StateProvider};
pub use state::{AnalysisWindow, HistoryStore, StateVector};
pub use detector::{detect, ChangeEvent};
pub use analysis::{AnalysisReport, Anomaly, PatternAnalyzer, TrendDirection};
pub use threshold::{InitialThresholds, ThresholdAdapter, ThresholdSet};
pub use session::{MonitorHandle, MonitorStats, MonitorWarning, SessionState, WarningKind};
