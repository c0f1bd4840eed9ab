//! State Monitor Core - Real-time state sampling & adaptive change detection
//!
//! A `MonitorHandle` samples a caller-supplied `StateProvider` at a fixed
//! rate, keeps a bounded history, flags significant changes against a
//! threshold set and periodically re-fits those thresholds from recent
//! history. Change events, analysis reports and warnings are fanned out to
//! per-subscriber bounded queues.
//!
//! ```ignore
//! let provider = Arc::new(FnProvider::new(|| Ok(StateVector::now([("load", read_load())]))));
//! let handle = api::start_monitoring(MonitorConfig::default(), provider)?;
//! let mut changes = handle.subscribe_changes();
//! while let Some(event) = changes.recv().await {
//!     if event.significant { /* ... */ }
//! }
//! ```

pub mod api;
pub mod constants;
pub mod logic;

pub use api::{Notification, Subscriber, SubscriptionKind};
pub use logic::{
    AnalysisReport, AnalysisWindow, Anomaly, ChangeEvent, FnProvider, InitialThresholds,
    MonitorConfig, MonitorError, MonitorHandle, MonitorResult, MonitorStats, MonitorWarning,
    ProviderError, SessionState, StateProvider, StateVector, ThresholdSet, TrendDirection,
    WarningKind,
};
