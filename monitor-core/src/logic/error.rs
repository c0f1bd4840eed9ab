//! Error types for the monitoring engine
//!
//! Only `InvalidConfig` (and `SessionStopped`/`Runtime` on lifecycle misuse)
//! reach callers synchronously. Everything raised inside the sampling loop is
//! logged and surfaced through the warning channel instead.

use std::time::Duration;
use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("State provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid state vector: {0}")]
    InvalidStateVector(String),

    #[error("Analysis failure: {0}")]
    AnalysisFailure(String),

    #[error("Monitoring session already stopped")]
    SessionStopped,

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error returned by a `StateProvider`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Unavailable(String),

    #[error("call exceeded {0:?}")]
    Timeout(Duration),
}

impl From<ProviderError> for MonitorError {
    fn from(err: ProviderError) -> Self {
        MonitorError::ProviderUnavailable(err.to_string())
    }
}
