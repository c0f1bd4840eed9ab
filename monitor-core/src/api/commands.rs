//! Monitoring Commands - Session control for callers

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::logic::analysis::AnalysisReport;
use crate::logic::config::MonitorConfig;
use crate::logic::detector::ChangeEvent;
use crate::logic::error::MonitorResult;
use crate::logic::events::Subscription;
use crate::logic::provider::StateProvider;
use crate::logic::session::MonitorHandle;
use crate::logic::state::StateVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Change,
    Analysis,
}

/// One item delivered by a `Subscriber`
#[derive(Debug, Clone)]
pub enum Notification {
    Change(Arc<ChangeEvent>),
    Analysis(Arc<AnalysisReport>),
}

impl Notification {
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            Notification::Change(_) => SubscriptionKind::Change,
            Notification::Analysis(_) => SubscriptionKind::Analysis,
        }
    }

    pub fn to_log_entry(&self) -> serde_json::Value {
        match self {
            Notification::Change(e) => e.to_log_entry(),
            Notification::Analysis(r) => r.to_log_entry(),
        }
    }
}

/// Subscription returned by [`subscribe`]
pub enum Subscriber {
    Change(Subscription<ChangeEvent>),
    Analysis(Subscription<AnalysisReport>),
}

impl Subscriber {
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            Subscriber::Change(_) => SubscriptionKind::Change,
            Subscriber::Analysis(_) => SubscriptionKind::Analysis,
        }
    }

    /// Next notification; `None` once the session is stopped and the queue
    /// is drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        match self {
            Subscriber::Change(sub) => sub.recv().await.map(Notification::Change),
            Subscriber::Analysis(sub) => sub.recv().await.map(Notification::Analysis),
        }
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        match self {
            Subscriber::Change(sub) => sub.try_recv().map(Notification::Change),
            Subscriber::Analysis(sub) => sub.try_recv().map(Notification::Analysis),
        }
    }

    /// Notifications lost to queue overflow
    pub fn dropped(&self) -> u64 {
        match self {
            Subscriber::Change(sub) => sub.dropped(),
            Subscriber::Analysis(sub) => sub.dropped(),
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Validate `config`, create a session and start sampling.
///
/// Must be called from within a tokio runtime.
pub fn start_monitoring(
    config: MonitorConfig,
    provider: Arc<dyn StateProvider>,
) -> MonitorResult<MonitorHandle> {
    let handle = MonitorHandle::new(config, provider)?;
    handle.start()?;
    Ok(handle)
}

/// Stop the session and release it. No notification is delivered after this
/// returns.
pub async fn stop_monitoring(handle: MonitorHandle) {
    handle.stop().await;
}

pub fn subscribe(handle: &MonitorHandle, kind: SubscriptionKind) -> Subscriber {
    match kind {
        SubscriptionKind::Change => Subscriber::Change(handle.subscribe_changes()),
        SubscriptionKind::Analysis => Subscriber::Analysis(handle.subscribe_analysis()),
    }
}

/// The most recent `n` accepted snapshots, oldest first
pub fn get_snapshot_window(handle: &MonitorHandle, n: usize) -> Vec<StateVector> {
    handle.snapshot_window(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::error::MonitorError;
    use crate::logic::provider::FnProvider;

    fn provider() -> Arc<dyn StateProvider> {
        Arc::new(FnProvider::new(|| Ok(StateVector::now([("x", 0.0)]))))
    }

    #[test]
    fn test_invalid_config_creates_no_handle() {
        let config = MonitorConfig {
            sensitivity: 0.0,
            ..MonitorConfig::default()
        };
        let result = start_monitoring(config, provider());
        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let result = start_monitoring(MonitorConfig::default(), provider());
        assert!(matches!(result, Err(MonitorError::Runtime(_))));
    }

    #[test]
    fn test_subscriber_kind() {
        let handle = MonitorHandle::new(MonitorConfig::default(), provider()).unwrap();
        assert_eq!(subscribe(&handle, SubscriptionKind::Change).kind(), SubscriptionKind::Change);
        assert_eq!(
            subscribe(&handle, SubscriptionKind::Analysis).kind(),
            SubscriptionKind::Analysis
        );
        assert!(get_snapshot_window(&handle, 10).is_empty());
    }
}
