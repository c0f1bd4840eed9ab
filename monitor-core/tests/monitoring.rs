//! End-to-end monitoring sessions against scripted providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use state_monitor_core::api::{self, Notification, SubscriptionKind};
use state_monitor_core::{
    FnProvider, InitialThresholds, MonitorConfig, MonitorError, MonitorHandle, ProviderError,
    SessionState, StateProvider, StateVector, WarningKind,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
}

/// Replays `values` one per call, then fails
struct ScriptedProvider {
    values: Vec<f64>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(values: &[f64]) -> Self {
        Self { values: values.to_vec(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl StateProvider for ScriptedProvider {
    async fn get_current_state(&self) -> Result<StateVector, ProviderError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.values.get(i) {
            Some(v) => Ok(StateVector::at(ts(i as i64 * 10), [("x", *v)])),
            None => Err(ProviderError::Unavailable("script exhausted".into())),
        }
    }
}

/// Counter provider: x = 0, 1, 2, ... with strictly increasing timestamps
fn counting_provider() -> Arc<dyn StateProvider> {
    let calls = Arc::new(AtomicUsize::new(0));
    Arc::new(FnProvider::new(move || {
        let i = calls.fetch_add(1, Ordering::SeqCst);
        Ok(StateVector::at(ts(i as i64 * 10), [("x", i as f64)]))
    }))
}

fn config() -> MonitorConfig {
    MonitorConfig {
        sampling_interval_ms: 10,
        warning_min_interval_ms: 0,
        ..MonitorConfig::default()
    }
}

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_scripted_run_flags_two_changes() {
    init_logging();

    let provider = Arc::new(ScriptedProvider::new(&[0.80, 0.80, 0.95, 0.95, 0.80]));
    let config = config().with_initial_thresholds(InitialThresholds::new([("x", 0.05)]));
    let handle = MonitorHandle::new(config, provider).unwrap();
    let mut changes = api::subscribe(&handle, SubscriptionKind::Change);

    handle.start().unwrap();

    let mut significant = Vec::new();
    for tick in 1..=5 {
        let notification = tokio::time::timeout(WAIT, changes.recv())
            .await
            .expect("change event in time")
            .expect("session still running");
        match notification {
            Notification::Change(event) => {
                if event.significant {
                    significant.push(tick);
                    assert!(event.causes.contains("x"));
                    assert!((event.magnitude - 0.15).abs() < 1e-9);
                }
            }
            other => panic!("unexpected notification {:?}", other.kind()),
        }
    }

    api::stop_monitoring(handle).await;

    assert_eq!(significant, vec![3, 5]);
    // Failures after the script ends produce no change events
    assert!(changes.recv().await.is_none());
}

#[tokio::test]
async fn test_start_is_idempotent_and_stop_is_terminal() {
    init_logging();

    let handle = MonitorHandle::new(config(), counting_provider()).unwrap();
    assert_eq!(handle.state(), SessionState::Idle);

    handle.start().unwrap();
    handle.start().unwrap();
    assert_eq!(handle.state(), SessionState::Active);

    handle.stop().await;
    assert_eq!(handle.state(), SessionState::Stopped);
    assert_eq!(handle.start(), Err(MonitorError::SessionStopped));

    // Second stop is a no-op
    handle.stop().await;
    assert_eq!(handle.state(), SessionState::Stopped);
}

#[tokio::test]
async fn test_no_events_after_stop_returns() {
    init_logging();

    let handle = MonitorHandle::new(config(), counting_provider()).unwrap();
    let mut changes = handle.subscribe_changes();
    handle.start().unwrap();

    tokio::time::timeout(WAIT, changes.recv()).await.unwrap().unwrap();
    handle.stop().await;

    let accepted = handle.stats().samples_accepted;
    let mut drained = 1;
    while changes.recv().await.is_some() {
        drained += 1;
    }
    assert!(changes.is_closed());
    assert!(drained as u64 <= accepted);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.stats().samples_accepted, accepted);
    assert!(changes.try_recv().is_none());

    // Late subscribers get an already-closed subscription
    let mut late = handle.subscribe_changes();
    assert!(late.recv().await.is_none());
}

#[tokio::test]
async fn test_slow_subscriber_does_not_stall_others() {
    init_logging();

    let config = MonitorConfig { subscriber_capacity: 4, ..config() };
    let handle = MonitorHandle::new(config, counting_provider()).unwrap();
    let mut stalled = api::subscribe(&handle, SubscriptionKind::Change);
    let mut live = handle.subscribe_changes();
    handle.start().unwrap();

    let mut last = -1.0;
    for _ in 0..12 {
        let event = tokio::time::timeout(WAIT, live.recv()).await.unwrap().unwrap();
        let x = event.current.get("x").unwrap();
        assert!(x > last, "events out of order");
        last = x;
    }

    handle.stop().await;

    assert_eq!(live.dropped(), 0);

    // The stalled subscriber kept only its newest items
    let mut backlog = 0u64;
    while stalled.try_recv().is_some() {
        backlog += 1;
    }
    assert!(backlog <= 4);
    assert!(stalled.dropped() >= 8);
    assert_eq!(backlog + stalled.dropped(), handle.stats().samples_accepted);
}

#[tokio::test]
async fn test_provider_failures_warn_and_loop_continues() {
    init_logging();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let provider = Arc::new(FnProvider::new(move || {
        let i = counter.fetch_add(1, Ordering::SeqCst);
        if i < 3 {
            Err(ProviderError::Unavailable(format!("warming up ({})", i)))
        } else {
            Ok(StateVector::at(ts(i as i64 * 10), [("x", 1.0)]))
        }
    }));

    let handle = MonitorHandle::new(config(), provider).unwrap();
    let mut warnings = handle.subscribe_warnings();
    let mut changes = handle.subscribe_changes();
    handle.start().unwrap();

    let warning = tokio::time::timeout(WAIT, warnings.recv()).await.unwrap().unwrap();
    assert_eq!(warning.kind, WarningKind::ProviderUnavailable);

    let event = tokio::time::timeout(WAIT, changes.recv()).await.unwrap().unwrap();
    assert_eq!(event.current.get("x"), Some(1.0));

    handle.stop().await;

    let stats = handle.stats();
    assert_eq!(stats.provider_failures, 3);
    // Backoff of 10, 20 and 40 ms skips some ticks
    assert!(stats.backoff_skipped_ticks > 0);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    init_logging();

    struct Stalled;

    #[async_trait]
    impl StateProvider for Stalled {
        async fn get_current_state(&self) -> Result<StateVector, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(StateVector::now([("x", 0.0)]))
        }
    }

    let config = MonitorConfig { provider_timeout_ms: 20, ..config() };
    let handle = MonitorHandle::new(config, Arc::new(Stalled)).unwrap();
    let mut warnings = handle.subscribe_warnings();
    handle.start().unwrap();

    let warning = tokio::time::timeout(WAIT, warnings.recv()).await.unwrap().unwrap();
    assert_eq!(warning.kind, WarningKind::ProviderUnavailable);
    assert!(handle.snapshot_window(10).is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn test_adaptation_publishes_reports() {
    init_logging();

    let config = MonitorConfig {
        adaptation_cadence: 5,
        analysis_window: 5,
        ..config()
    };
    let handle = MonitorHandle::new(config, counting_provider()).unwrap();
    let mut reports = api::subscribe(&handle, SubscriptionKind::Analysis);
    handle.start().unwrap();

    let notification = tokio::time::timeout(WAIT, reports.recv()).await.unwrap().unwrap();
    let report = match notification {
        Notification::Analysis(report) => report,
        other => panic!("unexpected notification {:?}", other.kind()),
    };
    assert_eq!(report.window_size, 5);
    assert!((report.trends["x"] - 1.0).abs() < 1e-9);

    // Unit deltas: adapted threshold sits at the delta itself
    let thresholds = handle.thresholds().unwrap();
    assert!((thresholds.per_dim("x").unwrap() - 1.0).abs() < 1e-9);

    api::stop_monitoring(handle).await;
}

#[tokio::test]
async fn test_sessions_are_independent() {
    init_logging();

    let a = api::start_monitoring(config(), counting_provider()).unwrap();
    let b = MonitorHandle::new(config(), counting_provider()).unwrap();
    assert_ne!(a.id(), b.id());

    let mut changes = a.subscribe_changes();
    for _ in 0..3 {
        tokio::time::timeout(WAIT, changes.recv()).await.unwrap().unwrap();
    }

    assert!(a.snapshot_window(10).len() >= 3);
    assert!(api::get_snapshot_window(&b, 10).is_empty());
    assert!(b.thresholds().is_none());

    api::stop_monitoring(a).await;
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    init_logging();

    let bad = [
        MonitorConfig { sampling_interval_ms: 0, ..config() },
        MonitorConfig { history_capacity: 0, ..config() },
        MonitorConfig { sensitivity: 1.5, ..config() },
        MonitorConfig { analysis_window: 1, ..config() },
        config().with_initial_thresholds(InitialThresholds::new([("x", -1.0)])),
    ];

    for config in bad {
        assert!(matches!(
            api::start_monitoring(config, counting_provider()),
            Err(MonitorError::InvalidConfig(_))
        ));
    }
}
