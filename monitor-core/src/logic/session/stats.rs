//! Per-session counters

use std::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a session's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    pub ticks: u64,
    pub samples_accepted: u64,
    pub samples_rejected: u64,
    pub provider_failures: u64,
    pub backoff_skipped_ticks: u64,
    pub significant_events: u64,
    pub analysis_cycles: u64,
    pub analysis_skipped: u64,
    pub analysis_failures: u64,
    pub threshold_updates: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub ticks: AtomicU64,
    pub samples_accepted: AtomicU64,
    pub samples_rejected: AtomicU64,
    pub provider_failures: AtomicU64,
    pub backoff_skipped_ticks: AtomicU64,
    pub significant_events: AtomicU64,
    pub analysis_cycles: AtomicU64,
    pub analysis_skipped: AtomicU64,
    pub analysis_failures: AtomicU64,
    pub threshold_updates: AtomicU64,
}

impl Counters {
    /// Increment and return the new value
    pub fn incr(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> MonitorStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MonitorStats {
            ticks: get(&self.ticks),
            samples_accepted: get(&self.samples_accepted),
            samples_rejected: get(&self.samples_rejected),
            provider_failures: get(&self.provider_failures),
            backoff_skipped_ticks: get(&self.backoff_skipped_ticks),
            significant_events: get(&self.significant_events),
            analysis_cycles: get(&self.analysis_cycles),
            analysis_skipped: get(&self.analysis_skipped),
            analysis_failures: get(&self.analysis_failures),
            threshold_updates: get(&self.threshold_updates),
        }
    }
}
