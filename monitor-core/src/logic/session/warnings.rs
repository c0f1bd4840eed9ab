//! Warning Channel - Low-rate runtime error notifications
//!
//! Runtime errors never stop the sampling loop; they end up here. Each kind
//! is rate limited so a dead provider at 100 Hz does not flood subscribers.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::error::MonitorError;
use crate::logic::events::{EventBus, Subscription};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    ProviderUnavailable,
    InvalidStateVector,
    AnalysisFailure,
}

impl WarningKind {
    /// Runtime errors that belong on the warning channel
    pub fn from_error(err: &MonitorError) -> Option<Self> {
        match err {
            MonitorError::ProviderUnavailable(_) => Some(WarningKind::ProviderUnavailable),
            MonitorError::InvalidStateVector(_) => Some(WarningKind::InvalidStateVector),
            MonitorError::AnalysisFailure(_) => Some(WarningKind::AnalysisFailure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorWarning {
    pub timestamp: DateTime<Utc>,
    pub kind: WarningKind,
    pub message: String,
    /// Same-kind warnings swallowed since the previous one was emitted
    pub suppressed: u64,
}

// ============================================================================
// CHANNEL
// ============================================================================

struct LimiterSlot {
    last_emitted: Instant,
    suppressed: u64,
}

pub struct WarningChannel {
    label: String,
    bus: EventBus<MonitorWarning>,
    min_interval: Duration,
    slots: Mutex<HashMap<WarningKind, LimiterSlot>>,
}

impl WarningChannel {
    pub fn new(label: impl Into<String>, capacity: usize, min_interval: Duration) -> Self {
        Self {
            label: label.into(),
            bus: EventBus::new(capacity),
            min_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self) -> Subscription<MonitorWarning> {
        self.bus.subscribe()
    }

    /// Publish unless a same-kind warning went out less than `min_interval` ago.
    ///
    /// Returns whether the warning was emitted.
    pub fn report(&self, kind: WarningKind, message: String) -> bool {
        let now = Instant::now();
        let suppressed = {
            let mut slots = self.slots.lock();
            match slots.get_mut(&kind) {
                Some(slot) if now.duration_since(slot.last_emitted) < self.min_interval => {
                    slot.suppressed += 1;
                    log::debug!("[{}] {:?} (rate limited): {}", self.label, kind, message);
                    return false;
                }
                Some(slot) => {
                    let suppressed = slot.suppressed;
                    slot.suppressed = 0;
                    slot.last_emitted = now;
                    suppressed
                }
                None => {
                    slots.insert(kind, LimiterSlot { last_emitted: now, suppressed: 0 });
                    0
                }
            }
        };

        log::warn!(
            "[{}] {:?}: {} ({} suppressed)",
            self.label,
            kind,
            message,
            suppressed
        );

        self.bus.publish(MonitorWarning {
            timestamp: Utc::now(),
            kind,
            message,
            suppressed,
        });
        true
    }

    /// Route a runtime error; anything that is not a runtime kind is only logged
    pub fn report_error(&self, err: &MonitorError) -> bool {
        match WarningKind::from_error(err) {
            Some(kind) => self.report(kind, err.to_string()),
            None => {
                log::error!("[{}] {}", self.label, err);
                false
            }
        }
    }

    pub fn close(&self) {
        self.bus.close();
    }
}
