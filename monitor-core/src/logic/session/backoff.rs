//! Provider retry backoff
//!
//! After the k-th consecutive failure the next attempt waits
//! `min(2^(k-1), max_factor) * base`. A success resets the sequence.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_factor: u32,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_factor: u32) -> Self {
        Self {
            base,
            max_factor: max_factor.max(1),
            failures: 0,
        }
    }

    /// Register a failure and return how long to wait before retrying
    pub fn record_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        self.base * self.factor()
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn factor(&self) -> u32 {
        if self.failures == 0 {
            return 1;
        }
        let exp = (self.failures - 1).min(31);
        (1u32 << exp).min(self.max_factor)
    }
}
