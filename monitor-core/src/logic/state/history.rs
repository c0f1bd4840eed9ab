//! History Store - Bounded FIFO of recent snapshots
//!
//! Single writer (the sampling loop), many readers (detector, analyzer,
//! diagnostics). Readers copy the `Arc` list out under the read lock, so a
//! window never observes the buffer mid-eviction.

use std::collections::VecDeque;
use std::sync::Arc;
use parking_lot::RwLock;

use super::vector::StateVector;
use crate::constants::DEFAULT_HISTORY_CAPACITY;

// ============================================================================
// HISTORY STORE
// ============================================================================

pub struct HistoryStore {
    entries: RwLock<VecDeque<Arc<StateVector>>>,
    capacity: usize,
}

impl HistoryStore {
    /// Create a store holding at most `capacity` snapshots (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest one when full.
    ///
    /// Returns the evicted snapshot, if any.
    pub fn push(&self, sample: StateVector) -> Option<Arc<StateVector>> {
        let mut entries = self.entries.write();
        entries.push_back(Arc::new(sample));

        if entries.len() > self.capacity {
            entries.pop_front()
        } else {
            None
        }
    }

    /// Most recent `min(n, len)` snapshots, newest last
    pub fn window(&self, n: usize) -> AnalysisWindow {
        let entries = self.entries.read();
        let start = entries.len().saturating_sub(n);
        AnalysisWindow {
            samples: entries.range(start..).cloned().collect(),
        }
    }

    pub fn last(&self) -> Option<Arc<StateVector>> {
        self.entries.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

// ============================================================================
// ANALYSIS WINDOW
// ============================================================================

/// Read-only slice of the history, oldest first
#[derive(Debug, Clone, Default)]
pub struct AnalysisWindow {
    samples: Vec<Arc<StateVector>>,
}

impl AnalysisWindow {
    pub fn from_samples(samples: Vec<StateVector>) -> Self {
        Self {
            samples: samples.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StateVector> {
        self.samples.get(index).map(Arc::as_ref)
    }

    pub fn last(&self) -> Option<&StateVector> {
        self.samples.last().map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateVector> {
        self.samples.iter().map(Arc::as_ref)
    }

    /// Dimension names of the newest sample
    pub fn dimension_names(&self) -> Vec<String> {
        self.last()
            .map(|s| s.dimension_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Values of one dimension across the window.
    ///
    /// `Err(index)` names the first sample lacking the dimension.
    pub fn series(&self, name: &str) -> Result<Vec<f64>, usize> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| s.get(name).ok_or(i))
            .collect()
    }

    /// Owned copies, for callers that outlive the window
    pub fn to_vec(&self) -> Vec<StateVector> {
        self.samples.iter().map(|s| StateVector::clone(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample(i: i64) -> StateVector {
        let t0 = Utc::now();
        StateVector::at(t0 + Duration::milliseconds(i), [("phi", i as f64)])
    }

    #[test]
    fn test_push_evicts_oldest() {
        let store = HistoryStore::new(5);
        let k = 3;

        for i in 0..(5 + k) {
            store.push(sample(i as i64));
        }

        assert_eq!(store.len(), 5);
        let values: Vec<f64> = store.window(100).iter().map(|s| s.get("phi").unwrap()).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_push_returns_evicted() {
        let store = HistoryStore::new(1);
        assert!(store.push(sample(0)).is_none());
        let evicted = store.push(sample(1)).unwrap();
        assert_eq!(evicted.get("phi"), Some(0.0));
    }

    #[test]
    fn test_window_newest_last() {
        let store = HistoryStore::new(10);
        for i in 0..4 {
            store.push(sample(i));
        }

        let w = store.window(2);
        assert_eq!(w.len(), 2);
        assert_eq!(w.get(0).unwrap().get("phi"), Some(2.0));
        assert_eq!(w.last().unwrap().get("phi"), Some(3.0));

        // Larger than size returns everything
        assert_eq!(store.window(50).len(), 4);
    }

    #[test]
    fn test_last_and_empty() {
        let store = HistoryStore::default();
        assert!(store.last().is_none());
        assert!(store.window(10).is_empty());
        assert_eq!(store.capacity(), DEFAULT_HISTORY_CAPACITY);

        store.push(sample(7));
        assert_eq!(store.last().unwrap().get("phi"), Some(7.0));

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_window_survives_eviction() {
        let store = HistoryStore::new(2);
        store.push(sample(0));
        store.push(sample(1));

        let w = store.window(2);
        store.push(sample(2));
        store.push(sample(3));

        // Window still holds the snapshots it was read with
        assert_eq!(w.get(0).unwrap().get("phi"), Some(0.0));
        assert_eq!(w.get(1).unwrap().get("phi"), Some(1.0));
    }

    #[test]
    fn test_series_reports_missing_index() {
        let w = AnalysisWindow::from_samples(vec![
            StateVector::now([("a", 1.0)]),
            StateVector::now([("b", 2.0)]),
        ]);
        assert_eq!(w.series("a"), Err(1));
        assert_eq!(w.series("b"), Err(0));
    }

    #[test]
    fn test_concurrent_readers_see_contiguous_windows() {
        let store = HistoryStore::new(64);
        let writes = 5_000;

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..writes {
                    store.push(sample(i));
                }
            });

            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..2_000 {
                        let values = store.window(32).series("phi").unwrap();
                        assert!(values.len() <= 32);
                        for pair in values.windows(2) {
                            assert_eq!(pair[1] - pair[0], 1.0, "torn window: {:?}", values);
                        }
                    }
                });
            }
        });

        assert_eq!(store.len(), 64);
        assert_eq!(store.last().unwrap().get("phi"), Some((writes - 1) as f64));
    }
}
