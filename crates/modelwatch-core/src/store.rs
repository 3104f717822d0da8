//! Fixed-key rolling history of metric samples.
//!
//! Layout:
//! 1. One [`SeriesBuffer`] per [`MetricKey`], allocated empty at construction
//! 2. Each buffer is a FIFO ring with a fixed capacity (50 by default)
//! 3. Appending to a full buffer evicts the oldest sample
//!
//! The store has no interior locking. A single writer (the snapshot assembler)
//! records into it once per tick; readers borrow it between ticks.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::metric::MetricKey;

/// Samples retained per series unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 50;

/// One recorded observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub key: MetricKey,
    pub value: f64,
    pub captured_unix_ms: u64,
}

/// Bounded, ordered history for a single key.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    key: MetricKey,
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SeriesBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(key: MetricKey, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            key,
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn key(&self) -> MetricKey {
        self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample, returning the evicted one when the buffer was full.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Newest value, or `None` when nothing has been recorded.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|s| s.value)
    }

    /// Second-newest value.
    pub fn previous(&self) -> Option<f64> {
        let n = self.samples.len();
        if n < 2 {
            return None;
        }
        self.samples.get(n - 2).map(|s| s.value)
    }

    /// `(previous, latest)` when at least two samples exist.
    pub fn last_two(&self) -> Option<(f64, f64)> {
        Some((self.previous()?, self.latest()?))
    }

    /// Values in arrival order. The iterator is `Clone`, so it can be replayed.
    pub fn values(&self) -> impl ExactSizeIterator<Item = f64> + DoubleEndedIterator + Clone + '_ {
        self.samples.iter().map(|s| s.value)
    }
}

/// Rolling history for every [`MetricKey`].
#[derive(Debug, Clone)]
pub struct RollingSeriesStore {
    buffers: [SeriesBuffer; MetricKey::COUNT],
}

impl Default for RollingSeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingSeriesStore {
    /// Build a store with one empty buffer per key.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: MetricKey::ALL.map(|key| SeriesBuffer::new(key, capacity)),
        }
    }

    /// Per-series capacity.
    pub fn capacity(&self) -> usize {
        self.buffers[0].capacity()
    }

    /// Record a value stamped with the current wall-clock time.
    pub fn record(&mut self, key: MetricKey, value: f64) -> Option<Sample> {
        self.record_at(key, value, unix_ms_now())
    }

    /// Record a value with an explicit capture time.
    pub fn record_at(
        &mut self,
        key: MetricKey,
        value: f64,
        captured_unix_ms: u64,
    ) -> Option<Sample> {
        self.record_sample(Sample {
            key,
            value,
            captured_unix_ms,
        })
    }

    /// Record a prepared sample into the buffer for its key.
    pub fn record_sample(&mut self, sample: Sample) -> Option<Sample> {
        self.buffers[sample.key.index()].push(sample)
    }

    /// Newest value for `key`, or `None` ("no data") if the series is empty.
    pub fn latest(&self, key: MetricKey) -> Option<f64> {
        self.buffer(key).latest()
    }

    pub fn previous(&self, key: MetricKey) -> Option<f64> {
        self.buffer(key).previous()
    }

    /// Ordered values for `key`, at most `capacity()` of them.
    pub fn window(
        &self,
        key: MetricKey,
    ) -> impl ExactSizeIterator<Item = f64> + DoubleEndedIterator + Clone + '_ {
        self.buffer(key).values()
    }

    pub fn len(&self, key: MetricKey) -> usize {
        self.buffer(key).len()
    }

    pub fn is_empty(&self, key: MetricKey) -> bool {
        self.buffer(key).is_empty()
    }

    pub fn buffer(&self, key: MetricKey) -> &SeriesBuffer {
        &self.buffers[key.index()]
    }

    /// All buffers in [`MetricKey::ALL`] order.
    pub fn buffers(&self) -> impl Iterator<Item = &SeriesBuffer> {
        self.buffers.iter()
    }
}

pub(crate) fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_has_every_key_empty() {
        let store = RollingSeriesStore::default();
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
        for key in MetricKey::ALL {
            assert!(store.is_empty(key));
            assert_eq!(store.latest(key), None);
            assert_eq!(store.window(key).count(), 0);
        }
        assert_eq!(store.buffers().count(), MetricKey::COUNT);
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut store = RollingSeriesStore::new(50);
        for i in 0..500 {
            store.record(MetricKey::Cpu, i as f64);
            assert!(store.len(MetricKey::Cpu) <= 50);
        }
        assert_eq!(store.window(MetricKey::Cpu).len(), 50);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut store = RollingSeriesStore::new(3);
        assert_eq!(store.record_at(MetricKey::Recall, 1.0, 1), None);
        store.record_at(MetricKey::Recall, 2.0, 2);
        store.record_at(MetricKey::Recall, 3.0, 3);
        let evicted = store.record_at(MetricKey::Recall, 4.0, 4).unwrap();
        assert_eq!(evicted.value, 1.0);
        assert_eq!(evicted.captured_unix_ms, 1);
        let window: Vec<f64> = store.window(MetricKey::Recall).collect();
        assert_eq!(window, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn keys_are_independent() {
        let mut store = RollingSeriesStore::new(4);
        store.record(MetricKey::Accuracy, 0.9);
        assert_eq!(store.latest(MetricKey::Accuracy), Some(0.9));
        assert_eq!(store.latest(MetricKey::Precision), None);
    }

    #[test]
    fn previous_needs_two_samples() {
        let mut buf = SeriesBuffer::new(MetricKey::Errors, 5);
        buf.push(Sample {
            key: MetricKey::Errors,
            value: 7.0,
            captured_unix_ms: 0,
        });
        assert_eq!(buf.previous(), None);
        assert_eq!(buf.last_two(), None);
        buf.push(Sample {
            key: MetricKey::Errors,
            value: 8.0,
            captured_unix_ms: 1,
        });
        assert_eq!(buf.last_two(), Some((7.0, 8.0)));
    }

    #[test]
    fn window_is_restartable() {
        let mut store = RollingSeriesStore::new(10);
        for v in [0.1, 0.2, 0.3] {
            store.record(MetricKey::F1Score, v);
        }
        let window = store.window(MetricKey::F1Score);
        let first: Vec<f64> = window.clone().collect();
        let second: Vec<f64> = window.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut store = RollingSeriesStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.record(MetricKey::Memory, 1.0);
        store.record(MetricKey::Memory, 2.0);
        assert_eq!(store.window(MetricKey::Memory).collect::<Vec<_>>(), vec![2.0]);
    }
}
