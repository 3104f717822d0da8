//! Tick state machine: fetch → record → assemble → publish.
//!
//! ```text
//!   Idle ──tick──▶ Fetching ──all fetches settled──▶ Recording ──▶ Assembled ──▶ Idle
//! ```
//!
//! Fetches for one tick run concurrently on the calling task, each bounded by
//! the fetch timeout. Writes into the store happen afterwards, serially, so the
//! store never sees interleaved mutation. A failed fetch never aborts the tick.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;

use crate::alerts::{AlertAggregator, RawAlert};
use crate::change::{ChangeCalculator, ChangeIndicator};
use crate::metric::MetricKey;
use crate::snapshot::{ConnectionStatus, MetricReading, Snapshot, SnapshotPublisher};
use crate::source::{MetricSource, SourceError};
use crate::store::{RollingSeriesStore, unix_ms_now};

/// Default bound on each backend request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the assembler is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPhase {
    #[default]
    Idle,
    Fetching,
    Recording,
    Assembled,
}

/// The one place where an absent value becomes a history entry.
///
/// History keeps a numeric sample for every tick so all series stay aligned;
/// a failed fetch is stored as zero.
pub fn fold_absent(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Raw outcome of the fetch phase.
#[derive(Debug, Clone, Default)]
struct TickFetch {
    values: [Option<f64>; MetricKey::COUNT],
    alerts: Vec<RawAlert>,
}

/// Owns the rolling store and turns each tick into a [`Snapshot`].
pub struct SnapshotAssembler<S> {
    source: S,
    store: RollingSeriesStore,
    calculator: ChangeCalculator,
    aggregator: AlertAggregator,
    fetch_timeout: Duration,
    phase: TickPhase,
    sequence: u64,
}

impl<S: MetricSource + Sync> SnapshotAssembler<S> {
    pub fn new(source: S, store: RollingSeriesStore) -> Self {
        Self {
            source,
            store,
            calculator: ChangeCalculator::default(),
            aggregator: AlertAggregator,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            phase: TickPhase::Idle,
            sequence: 0,
        }
    }

    pub fn with_calculator(mut self, calculator: ChangeCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn store(&self) -> &RollingSeriesStore {
        &self.store
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.sequence
    }

    /// Run one full tick and return its snapshot.
    pub async fn tick(&mut self) -> Snapshot {
        self.phase = TickPhase::Fetching;
        let fetched = self.fetch_all().await;

        self.phase = TickPhase::Recording;
        let captured_unix_ms = unix_ms_now();
        self.record(&fetched, captured_unix_ms);

        self.phase = TickPhase::Assembled;
        let snapshot = self.assemble(fetched, captured_unix_ms);

        self.phase = TickPhase::Idle;
        snapshot
    }

    async fn fetch_all(&self) -> TickFetch {
        let source = &self.source;
        let timeout = self.fetch_timeout;

        let values = join_all(MetricKey::queried().filter_map(|key| {
            let name = key.query_name()?;
            Some(async move { (key, bounded(timeout, source.fetch_value(name)).await) })
        }));
        let alerts = bounded(timeout, source.fetch_alerts());
        let (values, alerts) = futures::join!(values, alerts);

        let mut fetched = TickFetch::default();
        for (key, result) in values {
            match result {
                Ok(v) => fetched.values[key.index()] = Some(v),
                Err(e) => warn!("error querying backend for {key}: {e}"),
            }
        }
        fetched.alerts = alerts.unwrap_or_else(|e| {
            warn!("error querying alerts: {e}");
            Vec::new()
        });
        fetched
    }

    fn record(&mut self, fetched: &TickFetch, captured_unix_ms: u64) {
        for key in MetricKey::queried() {
            let value = fold_absent(fetched.values[key.index()]);
            self.store.record_at(key, value, captured_unix_ms);
        }
        self.store.record_at(
            MetricKey::Timestamp,
            captured_unix_ms as f64 / 1000.0,
            captured_unix_ms,
        );
    }

    fn assemble(&mut self, fetched: TickFetch, captured_unix_ms: u64) -> Snapshot {
        self.sequence += 1;

        let readings = MetricKey::ALL
            .into_iter()
            .map(|key| {
                let latest = match key {
                    MetricKey::Timestamp => self.store.latest(key),
                    _ => fetched.values[key.index()],
                };
                let change = match latest {
                    Some(_) => self.calculator.change(self.store.buffer(key)),
                    None => ChangeIndicator::NoData,
                };
                MetricReading {
                    key,
                    latest,
                    change,
                    window: self.store.window(key).collect(),
                }
            })
            .collect();

        let primary_present = fetched.values[MetricKey::PRIMARY.index()].is_some();
        let status = ConnectionStatus::from_primary(primary_present);
        let alerts = self.aggregator.aggregate(&fetched.alerts);

        debug!(
            "tick #{} assembled: {} ({} firing alerts)",
            self.sequence,
            status.label(),
            alerts.len()
        );

        Snapshot::new(self.sequence, captured_unix_ms, status, readings, alerts)
    }
}

async fn bounded<T>(
    timeout: Duration,
    fetch: impl Future<Output = Result<T, SourceError>>,
) -> Result<T, SourceError> {
    match tokio::time::timeout(timeout, fetch).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(timeout)),
    }
}

/// Drive ticks every `period` until `shutdown` resolves, publishing each
/// snapshot. A tick in flight when shutdown fires is abandoned unpublished.
pub async fn run_viewer<S, F>(
    mut assembler: SnapshotAssembler<S>,
    period: Duration,
    publisher: SnapshotPublisher,
    shutdown: F,
) where
    S: MetricSource + Sync,
    F: Future<Output = ()>,
{
    // A zero period would panic inside `interval`.
    let period = period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!("viewer polling every {}ms", period.as_millis());
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        let snapshot = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            snapshot = assembler.tick() => snapshot,
        };
        publisher.publish(snapshot);
    }
    info!("viewer stopped after {} ticks", assembler.ticks());
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    struct FixedSource {
        values: HashMap<&'static str, f64>,
    }

    impl MetricSource for FixedSource {
        async fn fetch_value(&self, metric: &str) -> Result<f64, SourceError> {
            self.values
                .get(metric)
                .copied()
                .ok_or_else(|| SourceError::Empty(metric.to_string()))
        }

        async fn fetch_alerts(&self) -> Result<Vec<RawAlert>, SourceError> {
            Err(SourceError::Rejected("alerts disabled".into()))
        }
    }

    #[test]
    fn fold_absent_maps_none_to_zero() {
        assert_eq!(fold_absent(None), 0.0);
        assert_eq!(fold_absent(Some(0.7)), 0.7);
    }

    #[tokio::test]
    async fn partial_failure_is_isolated_per_key() {
        let source = FixedSource {
            values: HashMap::from([("model_accuracy", 0.9), ("cpu_usage_percent", 42.0)]),
        };
        let mut assembler = SnapshotAssembler::new(source, RollingSeriesStore::default());
        let snapshot = assembler.tick().await;

        assert_eq!(assembler.phase(), TickPhase::Idle);
        assert_eq!(snapshot.sequence(), 1);
        assert!(snapshot.status().is_connected());
        assert_eq!(snapshot.latest(MetricKey::Accuracy), Some(0.9));
        assert_eq!(snapshot.latest(MetricKey::Cpu), Some(42.0));
        assert_eq!(snapshot.latest(MetricKey::Recall), None);
        assert_eq!(snapshot.change(MetricKey::Recall), ChangeIndicator::NoData);
        assert_eq!(snapshot.window(MetricKey::Recall), &[0.0]);
        assert!(snapshot.alerts().is_empty());
    }

    #[tokio::test]
    async fn every_series_grows_by_one_per_tick() {
        let source = FixedSource {
            values: HashMap::new(),
        };
        let mut assembler = SnapshotAssembler::new(source, RollingSeriesStore::new(3));
        for _ in 0..5 {
            assembler.tick().await;
        }
        for key in MetricKey::ALL {
            assert_eq!(assembler.store().len(key), 3, "{key}");
        }
        assert_eq!(assembler.ticks(), 5);
    }

    #[tokio::test]
    async fn timestamp_series_tracks_capture_time() {
        let source = FixedSource {
            values: HashMap::new(),
        };
        let mut assembler = SnapshotAssembler::new(source, RollingSeriesStore::default());
        let snapshot = assembler.tick().await;
        let ts = snapshot.latest(MetricKey::Timestamp).unwrap();
        assert!((ts * 1000.0 - snapshot.captured_unix_ms() as f64).abs() < 1.0);
        assert!(!snapshot.status().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_ticks() {
        let source = FixedSource {
            values: HashMap::from([("model_accuracy", 0.9)]),
        };
        let assembler = SnapshotAssembler::new(source, RollingSeriesStore::default());
        let (publisher, mut feed) = crate::snapshot::snapshot_channel();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let watcher = async {
            let first = feed.next().await.expect("publisher alive");
            stop_tx.send(()).unwrap();
            first.sequence()
        };
        let shutdown = async {
            let _ = stop_rx.await;
        };
        let ((), seq) = tokio::join!(
            run_viewer(assembler, Duration::ZERO, publisher, shutdown),
            watcher
        );
        assert_eq!(seq, 1);
    }
}
