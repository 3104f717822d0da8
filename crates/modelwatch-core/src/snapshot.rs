//! Immutable per-tick output and its last-value-wins publication channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::alerts::AlertSummary;
use crate::change::ChangeIndicator;
use crate::metric::MetricKey;

/// Placeholder rendered for absent values.
pub const NO_DATA: &str = "—";

/// Backend reachability, derived from the primary metric's fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn from_primary(fetched: bool) -> Self {
        if fetched {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected • Live data",
            Self::Disconnected => "Disconnected",
        }
    }
}

/// Display string for a value of `key`, or [`NO_DATA`].
pub fn format_value(key: MetricKey, value: Option<f64>) -> String {
    let Some(v) = value else {
        return NO_DATA.to_string();
    };
    match key {
        k if k.is_quality() => format!("{v:.4}"),
        MetricKey::Predictions | MetricKey::Errors => format!("{v:.0}"),
        MetricKey::Cpu | MetricKey::Memory => format!("{v:.1}"),
        _ => format!("{v:.3}"),
    }
}

/// Everything the renderer needs for one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReading {
    pub key: MetricKey,
    /// Value fetched this tick; `None` if the fetch failed.
    pub latest: Option<f64>,
    pub change: ChangeIndicator,
    /// Rolling history, oldest first. Failed fetches appear as zero.
    pub window: Vec<f64>,
}

impl MetricReading {
    pub fn display_value(&self) -> String {
        format_value(self.key, self.latest)
    }

    pub fn display_change(&self) -> String {
        self.change.to_string()
    }
}

/// Result of one tick. Never mutated after it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    sequence: u64,
    captured_unix_ms: u64,
    status: ConnectionStatus,
    readings: Vec<MetricReading>,
    alerts: AlertSummary,
}

impl Snapshot {
    /// `readings` must hold one entry per key in [`MetricKey::ALL`] order.
    pub(crate) fn new(
        sequence: u64,
        captured_unix_ms: u64,
        status: ConnectionStatus,
        readings: Vec<MetricReading>,
        alerts: AlertSummary,
    ) -> Self {
        debug_assert_eq!(readings.len(), MetricKey::COUNT);
        Self {
            sequence,
            captured_unix_ms,
            status,
            readings,
            alerts,
        }
    }

    /// Tick number, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn captured_unix_ms(&self) -> u64 {
        self.captured_unix_ms
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn reading(&self, key: MetricKey) -> &MetricReading {
        &self.readings[key.index()]
    }

    pub fn readings(&self) -> &[MetricReading] {
        &self.readings
    }

    pub fn latest(&self, key: MetricKey) -> Option<f64> {
        self.reading(key).latest
    }

    pub fn change(&self, key: MetricKey) -> ChangeIndicator {
        self.reading(key).change
    }

    pub fn window(&self, key: MetricKey) -> &[f64] {
        &self.reading(key).window
    }

    pub fn alerts(&self) -> &AlertSummary {
        &self.alerts
    }
}

/// Create a publisher/feed pair. The feed always yields the newest snapshot;
/// snapshots published while nobody is looking are dropped.
pub fn snapshot_channel() -> (SnapshotPublisher, SnapshotFeed) {
    let (tx, rx) = watch::channel(None);
    (SnapshotPublisher { tx }, SnapshotFeed { rx })
}

/// Writing half of the snapshot channel.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotPublisher {
    /// Replace the current snapshot. Succeeds even with no subscribers.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }

    pub fn subscribe(&self) -> SnapshotFeed {
        SnapshotFeed {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reading half of the snapshot channel.
#[derive(Debug, Clone)]
pub struct SnapshotFeed {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotFeed {
    /// Newest snapshot, if any tick has completed.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }

    /// Wait for a snapshot newer than the last one seen through this feed.
    /// Returns `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}
