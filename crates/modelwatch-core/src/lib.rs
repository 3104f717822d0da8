//! # modelwatch-core
//!
//! **Live model-quality monitoring over a Prometheus backend.**
//!
//! `modelwatch-core` polls a fixed set of model and host metrics, keeps a
//! bounded rolling history of each, derives period-over-period change
//! indicators, and collects firing alerts into one immutable [`Snapshot`] per
//! tick. It also ships the [`MetricSimulator`] that produces plausible values
//! for the same metrics so the whole loop can run without a real model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use modelwatch_core::{MetricKey, PrometheusSource, RollingSeriesStore, SnapshotAssembler};
//!
//! # async fn demo() -> Result<(), modelwatch_core::SourceError> {
//! let source = PrometheusSource::new("http://localhost:9090", Duration::from_secs(5))?;
//! let mut assembler = SnapshotAssembler::new(source, RollingSeriesStore::default());
//!
//! let snapshot = assembler.tick().await;
//! println!(
//!     "{}  accuracy {} ({})",
//!     snapshot.status().label(),
//!     snapshot.reading(MetricKey::Accuracy).display_value(),
//!     snapshot.change(MetricKey::Accuracy),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Simulator → (scrape) → Prometheus → [`MetricSource`] → [`SnapshotAssembler`]
//! → [`RollingSeriesStore`] + [`ChangeCalculator`] + [`AlertAggregator`] →
//! [`Snapshot`] → renderer
//!
//! Snapshots are published on a last-value-wins channel
//! ([`snapshot_channel`]); a slow renderer only ever sees the newest one.

pub mod alerts;
pub mod assembler;
pub mod backend;
pub mod change;
pub mod config;
pub mod exposition;
pub mod metric;
pub mod simulator;
pub mod snapshot;
pub mod source;
pub mod store;

pub use alerts::{Alert, AlertAggregator, AlertSummary, RawAlert, Severity};
pub use assembler::{
    DEFAULT_FETCH_TIMEOUT, SnapshotAssembler, TickPhase, fold_absent, run_viewer,
};
pub use backend::PrometheusSource;
pub use change::{ChangeCalculator, ChangeIndicator, DEFAULT_EPSILON, percent_change};
pub use config::{SimulatorConfig, ViewerConfig};
pub use exposition::MetricsExporter;
pub use metric::MetricKey;
pub use simulator::{
    GeneratedCycle, MetricSimulator, PredictionEvent, SimulatorError, run_simulator,
};
pub use snapshot::{
    ConnectionStatus, MetricReading, NO_DATA, Snapshot, SnapshotFeed, SnapshotPublisher,
    format_value, snapshot_channel,
};
pub use source::{MetricSource, SourceError};
pub use store::{DEFAULT_CAPACITY, RollingSeriesStore, Sample, SeriesBuffer};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
