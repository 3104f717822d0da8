//! Bounded stochastic generator for model-quality metrics.
//!
//! Each cycle draws:
//! - four quality gauges, uniform within a fixed band around a baseline,
//!   clamped to [0, 1];
//! - with probability 0.7 one prediction event with a latency uniform in
//!   [0.001, 0.1] s, of which 5% also count as an error;
//! - CPU and memory gauges, resampled independently every cycle.
//!
//! Generation is pure; [`MetricsExporter`](crate::exposition::MetricsExporter)
//! turns cycles into scrapeable metrics.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::exposition::MetricsExporter;

/// Default delay between cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// Probability that a cycle registers a prediction event.
pub const PREDICTION_PROBABILITY: f64 = 0.7;
/// Probability that a prediction event is also an error.
pub const ERROR_PROBABILITY: f64 = 0.05;

/// Inclusive latency range for prediction events, in seconds.
pub const LATENCY_RANGE: (f64, f64) = (0.001, 0.1);
/// Latency histogram bucket upper bounds, in seconds.
pub const LATENCY_BUCKETS: [f64; 8] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0];

pub const CPU_RANGE: (f64, f64) = (20.0, 80.0);
pub const MEMORY_RANGE: (f64, f64) = (200.0, 800.0);

/// Centre and half-width of a quality gauge's band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub center: f64,
    pub half_width: f64,
}

pub const ACCURACY: Baseline = Baseline {
    center: 0.85,
    half_width: 0.05,
};
pub const PRECISION: Baseline = Baseline {
    center: 0.83,
    half_width: 0.04,
};
pub const RECALL: Baseline = Baseline {
    center: 0.87,
    half_width: 0.04,
};
pub const F1_SCORE: Baseline = Baseline {
    center: 0.85,
    half_width: 0.04,
};

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("generated {metric} = {value} is outside {min}..={max}")]
    OutOfRange {
        metric: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A single prediction served during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionEvent {
    pub latency_secs: f64,
    pub error: bool,
}

/// Values produced by one generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneratedCycle {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub prediction: Option<PredictionEvent>,
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

impl GeneratedCycle {
    /// Check every value against its documented range.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        let mut checks = vec![
            ("accuracy", self.accuracy, 0.0, 1.0),
            ("precision", self.precision, 0.0, 1.0),
            ("recall", self.recall, 0.0, 1.0),
            ("f1_score", self.f1_score, 0.0, 1.0),
            ("cpu_percent", self.cpu_percent, CPU_RANGE.0, CPU_RANGE.1),
            ("memory_mb", self.memory_mb, MEMORY_RANGE.0, MEMORY_RANGE.1),
        ];
        if let Some(p) = self.prediction {
            checks.push(("latency_secs", p.latency_secs, LATENCY_RANGE.0, LATENCY_RANGE.1));
        }
        for (metric, value, min, max) in checks {
            if !(min..=max).contains(&value) {
                return Err(SimulatorError::OutOfRange {
                    metric,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Draws plausible metric values around fixed baselines.
#[derive(Debug, Clone)]
pub struct MetricSimulator<R = StdRng> {
    rng: R,
    cycles: u64,
}

impl MetricSimulator<StdRng> {
    /// Seeded from OS entropy.
    pub fn from_os_rng() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os_rng(),
        }
    }
}

impl<R: Rng> MetricSimulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, cycles: 0 }
    }

    /// Cycles generated so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn generate(&mut self) -> GeneratedCycle {
        self.cycles += 1;
        let rng = &mut self.rng;

        let accuracy = perturb(rng, ACCURACY);
        let precision = perturb(rng, PRECISION);
        let recall = perturb(rng, RECALL);
        let f1_score = perturb(rng, F1_SCORE);

        let prediction = rng.random_bool(PREDICTION_PROBABILITY).then(|| PredictionEvent {
            latency_secs: rng.random_range(LATENCY_RANGE.0..=LATENCY_RANGE.1),
            error: rng.random_bool(ERROR_PROBABILITY),
        });

        GeneratedCycle {
            accuracy,
            precision,
            recall,
            f1_score,
            prediction,
            cpu_percent: rng.random_range(CPU_RANGE.0..=CPU_RANGE.1),
            memory_mb: rng.random_range(MEMORY_RANGE.0..=MEMORY_RANGE.1),
        }
    }

    /// Generate one cycle and apply it to `exporter`.
    pub fn step(&mut self, exporter: &MetricsExporter) -> Result<GeneratedCycle, SimulatorError> {
        let cycle = self.generate();
        exporter.apply(&cycle)?;
        Ok(cycle)
    }
}

fn perturb<R: Rng>(rng: &mut R, baseline: Baseline) -> f64 {
    let delta = rng.random_range(-baseline.half_width..=baseline.half_width);
    (baseline.center + delta).clamp(0.0, 1.0)
}

/// Generate a cycle every `period` until `shutdown` resolves. A failing cycle
/// is logged and the loop carries on after the same delay.
pub async fn run_simulator<R, F>(
    mut simulator: MetricSimulator<R>,
    exporter: Arc<MetricsExporter>,
    period: Duration,
    shutdown: F,
) where
    R: Rng,
    F: Future<Output = ()>,
{
    drive_cycles(|| simulator.step(&exporter), period, shutdown).await;
    info!("simulator stopped after {} cycles", simulator.cycles());
}

/// The simulator loop with the cycle step abstracted out.
async fn drive_cycles<S, F>(mut step: S, period: Duration, shutdown: F)
where
    S: FnMut() -> Result<GeneratedCycle, SimulatorError>,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        match step() {
            Ok(c) => info!(
                "Updated metrics - Accuracy: {:.4}, Precision: {:.4}, Recall: {:.4}, F1: {:.4}",
                c.accuracy, c.precision, c.recall, c.f1_score
            ),
            Err(e) => error!("error generating metrics: {e}"),
        }
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(period) => {}
        }
    }
}
