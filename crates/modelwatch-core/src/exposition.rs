//! Prometheus registry holding the simulator's gauges, counters and histogram.

use std::sync::atomic::{AtomicU64, Ordering};

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder};

use crate::simulator::{GeneratedCycle, LATENCY_BUCKETS, SimulatorError};

/// Scrapeable view of the latest simulator state.
pub struct MetricsExporter {
    registry: Registry,
    accuracy: Gauge,
    precision: Gauge,
    recall: Gauge,
    f1_score: Gauge,
    cpu: Gauge,
    memory: Gauge,
    predictions: Counter,
    errors: Counter,
    latency: Histogram,
    cycles: AtomicU64,
}

impl MetricsExporter {
    pub fn new() -> Result<Self, SimulatorError> {
        let registry = Registry::new();

        let gauge = |name: &str, help: &str| -> Result<Gauge, SimulatorError> {
            let g = Gauge::new(name, help)?;
            registry.register(Box::new(g.clone()))?;
            Ok(g)
        };
        let counter = |name: &str, help: &str| -> Result<Counter, SimulatorError> {
            let c = Counter::new(name, help)?;
            registry.register(Box::new(c.clone()))?;
            Ok(c)
        };

        let accuracy = gauge("model_accuracy", "Current model accuracy")?;
        let precision = gauge("model_precision", "Current model precision")?;
        let recall = gauge("model_recall", "Current model recall")?;
        let f1_score = gauge("model_f1_score", "Current model F1 score")?;
        let cpu = gauge("cpu_usage_percent", "CPU usage percentage")?;
        let memory = gauge("memory_usage_mb", "Memory usage in MB")?;
        let predictions = counter("total_predictions", "Total number of predictions made")?;
        let errors = counter("total_errors", "Total number of prediction errors")?;

        let latency = Histogram::with_opts(
            HistogramOpts::new("prediction_latency_seconds", "Latency of model predictions")
                .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            accuracy,
            precision,
            recall,
            f1_score,
            cpu,
            memory,
            predictions,
            errors,
            latency,
            cycles: AtomicU64::new(0),
        })
    }

    /// Publish one generated cycle. Out-of-range cycles are rejected whole.
    pub fn apply(&self, cycle: &GeneratedCycle) -> Result<(), SimulatorError> {
        cycle.validate()?;

        self.accuracy.set(cycle.accuracy);
        self.precision.set(cycle.precision);
        self.recall.set(cycle.recall);
        self.f1_score.set(cycle.f1_score);

        if let Some(p) = cycle.prediction {
            self.latency.observe(p.latency_secs);
            self.predictions.inc();
            if p.error {
                self.errors.inc();
            }
        }

        self.cpu.set(cycle.cpu_percent);
        self.memory.set(cycle.memory_mb);
        self.cycles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, SimulatorError> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// `Content-Type` of [`render`](Self::render) output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Cycles successfully applied.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn predictions_total(&self) -> f64 {
        self.predictions.get()
    }

    pub fn errors_total(&self) -> f64 {
        self.errors.get()
    }

    pub fn latency_observations(&self) -> u64 {
        self.latency.get_sample_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{MetricSimulator, PredictionEvent};

    fn cycle(prediction: Option<PredictionEvent>) -> GeneratedCycle {
        GeneratedCycle {
            accuracy: 0.85,
            precision: 0.83,
            recall: 0.87,
            f1_score: 0.85,
            prediction,
            cpu_percent: 50.0,
            memory_mb: 512.0,
        }
    }

    #[test]
    fn render_lists_every_metric() {
        let exporter = MetricsExporter::new().unwrap();
        exporter.apply(&cycle(None)).unwrap();
        let text = exporter.render().unwrap();
        for name in [
            "model_accuracy",
            "model_precision",
            "model_recall",
            "model_f1_score",
            "cpu_usage_percent",
            "memory_usage_mb",
            "total_predictions",
            "total_errors",
            "prediction_latency_seconds_bucket",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(text.contains("model_accuracy 0.85"));
        assert!(text.contains("# TYPE prediction_latency_seconds histogram"));
        assert!(exporter.content_type().starts_with("text/plain"));
    }

    #[test]
    fn histogram_uses_fixed_buckets() {
        let exporter = MetricsExporter::new().unwrap();
        exporter
            .apply(&cycle(Some(PredictionEvent {
                latency_secs: 0.003,
                error: false,
            })))
            .unwrap();
        let text = exporter.render().unwrap();
        assert!(text.contains(r#"prediction_latency_seconds_bucket{le="0.001"} 0"#));
        assert!(text.contains(r#"prediction_latency_seconds_bucket{le="0.005"} 1"#));
        assert!(text.contains(r#"prediction_latency_seconds_bucket{le="2"} 1"#));
        assert_eq!(exporter.latency_observations(), 1);
    }

    #[test]
    fn errors_only_count_with_predictions() {
        let exporter = MetricsExporter::new().unwrap();
        exporter.apply(&cycle(None)).unwrap();
        assert_eq!(exporter.predictions_total(), 0.0);
        assert_eq!(exporter.errors_total(), 0.0);
        exporter
            .apply(&cycle(Some(PredictionEvent {
                latency_secs: 0.05,
                error: true,
            })))
            .unwrap();
        assert_eq!(exporter.predictions_total(), 1.0);
        assert_eq!(exporter.errors_total(), 1.0);
        assert_eq!(exporter.cycles(), 2);
    }

    #[test]
    fn invalid_cycle_is_rejected_without_side_effects() {
        let exporter = MetricsExporter::new().unwrap();
        let mut bad = cycle(Some(PredictionEvent {
            latency_secs: 0.01,
            error: false,
        }));
        bad.cpu_percent = 120.0;
        assert!(exporter.apply(&bad).is_err());
        assert_eq!(exporter.predictions_total(), 0.0);
        assert_eq!(exporter.cycles(), 0);
    }

    #[test]
    fn simulated_errors_never_exceed_predictions() {
        let exporter = MetricsExporter::new().unwrap();
        let mut sim = MetricSimulator::seeded(5);
        for _ in 0..10_000 {
            sim.step(&exporter).unwrap();
        }
        assert!(exporter.errors_total() <= exporter.predictions_total());
        assert_eq!(exporter.latency_observations() as f64, exporter.predictions_total());
    }
}
