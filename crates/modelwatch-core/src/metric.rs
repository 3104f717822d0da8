//! The closed set of metric keys tracked by the viewer.
//!
//! Every key has a rolling series from the moment the store is built. All keys
//! except [`MetricKey::Timestamp`] map to a backend metric name; the timestamp
//! series records the capture time of each tick.

use serde::{Deserialize, Serialize};

/// Identifier of one tracked time-series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Accuracy,
    Precision,
    Recall,
    F1Score,
    Predictions,
    Errors,
    Cpu,
    Memory,
    /// Capture time of each tick, in unix seconds.
    Timestamp,
}

impl MetricKey {
    /// Number of keys.
    pub const COUNT: usize = 9;

    /// Every key, in declaration order. `ALL[k.index()] == k`.
    pub const ALL: [MetricKey; Self::COUNT] = [
        Self::Accuracy,
        Self::Precision,
        Self::Recall,
        Self::F1Score,
        Self::Predictions,
        Self::Errors,
        Self::Cpu,
        Self::Memory,
        Self::Timestamp,
    ];

    /// The four model-quality gauges shown as headline cards.
    pub const QUALITY: [MetricKey; 4] =
        [Self::Accuracy, Self::Precision, Self::Recall, Self::F1Score];

    /// The key whose fetch outcome decides the connection status.
    pub const PRIMARY: MetricKey = Self::Accuracy;

    /// Position of this key in [`MetricKey::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the backend series to query, or `None` for locally produced keys.
    pub fn query_name(self) -> Option<&'static str> {
        match self {
            Self::Accuracy => Some("model_accuracy"),
            Self::Precision => Some("model_precision"),
            Self::Recall => Some("model_recall"),
            Self::F1Score => Some("model_f1_score"),
            Self::Predictions => Some("total_predictions"),
            Self::Errors => Some("total_errors"),
            Self::Cpu => Some("cpu_usage_percent"),
            Self::Memory => Some("memory_usage_mb"),
            Self::Timestamp => None,
        }
    }

    /// Keys that are fetched from the backend on every tick.
    pub fn queried() -> impl Iterator<Item = MetricKey> {
        Self::ALL.into_iter().filter(|k| k.query_name().is_some())
    }

    /// Stable snake_case identifier.
    pub fn name(self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::F1Score => "f1_score",
            Self::Predictions => "predictions",
            Self::Errors => "errors",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Timestamp => "timestamp",
        }
    }

    /// Human-readable label for dashboards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Accuracy => "Accuracy",
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::F1Score => "F1 Score",
            Self::Predictions => "Predictions",
            Self::Errors => "Errors",
            Self::Cpu => "CPU %",
            Self::Memory => "Memory (MB)",
            Self::Timestamp => "Timestamp",
        }
    }

    pub fn is_quality(self) -> bool {
        Self::QUALITY.contains(&self)
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, key) in MetricKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn timestamp_is_the_only_unqueried_key() {
        let unqueried: Vec<_> = MetricKey::ALL
            .into_iter()
            .filter(|k| k.query_name().is_none())
            .collect();
        assert_eq!(unqueried, vec![MetricKey::Timestamp]);
        assert_eq!(MetricKey::queried().count(), MetricKey::COUNT - 1);
    }

    #[test]
    fn query_names_follow_simulator_exposition() {
        assert_eq!(MetricKey::Accuracy.query_name(), Some("model_accuracy"));
        assert_eq!(MetricKey::F1Score.query_name(), Some("model_f1_score"));
        assert_eq!(MetricKey::Cpu.query_name(), Some("cpu_usage_percent"));
        assert_eq!(MetricKey::Memory.query_name(), Some("memory_usage_mb"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&MetricKey::F1Score).unwrap();
        assert_eq!(json, "\"f1_score\"");
        assert_eq!(MetricKey::F1Score.to_string(), "f1_score");
    }
}
