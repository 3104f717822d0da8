//! Firing-alert filtering and severity grouping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Alert severity, ordered from most to least urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    Info,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Critical, Self::Warning, Self::Info];

    /// Parse a `severity` label. Missing or unknown values map to `Info`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("critical") => Self::Critical,
            Some("warning") => Self::Warning,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Alert as returned by the backend's alert list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAlert {
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub state: String,
}

impl RawAlert {
    pub fn is_firing(&self) -> bool {
        self.state == "firing"
    }
}

/// A classified alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub firing: bool,
}

impl From<&RawAlert> for Alert {
    fn from(raw: &RawAlert) -> Self {
        let name = raw
            .labels
            .get("alertname")
            .cloned()
            .unwrap_or_else(|| "Alert".to_string());
        let description = raw
            .annotations
            .get("description")
            .or_else(|| raw.annotations.get("summary"))
            .cloned()
            .unwrap_or_default();
        Self {
            name,
            severity: Severity::parse(raw.labels.get("severity").map(String::as_str)),
            description,
            firing: raw.is_firing(),
        }
    }
}

/// Firing alerts of one tick, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    alerts: Vec<Alert>,
}

impl AlertSummary {
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.alerts.iter().filter(|a| a.severity == severity).count()
    }

    /// Most urgent severity present.
    pub fn highest(&self) -> Option<Severity> {
        self.alerts.iter().map(|a| a.severity).min()
    }

    /// Alerts grouped by severity (critical first), keeping arrival order
    /// within each group. Empty groups are omitted.
    pub fn grouped(&self) -> Vec<(Severity, Vec<&Alert>)> {
        Severity::ALL
            .into_iter()
            .filter_map(|severity| {
                let group: Vec<&Alert> = self
                    .alerts
                    .iter()
                    .filter(|a| a.severity == severity)
                    .collect();
                (!group.is_empty()).then_some((severity, group))
            })
            .collect()
    }
}

/// Keeps firing alerts and classifies them.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertAggregator;

impl AlertAggregator {
    pub fn aggregate(&self, raw: &[RawAlert]) -> AlertSummary {
        AlertSummary {
            alerts: raw
                .iter()
                .filter(|a| a.is_firing())
                .map(Alert::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, severity: Option<&str>, state: &str) -> RawAlert {
        let mut labels = HashMap::from([("alertname".to_string(), name.to_string())]);
        if let Some(s) = severity {
            labels.insert("severity".to_string(), s.to_string());
        }
        RawAlert {
            labels,
            annotations: HashMap::from([("description".to_string(), format!("{name} fired"))]),
            state: state.to_string(),
        }
    }

    #[test]
    fn keeps_only_firing_alerts() {
        let input = vec![
            raw("LowAccuracy", Some("critical"), "firing"),
            raw("HighLatency", Some("warning"), "pending"),
            raw("HighCpu", Some("warning"), "firing"),
            raw("Drift", None, "inactive"),
        ];
        let summary = AlertAggregator.aggregate(&input);
        let names: Vec<&str> = summary.alerts().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["LowAccuracy", "HighCpu"]);
        assert!(summary.alerts().iter().all(|a| a.firing));
    }

    #[test]
    fn missing_severity_defaults_to_info() {
        let summary = AlertAggregator.aggregate(&[
            raw("NoLabel", None, "firing"),
            raw("Odd", Some("page-me"), "firing"),
        ]);
        assert_eq!(summary.count(Severity::Info), 2);
        assert_eq!(summary.highest(), Some(Severity::Info));
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse(Some(" Critical ")), Severity::Critical);
        assert_eq!(Severity::parse(Some("WARNING")), Severity::Warning);
        assert_eq!(Severity::parse(None), Severity::Info);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let summary = AlertAggregator.aggregate(&[]);
        assert!(summary.is_empty());
        assert!(summary.grouped().is_empty());
        assert_eq!(summary.highest(), None);
    }

    #[test]
    fn grouping_is_stable_within_severity() {
        let summary = AlertAggregator.aggregate(&[
            raw("w1", Some("warning"), "firing"),
            raw("c1", Some("critical"), "firing"),
            raw("i1", None, "firing"),
            raw("w2", Some("warning"), "firing"),
            raw("c2", Some("critical"), "firing"),
        ]);
        let grouped: Vec<(Severity, Vec<&str>)> = summary
            .grouped()
            .into_iter()
            .map(|(s, g)| (s, g.into_iter().map(|a| a.name.as_str()).collect()))
            .collect();
        assert_eq!(
            grouped,
            vec![
                (Severity::Critical, vec!["c1", "c2"]),
                (Severity::Warning, vec!["w1", "w2"]),
                (Severity::Info, vec!["i1"]),
            ]
        );
        assert_eq!(summary.highest(), Some(Severity::Critical));
    }

    #[test]
    fn name_and_description_fallbacks() {
        let alert = Alert::from(&RawAlert {
            annotations: HashMap::from([("summary".to_string(), "short".to_string())]),
            state: "firing".to_string(),
            ..RawAlert::default()
        });
        assert_eq!(alert.name, "Alert");
        assert_eq!(alert.description, "short");
        assert_eq!(alert.severity, Severity::Info);
    }

    #[test]
    fn deserializes_backend_shape() {
        let body = r#"{
            "labels": {"alertname": "ModelAccuracyLow", "severity": "critical"},
            "annotations": {"description": "accuracy below 0.8"},
            "state": "firing",
            "activeAt": "2024-01-01T00:00:00Z",
            "value": "7.5e-01"
        }"#;
        let raw: RawAlert = serde_json::from_str(body).unwrap();
        let alert = Alert::from(&raw);
        assert_eq!(alert.name, "ModelAccuracyLow");
        assert_eq!(alert.severity, Severity::Critical);
        assert!(alert.firing);
    }
}
