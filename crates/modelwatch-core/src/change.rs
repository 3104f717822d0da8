//! Period-over-period change between the two newest samples of a series.

use serde::Serialize;

use crate::store::SeriesBuffer;

/// Changes smaller than this many percent points are reported as flat.
pub const DEFAULT_EPSILON: f64 = 0.01;

/// Direction and magnitude of the latest change in a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum ChangeIndicator {
    /// The key could not be fetched this tick.
    NoData,
    /// Fewer than two samples, or the percentage is undefined.
    NoChange,
    /// Inside the dead-zone.
    Flat,
    /// Increase, as an absolute percentage.
    Up(f64),
    /// Decrease, as an absolute percentage.
    Down(f64),
}

impl ChangeIndicator {
    /// Signed percentage for directional indicators.
    pub fn percent(self) -> Option<f64> {
        match self {
            Self::Up(p) => Some(p),
            Self::Down(p) => Some(-p),
            Self::NoData | Self::NoChange | Self::Flat => None,
        }
    }

    pub fn is_directional(self) -> bool {
        matches!(self, Self::Up(_) | Self::Down(_))
    }

    pub fn arrow(self) -> Option<char> {
        match self {
            Self::Up(_) => Some('↑'),
            Self::Down(_) => Some('↓'),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.arrow(), self) {
            (Some(arrow), Self::Up(p) | Self::Down(p)) => write!(f, "{arrow} {p:.1}%"),
            _ => f.write_str("—"),
        }
    }
}

/// `(curr - prev) / prev * 100`, or `None` when `prev` is zero or either input
/// is not finite.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 || !prev.is_finite() || !curr.is_finite() {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

/// Classifies the last step of a series with a dead-zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeCalculator {
    epsilon: f64,
}

impl Default for ChangeCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl ChangeCalculator {
    /// Negative or non-finite epsilons fall back to [`DEFAULT_EPSILON`].
    pub fn new(epsilon: f64) -> Self {
        let epsilon = if epsilon.is_finite() && epsilon >= 0.0 {
            epsilon
        } else {
            DEFAULT_EPSILON
        };
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Classify the step from `prev` to `curr`.
    ///
    /// A zero on either side yields [`ChangeIndicator::NoChange`]: zero is what a
    /// failed fetch is folded into, so it never produces an arrow.
    pub fn classify(&self, prev: f64, curr: f64) -> ChangeIndicator {
        if curr == 0.0 {
            return ChangeIndicator::NoChange;
        }
        let Some(pct) = percent_change(prev, curr) else {
            return ChangeIndicator::NoChange;
        };
        if pct.abs() < self.epsilon {
            ChangeIndicator::Flat
        } else if pct > 0.0 {
            ChangeIndicator::Up(pct)
        } else {
            ChangeIndicator::Down(-pct)
        }
    }

    /// Change between the two newest samples of `series`.
    pub fn change(&self, series: &SeriesBuffer) -> ChangeIndicator {
        match series.last_two() {
            Some((prev, curr)) => self.classify(prev, curr),
            None => ChangeIndicator::NoChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricKey;
    use crate::store::RollingSeriesStore;

    #[test]
    fn rising_value_reports_up_arrow() {
        let calc = ChangeCalculator::default();
        let change = calc.classify(0.80, 0.84);
        assert!(matches!(change, ChangeIndicator::Up(p) if (p - 5.0).abs() < 1e-9));
        assert_eq!(change.to_string(), "↑ 5.0%");
    }

    #[test]
    fn falling_value_reports_absolute_magnitude() {
        let calc = ChangeCalculator::default();
        let change = calc.classify(0.90, 0.81);
        assert_eq!(change.to_string(), "↓ 10.0%");
        assert!((change.percent().unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_previous_is_no_change() {
        let calc = ChangeCalculator::default();
        assert_eq!(calc.classify(0.0, 0.85), ChangeIndicator::NoChange);
        assert_eq!(percent_change(0.0, 1.0), None);
    }

    #[test]
    fn zero_current_is_no_change() {
        let calc = ChangeCalculator::default();
        assert_eq!(calc.classify(0.85, 0.0), ChangeIndicator::NoChange);
    }

    #[test]
    fn tiny_drift_is_flat() {
        let calc = ChangeCalculator::default();
        let change = calc.classify(1.0, 1.00005);
        assert_eq!(change, ChangeIndicator::Flat);
        assert!(!change.is_directional());
        assert_eq!(change.to_string(), "—");
    }

    #[test]
    fn change_is_invariant_under_positive_scaling() {
        let calc = ChangeCalculator::default();
        let pairs = [(0.8, 0.84), (120.0, 90.0), (3.0, 3.3), (512.0, 700.0)];
        for (prev, curr) in pairs {
            let base = calc.classify(prev, curr).percent().unwrap();
            for k in [0.001, 0.5, 2.0, 1000.0] {
                let scaled = calc.classify(prev * k, curr * k).percent().unwrap();
                assert!((base - scaled).abs() < 1e-9, "{prev}->{curr} scaled by {k}");
            }
        }
    }

    #[test]
    fn short_series_is_no_change() {
        let calc = ChangeCalculator::default();
        let mut store = RollingSeriesStore::new(5);
        assert_eq!(calc.change(store.buffer(MetricKey::Cpu)), ChangeIndicator::NoChange);
        store.record(MetricKey::Cpu, 40.0);
        assert_eq!(calc.change(store.buffer(MetricKey::Cpu)), ChangeIndicator::NoChange);
        store.record(MetricKey::Cpu, 60.0);
        assert_eq!(calc.change(store.buffer(MetricKey::Cpu)).to_string(), "↑ 50.0%");
    }

    #[test]
    fn only_last_two_points_matter() {
        let calc = ChangeCalculator::default();
        let mut store = RollingSeriesStore::new(5);
        for v in [1.0, 100.0, 50.0, 55.0] {
            store.record(MetricKey::Memory, v);
        }
        assert_eq!(calc.change(store.buffer(MetricKey::Memory)).to_string(), "↑ 10.0%");
    }

    #[test]
    fn invalid_epsilon_falls_back_to_default() {
        assert_eq!(ChangeCalculator::new(-1.0).epsilon(), DEFAULT_EPSILON);
        assert_eq!(ChangeCalculator::new(f64::NAN).epsilon(), DEFAULT_EPSILON);
        assert_eq!(ChangeCalculator::new(0.5).epsilon(), 0.5);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(ChangeIndicator::Up(5.0)).unwrap();
        assert_eq!(json["kind"], "up");
        assert_eq!(json["percent"], 5.0);
        let json = serde_json::to_value(ChangeIndicator::NoData).unwrap();
        assert_eq!(json["kind"], "no_data");
    }
}
