//! Abstract metric source trait and its error type.
//!
//! Every backend implements [`MetricSource`], which answers two questions: what
//! is the current value of a named metric, and which alerts exist right now.
//! The assembler treats every error as "no value" for that key.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::alerts::RawAlert;

/// Why a single fetch produced no value.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("backend returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("backend reported status '{0}'")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no series matched '{0}'")]
    Empty(String),
}

/// Instantaneous metric and alert lookups against a time-series backend.
pub trait MetricSource {
    /// Current value of the series named `metric`.
    fn fetch_value(&self, metric: &str) -> impl Future<Output = Result<f64, SourceError>> + Send;

    /// Every alert the backend knows about, firing or not.
    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<RawAlert>, SourceError>> + Send;
}

impl<S: MetricSource + Sync> MetricSource for &S {
    fn fetch_value(&self, metric: &str) -> impl Future<Output = Result<f64, SourceError>> + Send {
        (**self).fetch_value(metric)
    }

    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<RawAlert>, SourceError>> + Send {
        (**self).fetch_alerts()
    }
}
