//! Prometheus HTTP API client.
//!
//! Two endpoints are used:
//! - `GET /api/v1/query?query=<name>` for instantaneous values,
//! - `GET /api/v1/alerts` for the alert list.
//!
//! Every request is bounded by the configured timeout. Anything other than a
//! 2xx `success` response carrying a finite value is a [`SourceError`].

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::alerts::RawAlert;
use crate::source::{MetricSource, SourceError};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<VectorSample>,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    /// `[unix_seconds, "value"]`
    value: (f64, String),
}

#[derive(Debug, Deserialize)]
struct AlertsData {
    #[serde(default)]
    alerts: Vec<RawAlert>,
}

/// [`MetricSource`] backed by a Prometheus server.
#[derive(Debug, Clone)]
pub struct PrometheusSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl PrometheusSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        let parsed: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))?;
        unwrap_api(parsed)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Transport {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

fn unwrap_api<T>(response: ApiResponse<T>) -> Result<T, SourceError> {
    if response.status != "success" {
        return Err(SourceError::Rejected(
            response.error.unwrap_or(response.status),
        ));
    }
    response
        .data
        .ok_or_else(|| SourceError::Malformed("missing data field".into()))
}

/// First sample of an instant-vector result as a finite number.
fn first_value(metric: &str, data: QueryData) -> Result<f64, SourceError> {
    let sample = data
        .result
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::Empty(metric.to_string()))?;
    let raw = sample.value.1;
    let value: f64 = raw.trim().parse().map_err(|_| {
        SourceError::Malformed(format!("value '{raw}' for {metric} is not a number"))
    })?;
    if !value.is_finite() {
        return Err(SourceError::Malformed(format!("value '{raw}' for {metric} is not finite")));
    }
    Ok(value)
}

impl MetricSource for PrometheusSource {
    async fn fetch_value(&self, metric: &str) -> Result<f64, SourceError> {
        let data: QueryData = self.get("/api/v1/query", &[("query", metric)]).await?;
        first_value(metric, data)
    }

    async fn fetch_alerts(&self) -> Result<Vec<RawAlert>, SourceError> {
        let data: AlertsData = self.get("/api/v1/alerts", &[]).await?;
        Ok(data.alerts)
    }
}
