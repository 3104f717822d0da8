//! HTTP endpoints for modelwatch.
//!
//! Two routers live here:
//! - [`simulator_router`]: the scrape target the Prometheus server pulls
//!   simulated model metrics from (`/metrics`).
//! - [`snapshot_router`]: a read-only JSON view of the newest viewer
//!   snapshot (`/api/v1/snapshot`), for renderers that are not the TUI.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use log::{error, info};
use serde::Serialize;

use modelwatch_core::{MetricKey, MetricsExporter, Snapshot, SnapshotFeed};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cycles: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sequence: Option<u64>,
}

#[derive(Serialize)]
struct ReadingView {
    key: MetricKey,
    label: &'static str,
    value: String,
    change: String,
}

#[derive(Serialize)]
struct SnapshotResponse<'a> {
    status_label: &'static str,
    display: Vec<ReadingView>,
    snapshot: &'a Snapshot,
}

impl<'a> SnapshotResponse<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        let display = snapshot
            .readings()
            .iter()
            .filter(|r| r.key.query_name().is_some())
            .map(|r| ReadingView {
                key: r.key,
                label: r.key.label(),
                value: r.display_value(),
                change: r.display_change(),
            })
            .collect();
        Self {
            status_label: snapshot.status().label(),
            display,
            snapshot,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

async fn handle_metrics(State(exporter): State<Arc<MetricsExporter>>) -> Response {
    match exporter.render() {
        Ok(body) => ([(header::CONTENT_TYPE, exporter.content_type())], body).into_response(),
        Err(e) => {
            error!("failed to render metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn handle_simulator_health(
    State(exporter): State<Arc<MetricsExporter>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cycles: Some(exporter.cycles()),
        last_sequence: None,
    })
}

async fn handle_simulator_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "modelwatch simulator",
        "version": modelwatch_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/metrics": "Prometheus text exposition of the simulated model metrics",
            "/health": "Health check",
        },
    }))
}

/// Router serving the simulator's scrape target.
pub fn simulator_router(exporter: Arc<MetricsExporter>) -> Router {
    Router::new()
        .route("/", get(handle_simulator_index))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_simulator_health))
        .with_state(exporter)
}

// ---------------------------------------------------------------------------
// Viewer snapshot
// ---------------------------------------------------------------------------

async fn handle_snapshot(State(feed): State<SnapshotFeed>) -> Response {
    match feed.latest() {
        Some(snapshot) => Json(SnapshotResponse::new(&snapshot)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "no snapshot assembled yet" })),
        )
            .into_response(),
    }
}

async fn handle_viewer_health(State(feed): State<SnapshotFeed>) -> Json<HealthResponse> {
    let latest = feed.latest();
    Json(HealthResponse {
        status: match &latest {
            Some(s) if s.status().is_connected() => "ok",
            Some(_) => "disconnected",
            None => "starting",
        },
        cycles: None,
        last_sequence: latest.map(|s| s.sequence()),
    })
}

async fn handle_viewer_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "modelwatch viewer",
        "version": modelwatch_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/api/v1/snapshot":
                "Newest snapshot: values, changes, history windows and firing alerts",
            "/health": "Health check",
        },
    }))
}

/// Router exposing the newest snapshot from `feed`.
pub fn snapshot_router(feed: SnapshotFeed) -> Router {
    Router::new()
        .route("/", get(handle_viewer_index))
        .route("/api/v1/snapshot", get(handle_snapshot))
        .route("/health", get(handle_viewer_health))
        .with_state(feed)
}

/// Bind `host:port` and serve `router` until `shutdown` resolves.
pub async fn serve<F>(router: Router, host: &str, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
