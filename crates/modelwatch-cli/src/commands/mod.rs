pub mod poll;
pub mod serve;
pub mod simulate;
pub mod watch;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::sync::watch as signal_channel;
use tokio::task::JoinHandle;

use modelwatch_core::{
    ChangeCalculator, PrometheusSource, RollingSeriesStore, SnapshotAssembler, SourceError,
    ViewerConfig,
};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Viewer flags shared by `serve`, `watch` and `poll`. Unset flags keep the
/// environment/default value.
#[derive(Debug, Default, Clone)]
pub struct ViewerOverrides {
    pub prom_url: Option<String>,
    pub port: Option<u16>,
    pub refresh_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl ViewerOverrides {
    pub fn resolve(&self) -> ViewerConfig {
        let mut config = ViewerConfig::from_env();
        if let Some(url) = &self.prom_url {
            config.backend_url = url.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ms) = self.refresh_ms {
            config.refresh = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = self.timeout_ms {
            config.fetch_timeout = Duration::from_millis(ms.max(1));
        }
        config
    }
}

/// Build an assembler polling the configured Prometheus server.
pub fn make_assembler(
    config: &ViewerConfig,
) -> Result<SnapshotAssembler<PrometheusSource>, SourceError> {
    let source = PrometheusSource::new(config.backend_url.as_str(), config.fetch_timeout)?;
    Ok(
        SnapshotAssembler::new(source, RollingSeriesStore::new(config.history))
            .with_calculator(ChangeCalculator::new(config.epsilon))
            .with_fetch_timeout(config.fetch_timeout),
    )
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// Wait for a background task, logging a panic or cancellation instead of
/// dropping it. Returns whether the task finished normally.
pub async fn join_logged(name: &str, task: JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!("{name} task failed: {e}");
            false
        }
    }
}

/// One-shot stop signal that any number of tasks can wait on.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<signal_channel::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = signal_channel::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    /// Trigger on Ctrl-C. Must be called inside a runtime.
    pub fn on_ctrl_c(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
            }
            this.trigger();
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
