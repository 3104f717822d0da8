use std::sync::Arc;
use std::time::Duration;

use modelwatch_core::{MetricSimulator, MetricsExporter, SimulatorConfig, run_simulator};

use super::{CommandResult, Shutdown};

pub fn run(
    host: &str,
    port: Option<u16>,
    interval_ms: Option<u64>,
    seed: Option<u64>,
) -> CommandResult {
    let defaults = SimulatorConfig::default();
    let config = SimulatorConfig {
        port: port.unwrap_or(defaults.port),
        period: interval_ms
            .map(|ms| Duration::from_millis(ms.max(1)))
            .unwrap_or(defaults.period),
        seed,
    };

    let base = format!("http://{host}:{}", config.port);
    println!("modelwatch simulator v{}", modelwatch_core::VERSION);
    println!("   {base}");
    println!("   new cycle every {}ms", config.period.as_millis());
    if let Some(seed) = config.seed {
        println!("   seed {seed}");
    }
    println!();
    println!("   Endpoints:");
    println!("     GET /          API index");
    println!("     GET /metrics   Prometheus scrape target");
    println!("     GET /health    Cycle count");
    println!();

    let exporter = Arc::new(MetricsExporter::new()?);
    let simulator = MetricSimulator::new(config.seed);

    let rt = super::runtime()?;
    rt.block_on(async {
        let shutdown = Shutdown::new();
        shutdown.on_ctrl_c();

        let generator = tokio::spawn(run_simulator(
            simulator,
            exporter.clone(),
            config.period,
            shutdown.wait(),
        ));
        let router = modelwatch_server::simulator_router(exporter);
        let served = modelwatch_server::serve(router, host, config.port, shutdown.wait()).await;

        shutdown.trigger();
        super::join_logged("simulator", generator).await;
        served
    })?;
    Ok(())
}
