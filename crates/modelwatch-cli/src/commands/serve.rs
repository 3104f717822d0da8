use modelwatch_core::{run_viewer, snapshot_channel};

use super::{CommandResult, Shutdown, ViewerOverrides};

/// Headless viewer: poll the backend and expose each snapshot over HTTP.
pub fn run(host: &str, overrides: &ViewerOverrides) -> CommandResult {
    let config = overrides.resolve();
    let assembler = super::make_assembler(&config)?;

    let base = format!("http://{host}:{}", config.port);
    println!("modelwatch viewer v{}", modelwatch_core::VERSION);
    println!("   {base}");
    println!(
        "   polling {} every {}ms",
        config.backend_url,
        config.refresh.as_millis()
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /                  API index");
    println!("     GET /api/v1/snapshot   Newest snapshot (503 until the first tick)");
    println!("     GET /health            Viewer health");
    println!();
    println!("   Example:");
    println!("     curl {base}/api/v1/snapshot");
    println!();

    let (publisher, feed) = snapshot_channel();

    let rt = super::runtime()?;
    rt.block_on(async {
        let shutdown = Shutdown::new();
        shutdown.on_ctrl_c();

        let viewer = tokio::spawn(run_viewer(
            assembler,
            config.refresh,
            publisher,
            shutdown.wait(),
        ));
        let router = modelwatch_server::snapshot_router(feed);
        let served = modelwatch_server::serve(router, host, config.port, shutdown.wait()).await;

        shutdown.trigger();
        super::join_logged("viewer", viewer).await;
        served
    })?;
    Ok(())
}
