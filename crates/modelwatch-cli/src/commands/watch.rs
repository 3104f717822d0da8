use std::time::Duration;

use modelwatch_core::{run_viewer, snapshot_channel};

use super::{CommandResult, Shutdown, ViewerOverrides};

pub fn run(overrides: &ViewerOverrides) -> CommandResult {
    let config = overrides.resolve();
    let assembler = super::make_assembler(&config)?;
    let (publisher, feed) = snapshot_channel();

    let rt = super::runtime()?;
    let shutdown = Shutdown::new();
    let viewer = rt.spawn(run_viewer(
        assembler,
        config.refresh,
        publisher,
        shutdown.wait(),
    ));

    let mut app = crate::tui::app::App::new(feed, config.backend_url.as_str(), config.refresh);
    let result = app.run();

    shutdown.trigger();
    rt.block_on(super::join_logged("viewer", viewer));
    rt.shutdown_timeout(Duration::from_secs(1));

    result.map_err(|e| format!("TUI error: {e}").into())
}
