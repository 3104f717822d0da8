//! CLI for modelwatch: simulate model metrics, poll them back, and watch them live.

mod commands;
mod tui;

use clap::{Args, Parser, Subcommand};

use commands::ViewerOverrides;

#[derive(Parser)]
#[command(name = "modelwatch")]
#[command(about = "modelwatch — live model-quality monitoring over Prometheus")]
#[command(version = modelwatch_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ViewerArgs {
    /// Prometheus base URL (default: $PROM_URL or http://localhost:9090)
    #[arg(long)]
    prom_url: Option<String>,

    /// Tick period in milliseconds (default: $REFRESH_MS or 2000)
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Per-request timeout in milliseconds (default: $FETCH_TIMEOUT_MS or 5000)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl ViewerArgs {
    fn overrides(&self, port: Option<u16>) -> ViewerOverrides {
        ViewerOverrides {
            prom_url: self.prom_url.clone(),
            port,
            refresh_ms: self.refresh_ms,
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate plausible model metrics and expose them for scraping
    Simulate {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port for /metrics (default: 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Delay between generation cycles in milliseconds (default: 5000)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Seed for a reproducible value sequence
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Poll Prometheus continuously and serve the newest snapshot as JSON
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port for /api/v1/snapshot (default: $PORT or 10000)
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        viewer: ViewerArgs,
    },

    /// Live interactive dashboard (TUI)
    Watch {
        #[command(flatten)]
        viewer: ViewerArgs,
    },

    /// Run a few ticks and print each snapshot
    Poll {
        /// Number of ticks
        #[arg(long, default_value = "1")]
        ticks: u64,

        /// Print one JSON snapshot per line
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        viewer: ViewerArgs,
    },
}

fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = Cli::parse();

    // The dashboard owns the terminal; log lines would tear it.
    let default_filter = match cli.command {
        Commands::Watch { .. } => "off",
        _ => "info",
    };
    init_logging(default_filter);

    let result = match cli.command {
        Commands::Simulate {
            host,
            port,
            interval_ms,
            seed,
        } => commands::simulate::run(&host, port, interval_ms, seed),
        Commands::Serve { host, port, viewer } => {
            commands::serve::run(&host, &viewer.overrides(port))
        }
        Commands::Watch { viewer } => commands::watch::run(&viewer.overrides(None)),
        Commands::Poll {
            ticks,
            json,
            viewer,
        } => commands::poll::run(&viewer.overrides(None), ticks, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
