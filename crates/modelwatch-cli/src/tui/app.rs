//! TUI application state and event loop.
//!
//! Polling runs on the tokio runtime and publishes into a [`SnapshotFeed`];
//! the UI thread only ever reads the newest snapshot, so a slow terminal
//! never delays a tick.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use modelwatch_core::{MetricKey, Snapshot, SnapshotFeed};

// ---------------------------------------------------------------------------
// ChartPanel
// ---------------------------------------------------------------------------

/// Which group of series the chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPanel {
    #[default]
    Performance,
    Throughput,
    Resources,
}

impl ChartPanel {
    pub fn next(self) -> Self {
        match self {
            Self::Performance => Self::Throughput,
            Self::Throughput => Self::Resources,
            Self::Resources => Self::Performance,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Performance => "Model performance",
            Self::Throughput => "Predictions & errors",
            Self::Resources => "CPU & memory",
        }
    }

    pub fn keys(self) -> &'static [MetricKey] {
        match self {
            Self::Performance => &MetricKey::QUALITY,
            Self::Throughput => &[MetricKey::Predictions, MetricKey::Errors],
            Self::Resources => &[MetricKey::Cpu, MetricKey::Memory],
        }
    }

    /// Y axis bounds for the given series.
    pub fn y_bounds(self, series: &[&[f64]]) -> (f64, f64) {
        let mut values = series.iter().flat_map(|s| s.iter().copied());
        let Some(first) = values.next() else {
            return (0.0, 1.0);
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        match self {
            // Quality scores live in [0, 1]; zoom in but never past it.
            Self::Performance => ((min - 0.05).max(0.0), (max + 0.05).min(1.0)),
            _ => {
                let pad = ((max - min) * 0.1).max(1.0);
                ((min - pad).max(0.0), max + pad)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    feed: SnapshotFeed,
    shown: Option<Arc<Snapshot>>,
    backend_url: String,
    refresh: Duration,
    panel: ChartPanel,
    paused: bool,
    running: bool,
    last_export: Option<PathBuf>,
    export_error: Option<String>,
}

impl App {
    pub fn new(feed: SnapshotFeed, backend_url: impl Into<String>, refresh: Duration) -> Self {
        Self {
            feed,
            shown: None,
            backend_url: backend_url.into(),
            refresh,
            panel: ChartPanel::default(),
            paused: false,
            running: true,
            last_export: None,
            export_error: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if let Some(path) = &self.last_export {
            println!("Last snapshot exported to {}", path.display());
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.is_running() {
            self.refresh_from_feed();
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    /// Pick up the newest published snapshot unless paused.
    pub fn refresh_from_feed(&mut self) {
        if self.paused {
            return;
        }
        if let Some(latest) = self.feed.latest() {
            self.shown = Some(latest);
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('p') | KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('c') | KeyCode::Tab => self.panel = self.panel.next(),
            KeyCode::Char('e') => self.export_snapshot(),
            _ => {}
        }
    }

    fn export_snapshot(&mut self) {
        let Some(snapshot) = &self.shown else {
            self.export_error = Some("nothing to export yet".to_string());
            return;
        };
        let path = PathBuf::from(format!(
            "modelwatch-snapshot-{}-{}.json",
            snapshot.captured_unix_ms(),
            snapshot.sequence()
        ));
        match serde_json::to_string_pretty(snapshot.as_ref())
            .map_err(io::Error::from)
            .and_then(|contents| std::fs::write(&path, contents))
        {
            Ok(()) => {
                self.last_export = Some(path);
                self.export_error = None;
            }
            Err(e) => self.export_error = Some(e.to_string()),
        }
    }

    // --- Accessors ---

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.shown.as_deref()
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    pub fn panel(&self) -> ChartPanel {
        self.panel
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    pub fn export_error(&self) -> Option<&str> {
        self.export_error.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
