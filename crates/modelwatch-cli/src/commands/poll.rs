use std::fmt::Write as _;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use modelwatch_core::{MetricKey, Snapshot};

use super::{CommandResult, ViewerOverrides};

/// Run a fixed number of ticks and print each snapshot.
pub fn run(overrides: &ViewerOverrides, ticks: u64, json: bool) -> CommandResult {
    let config = overrides.resolve();
    let mut assembler = super::make_assembler(&config)?;

    let rt = super::runtime()?;
    rt.block_on(async {
        let mut ticker = tokio::time::interval(config.refresh.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for _ in 0..ticks.max(1) {
            ticker.tick().await;
            let snapshot = assembler.tick().await;
            if json {
                println!("{}", serde_json::to_string(&snapshot)?);
            } else {
                print!("{}", render_text(&snapshot));
            }
        }
        Ok::<_, serde_json::Error>(())
    })?;
    Ok(())
}

pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "#{}  {}",
        snapshot.sequence(),
        snapshot.status().label()
    );
    for reading in snapshot.readings() {
        if reading.key == MetricKey::Timestamp {
            continue;
        }
        let _ = writeln!(
            out,
            "  {:<12} {:>10}  {}",
            reading.key.label(),
            reading.display_value(),
            reading.display_change()
        );
    }
    let alerts = snapshot.alerts();
    if alerts.is_empty() {
        let _ = writeln!(out, "  no active alerts");
    } else {
        for alert in alerts.alerts() {
            let _ = writeln!(
                out,
                "  [{}] {}: {}",
                alert.severity, alert.name, alert.description
            );
        }
    }
    out.push('\n');
    out
}
