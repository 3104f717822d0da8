//! TUI rendering.
//!
//! ┌──────────────────────────────────────────────────────┐
//! │  modelwatch   Connected • Live data   #42   2000ms   │
//! ├────────────┬────────────┬────────────┬───────────────┤
//! │ Accuracy   │ Precision  │ Recall     │ F1 Score      │
//! │ 0.8512     │ 0.8311     │ 0.8790     │ 0.8547        │
//! │ ↑ 1.2%     │ ↓ 0.4%     │ —          │ ↑ 0.3%        │
//! ├────────────┴────────────┴──┬─────────┴───────────────┤
//! │  ╭ Model performance       │  Predictions   1234     │
//! │  │  ~~~~~~~~~~~~           │  Errors          61     │
//! │  ╰──────────────────────── │  CPU %         47.3     │
//! │                            │  Memory (MB)  512.8     │
//! ├────────────────────────────┴─────────────────────────┤
//! │  [critical] ModelAccuracyLow: accuracy below 0.8     │
//! ├──────────────────────────────────────────────────────┤
//! │  c: chart   p: pause   e: export   q: quit           │
//! └──────────────────────────────────────────────────────┘

use super::app::App;
use ratatui::{prelude::*, widgets::*};

use modelwatch_core::{ChangeIndicator, MetricKey, Severity, Snapshot};

const SERIES_COLORS: [Color; 4] = [Color::Cyan, Color::Yellow, Color::Green, Color::Magenta];

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(5), // quality cards
            Constraint::Min(10),   // chart + table
            Constraint::Length(6), // alerts
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);

    match app.snapshot() {
        Some(snapshot) => {
            draw_cards(f, rows[1], snapshot);
            draw_main(f, rows[2], app, snapshot);
            draw_alerts(f, rows[3], snapshot);
        }
        None => {
            let waiting = format!("Waiting for first snapshot from {} ...", app.backend_url());
            let p = Paragraph::new(waiting)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            let area = Rect {
                height: rows[1].height + rows[2].height + rows[3].height,
                ..rows[1]
            };
            f.render_widget(p, area);
        }
    }

    draw_keys(f, rows[4], app);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let (status, color, seq) = match app.snapshot() {
        Some(s) if s.status().is_connected() => (s.status().label(), Color::Green, s.sequence()),
        Some(s) => (s.status().label(), Color::Red, s.sequence()),
        None => ("Connecting", Color::DarkGray, 0),
    };
    let paused = if app.is_paused() { "  PAUSED" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" modelwatch ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(format!("  {status}"), Style::default().bold().fg(color)),
            Span::styled(
                format!(
                    "  #{seq}  {}ms  {}",
                    app.refresh().as_millis(),
                    app.backend_url()
                ),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(paused, Style::default().bold().fg(Color::Yellow)),
            Span::raw(" "),
        ]));

    f.render_widget(block, area);
}

fn change_color(change: ChangeIndicator) -> Color {
    match change {
        ChangeIndicator::Up(_) => Color::Green,
        ChangeIndicator::Down(_) => Color::Red,
        _ => Color::DarkGray,
    }
}

fn draw_cards(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (key, col) in MetricKey::QUALITY.into_iter().zip(cols.iter()) {
        let reading = snapshot.reading(key);
        let text = vec![
            Line::from(Span::styled(
                reading.display_value(),
                Style::default().bold().fg(Color::White),
            )),
            Line::from(Span::styled(
                reading.display_change(),
                Style::default().fg(change_color(reading.change)),
            )),
        ];
        let p = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", key.label())),
        );
        f.render_widget(p, *col);
    }
}

fn draw_main(f: &mut Frame, area: Rect, app: &App, snapshot: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    draw_chart(f, cols[0], app, snapshot);
    draw_table(f, cols[1], snapshot);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App, snapshot: &Snapshot) {
    let panel = app.panel();
    let keys = panel.keys();

    let points: Vec<Vec<(f64, f64)>> = keys
        .iter()
        .map(|&k| {
            snapshot
                .window(k)
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v))
                .collect()
        })
        .collect();
    let windows: Vec<&[f64]> = keys.iter().map(|&k| snapshot.window(k)).collect();
    let (y_min, y_max) = panel.y_bounds(&windows);
    let len = windows.iter().map(|w| w.len()).max().unwrap_or(0);
    let x_max = (len as f64).max(10.0);

    let datasets: Vec<Dataset> = keys
        .iter()
        .zip(points.iter())
        .zip(SERIES_COLORS.iter())
        .map(|((key, data), color)| {
            Dataset::default()
                .name(key.label())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(data)
        })
        .collect();

    let x_labels = vec![Line::from("0"), Line::from(format!("{len}"))];
    let y_labels = vec![
        Line::from(format!("{y_min:.2}")),
        Line::from(format!("{y_max:.2}")),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}  (last {len}) ", panel.label())),
        )
        .x_axis(Axis::default().bounds([0.0, x_max]).labels(x_labels))
        .y_axis(Axis::default().bounds([y_min, y_max]).labels(y_labels));

    f.render_widget(chart, area);
}

fn draw_table(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let rows: Vec<Row> = [
        MetricKey::Predictions,
        MetricKey::Errors,
        MetricKey::Cpu,
        MetricKey::Memory,
    ]
    .into_iter()
    .map(|key| {
        let reading = snapshot.reading(key);
        Row::new(vec![
            Cell::from(key.label()),
            Cell::from(reading.display_value()),
            Cell::from(reading.display_change())
                .style(Style::default().fg(change_color(reading.change))),
        ])
    })
    .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(8),
            Constraint::Length(9),
        ],
    )
    .header(Row::new(vec!["Metric", "Value", "Change"]).style(Style::default().bold()))
    .block(Block::default().borders(Borders::ALL).title(" System "));

    f.render_widget(table, area);
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    }
}

fn draw_alerts(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let alerts = snapshot.alerts();
    let lines: Vec<Line> = if alerts.is_empty() {
        vec![Line::from(Span::styled(
            "No active alerts",
            Style::default().fg(Color::Green),
        ))]
    } else {
        alerts
            .alerts()
            .iter()
            .map(|a| {
                Line::from(vec![
                    Span::styled(
                        format!("[{}] ", a.severity),
                        Style::default().bold().fg(severity_color(a.severity)),
                    ),
                    Span::styled(a.name.clone(), Style::default().bold()),
                    Span::raw(format!(": {}", a.description)),
                ])
            })
            .collect()
    };

    let title = match alerts.highest() {
        Some(top) => format!(" Alerts ({}, highest {top}) ", alerts.len()),
        None => " Alerts ".to_string(),
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect, app: &App) {
    let mut text = String::from(" c: chart   p: pause   e: export snapshot   q: quit");
    if let Some(err) = app.export_error() {
        text.push_str(&format!("   export failed: {err}"));
    } else if let Some(path) = app.last_export() {
        text.push_str(&format!("   saved {}", path.display()));
    }
    let bar = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
