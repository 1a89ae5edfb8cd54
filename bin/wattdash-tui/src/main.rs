//! ---
//! wd_section: "12-terminal-ui"
//! wd_subsection: "binary"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Terminal dashboard rendering the live telemetry state."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Sparkline};
use ratatui::{symbols, Frame, Terminal};
use tracing::warn;
use url::Url;
use wattdash_common::config::DashboardConfig;
use wattdash_common::logging::init_file_tracing;
use wattdash_core::{
    axis_label, consumption_series, forecast_series, panel_view, AnomalyStatus, ConnectionState,
    DashboardController, DashboardHandle, DashboardState, PanelView,
};

const CONFIG_CANDIDATES: [&str; 2] = ["wattdash.toml", "configs/wattdash.toml"];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Live household energy dashboard in a terminal UI"
)]
struct Cli {
    /// Configuration file (defaults to wattdash.toml / configs/wattdash.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the analytics backend base address
    #[arg(long)]
    backend_url: Option<Url>,
    /// Override the telemetry poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_file_tracing("wattdash-tui", &config.logging)?;

    let tick_interval = config.ui.tick_interval;
    let controller = DashboardController::new(config, None)?;
    let handle = controller.start().await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &handle, tick_interval).await;
    cleanup_terminal(&mut terminal)?;
    handle.shutdown().await?;

    if let Err(err) = result {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DashboardConfig> {
    let loaded = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            DashboardConfig::load_with_source(&[path.clone()])?
        }
        None => DashboardConfig::load_with_source(&CONFIG_CANDIDATES)?,
    };
    let mut config = loaded.config;
    if let Some(url) = &cli.backend_url {
        config.backend.base_url = url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.backend.poll_interval = Duration::from_millis(interval_ms);
    }
    config.validate()?;
    Ok(config)
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    handle: &DashboardHandle,
    tick_interval: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick_interval.max(Duration::from_millis(50)));

    loop {
        let snapshot = handle.snapshot();
        terminal.draw(|frame| draw_ui(frame, &snapshot))?;

        tokio::select! {
            _ = ticker.tick() => {
                // redraw with a fresh snapshot
            }
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => {
                    if should_quit(&key) {
                        break;
                    }
                }
                Some(Ok(Event::Resize(_, _))) => {
                    // redraw with new geometry
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(error = %err, "terminal event stream error");
                }
                None => break,
            }
        }
    }
    Ok(())
}

fn should_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
}

fn draw_ui(frame: &mut Frame, state: &DashboardState) {
    let view = panel_view(state.current.as_ref());
    let PanelView::Ready { appliances, anomaly } = &view else {
        draw_splash(frame, state);
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(10),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_header(frame, layout[0], state);

    // status cards
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(layout[1]);

    let watts = state
        .current
        .as_ref()
        .map(|sample| format!("{:.0} W", sample.total_consumption))
        .unwrap_or_else(|| "--".to_owned());
    let load_card = Paragraph::new(vec![
        Line::from(Span::styled(
            watts,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "aggregate draw",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Current Load"));
    frame.render_widget(load_card, cards[0]);

    let (anomaly_style, anomaly_headline) = match anomaly.status {
        AnomalyStatus::Alert => (
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            format!("{}: {}", anomaly.status.as_str(), anomaly.message),
        ),
        AnomalyStatus::Safe => (
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            anomaly.status.as_str().to_owned(),
        ),
    };
    let anomaly_card = Paragraph::new(vec![
        Line::from(Span::styled(anomaly_headline, anomaly_style)),
        Line::from(Span::styled(
            format!("z-score deviation: {}", anomaly.deviation_display),
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Anomaly Status"));
    frame.render_widget(anomaly_card, cards[1]);

    let appliance_card = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{} / {}", appliances.running_count, appliances.total_count),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "appliances running",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("NILM"));
    frame.render_widget(appliance_card, cards[2]);

    // charts
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[2]);
    draw_consumption_chart(frame, charts[0], state);
    draw_forecast_chart(frame, charts[1], state);

    // appliance breakdown
    let items: Vec<ListItem> = appliances
        .rows
        .iter()
        .map(|row| {
            let (dot, style) = if row.running {
                ("●", Style::default().fg(Color::Green))
            } else {
                ("○", Style::default().fg(Color::DarkGray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{dot} "), style),
                Span::styled(format!("{:<16}", row.name), style),
                Span::styled(format!("{:>8.0} W  ", row.power_draw), style),
                Span::styled(
                    if row.running { "Running" } else { "Off" },
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Real-Time Disaggregation (NILM)"),
    );
    frame.render_widget(list, layout[3]);

    let help = Paragraph::new("q quit").style(Style::default().fg(Color::Gray));
    frame.render_widget(help, layout[4]);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let (status_style, status_label) = connection_badge(state.connection);
    let mut spans = vec![
        Span::styled(
            "WattDash",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  household energy telemetry   "),
        Span::styled(status_label, status_style),
    ];
    if let Some(error) = &state.last_error {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn connection_badge(connection: ConnectionState) -> (Style, &'static str) {
    match connection {
        ConnectionState::Initializing => (Style::default().fg(Color::Yellow), "INITIALIZING"),
        ConnectionState::Live => (
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            "LIVE",
        ),
        ConnectionState::Degraded => (
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            "DEGRADED",
        ),
    }
}

fn draw_consumption_chart(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let series = consumption_series(&state.history);
    let values: Vec<u64> = series.iter().map(|point| point.value.max(0.0) as u64).collect();
    let title = match series.last() {
        Some(latest) => format!("Live Consumption (last sample {})", latest.label),
        None => "Live Consumption".to_owned(),
    };
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Cyan))
        .data(&values);
    frame.render_widget(sparkline, area);
}

fn draw_forecast_chart(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let series = forecast_series(&state.forecast);
    if series.is_empty() {
        let placeholder = Paragraph::new("forecast unavailable")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("24h Forecast"));
        frame.render_widget(placeholder, area);
        return;
    }

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(index, point)| (index as f64, point.value))
        .collect();
    let max_value = series.iter().map(|point| point.value).fold(0.0_f64, f64::max);
    let labels: Vec<Span> = series
        .iter()
        .enumerate()
        .filter_map(|(index, point)| axis_label(index, point))
        .map(Span::raw)
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Magenta))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title("24h Forecast"))
        .x_axis(
            Axis::default()
                .bounds([0.0, (series.len().saturating_sub(1)) as f64])
                .labels(labels),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, max_value * 1.1])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", max_value * 1.1)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn draw_splash(frame: &mut Frame, state: &DashboardState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(4),
            Constraint::Percentage(40),
        ])
        .split(frame.size());

    let mut lines = vec![Line::from(Span::styled(
        "Initializing WattDash…",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(error) = &state.last_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "waiting for the first telemetry sample",
            Style::default().fg(Color::Gray),
        )));
    }
    let splash = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(splash, layout[1]);
}
