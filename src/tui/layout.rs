//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Row, Sparkline, Table};

use super::runtime::App;
use super::style;
use crate::sim::types::WateringMode;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(3), // tank gauges
            Constraint::Min(7),    // pumps + consumers
            Constraint::Length(6), // power
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_tanks(frame, app, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    render_pumps(frame, app, middle[0]);
    render_consumers(frame, app, middle[1]);

    render_power(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

/// Header bar: scenario name, tick, mode, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };
    let snap = &app.latest;
    let mode_style = if snap.mode == WateringMode::Off {
        Style::default().fg(style::MODE_OFF).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let header = Line::from(vec![
        Span::styled(
            " AQUAFLOW ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            &app.scenario_name,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" │ t={} ({:.0}s) │ mode=", snap.tick, snap.elapsed_s)),
        Span::styled(snap.mode.as_str().to_uppercase(), mode_style),
        Span::raw(format!(
            " │ {}ms │ {} {} ",
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// One gauge per tank.
fn render_tanks(frame: &mut Frame, app: &App, area: Rect) {
    let tanks = &app.latest.tanks;
    if tanks.is_empty() {
        return;
    }
    let n = tanks.len() as u32;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..n).map(|_| Constraint::Ratio(1, n)))
        .split(area);

    for (tank, chunk) in tanks.iter().zip(chunks.iter()) {
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(format!(" {} ({:.0} L) ", tank.id, tank.capacity_liters))
                    .borders(Borders::ALL),
            )
            .gauge_style(Style::default().fg(style::level_color(tank.level_percent)))
            .ratio((tank.level_percent / 100.0).clamp(0.0, 1.0))
            .label(format!("{:.1}%  {:.0} L", tank.level_percent, tank.liters));
        frame.render_widget(gauge, *chunk);
    }
}

/// Pump run state and thresholds.
fn render_pumps(frame: &mut Frame, app: &App, area: Rect) {
    let plant = app.engine().plant();
    let lines: Vec<Line> = plant
        .pumps
        .iter()
        .map(|pump| {
            let color = if pump.is_on {
                style::PUMP_ON
            } else {
                style::PUMP_OFF
            };
            let gate = pump
                .control
                .min_source
                .map(|g| format!(" src>{g:.0}%"))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!(" {:<8}", pump.status_label()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "{} → {}  on<{:.0}% off>{:.0}%{}",
                    pump.id,
                    plant.tanks[pump.feeds].id,
                    pump.control.on_below,
                    pump.control.off_above,
                    gate,
                )),
            ])
        })
        .collect();

    let block = Block::default().title(" Pumps ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Per-consumer flow, usage and bill.
fn render_consumers(frame: &mut Frame, app: &App, area: Rect) {
    let snap = &app.latest;
    let mut rows: Vec<Row> = snap
        .consumers
        .iter()
        .map(|c| {
            Row::new(vec![
                c.id.clone(),
                format!("{:.2}", c.flow_rate_lpm),
                format!("{:.1}", c.daily_usage_liters),
                format!("{:.0}", c.monthly_usage_liters),
                format!("{:.2}", c.current_bill),
            ])
        })
        .collect();
    rows.push(
        Row::new(vec![
            "total".to_string(),
            format!("{:.2}", snap.total_flow_lpm),
            format!("{:.1}", snap.total_usage_liters),
            String::new(),
            format!("{:.2}", snap.total_bill),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let widths = [
        Constraint::Min(10),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["consumer", "L/min", "used L", "month L", "bill"])
                .style(Style::default().add_modifier(Modifier::UNDERLINED)),
        )
        .block(Block::default().title(" Consumers ").borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Rolling power sparkline with the current cost rate.
fn render_power(frame: &mut Frame, app: &App, area: Rect) {
    let power = app.latest.power;
    let bars = style::sparkline_bars(app.history.iter().map(|s| s.power.total_kw));
    let title = format!(
        " Power {:.2} kW │ {:.2}/h │ {:.4}/min ",
        power.total_kw, power.cost_per_hour, power.cost_per_minute
    );
    let sparkline = Sparkline::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(style::POWER_COLOR))
        .data(&bars);
    frame.render_widget(sparkline, area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  o/f/a:Mode  b:Reset bills  1/2:Preset  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
