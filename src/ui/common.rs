//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay and
//! the number formatting used by every table.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_duration;
use crate::data::history::normalize_levels;
use crate::data::HealthStatus;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Number of samples shown in a sparkline cell.
pub const SPARKLINE_WIDTH: usize = 8;

/// Render the header bar with a cluster-wide overview.
///
/// Displays: status indicator, resource counts by health, connection count,
/// combined throughput and total out-of-sync data.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref data) = app.data else {
        let line = Line::from(vec![
            Span::styled(" BLOCKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Waiting for events..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let (healthy, warning, critical) = app.health_counts();
    let out_of_sync: i64 = data.resources.values().map(|r| r.out_of_sync_kib()).sum();

    let status_style = if critical > 0 {
        app.theme.status_style(HealthStatus::Critical)
    } else if warning > 0 {
        app.theme.status_style(HealthStatus::Warning)
    } else {
        app.theme.status_style(HealthStatus::Healthy)
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("BLOCKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(format!("{}", healthy), Style::default().fg(app.theme.healthy)),
        Span::raw(" ok "),
        count_span(warning, Style::default().fg(app.theme.warning)),
        Span::raw(" warn "),
        count_span(
            critical,
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" crit │ "),
        Span::styled(
            format!("{}", data.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" resources "),
        Span::raw(format!("{} connections │ ", data.connection_count())),
        Span::raw(format!(
            "R:{} W:{}",
            format_rate(data.read_per_second()),
            format_rate(data.write_per_second())
        )),
        Span::raw(" │ OOS:"),
        if out_of_sync > 0 {
            Span::styled(format_kib(out_of_sync), app.theme.out_of_sync_style(out_of_sync))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn count_span(n: usize, style: Style) -> Span<'static> {
    if n > 0 {
        Span::styled(format!("{}", n), style)
    } else {
        Span::styled("0", Style::default().add_modifier(Modifier::DIM))
    }
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let degraded = app.degraded_peer_count();
    let replication = if degraded > 0 {
        format!(" 2:Replication ({}) ", degraded)
    } else {
        " 2:Replication ".to_string()
    };
    let titles: Vec<Line> = vec![Line::from(" 1:Resources "), Line::from(replication)];

    let selected = match app.current_view {
        View::Resources => 0,
        View::Replication => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, ingest counters, time since last refresh and the controls
/// for the current view. Temporary messages take priority.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(updated) = app.last_updated {
        let (applied, errors) = app.ingest_counts();
        let ingest = if errors > 0 {
            format!("{} events, {} rejected", applied, errors)
        } else {
            format!("{} events", applied)
        };

        let controls = if app.filter_active {
            "Type to search | Enter:apply Esc:cancel"
        } else {
            "/:search s:sort S:reverse Tab:switch Enter:detail ?:help q:quit"
        };

        let source_error = app
            .load_error
            .as_ref()
            .map(|e| format!(" | {}", e))
            .unwrap_or_default();

        format!(
            " {} > {}{} | {} | Updated {} ago | {}",
            app.source_description(),
            app.current_view.label(),
            source_error,
            ingest,
            format_duration(updated.elapsed()),
            controls,
        )
    } else if let Some(ref err) = app.load_error {
        format!(" {} | Error: {} | r:retry q:quit", app.source_description(), err)
    } else {
        format!(" {} | Loading... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  1/2         Jump to view"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Resource detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Tables"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export snapshot to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 25u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Format a KiB amount with binary suffixes (e.g. 2048 -> "2.0M").
pub fn format_kib(kib: i64) -> String {
    let abs = kib.unsigned_abs() as f64;
    let sign = if kib < 0 { "-" } else { "" };
    if abs >= 1024.0 * 1024.0 * 1024.0 {
        format!("{}{:.1}T", sign, abs / (1024.0 * 1024.0 * 1024.0))
    } else if abs >= 1024.0 * 1024.0 {
        format!("{}{:.1}G", sign, abs / (1024.0 * 1024.0))
    } else if abs >= 1024.0 {
        format!("{}{:.1}M", sign, abs / 1024.0)
    } else {
        format!("{}{}K", sign, kib.unsigned_abs())
    }
}

/// Format a KiB/s rate; idle rates render as "-".
pub fn format_rate(per_second: f64) -> String {
    if per_second <= 0.0 || !per_second.is_finite() {
        "-".to_string()
    } else {
        format!("{}/s", format_kib(per_second.round() as i64))
    }
}

/// Render the newest samples as a fixed-width sparkline.
pub fn render_sparkline(samples: &[f64]) -> String {
    let start = samples.len().saturating_sub(SPARKLINE_WIDTH);
    let levels = normalize_levels(&samples[start..]);
    if levels.is_empty() {
        return " ".repeat(SPARKLINE_WIDTH);
    }
    levels.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}

/// Show "-" for states the subsystem has not reported.
pub fn or_dash(state: &str) -> &str {
    if state.is_empty() {
        "-"
    } else {
        state
    }
}
