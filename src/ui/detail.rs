//! Detail overlay rendering.
//!
//! Displays a modal overlay with everything known about the selected
//! resource: its connections, local volumes, peer volumes and open issues.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::common::{format_kib, format_rate, or_dash};
use crate::app::App;
use crate::data::health::{
    connection_health, peer_volume_health, resource_health, resource_issues, volume_health,
};
use crate::data::HealthStatus;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 60;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 20;

/// Render the resource detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(resource) = app.selected_resource() else {
        return;
    };

    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let issues = resource_issues(resource);
    let issues_height = (issues.len().max(1) as u16 + 2).min(8);

    let chunks = Layout::vertical([
        Constraint::Length(5),             // Header
        Constraint::Min(4),                // Connections
        Constraint::Min(4),                // Volumes
        Constraint::Min(4),                // Peer volumes
        Constraint::Length(issues_height), // Issues
        Constraint::Length(1),             // Footer
    ])
    .split(overlay_area);

    // ===== HEADER =====
    let health = resource_health(resource);
    let health_label = match health {
        HealthStatus::Healthy => "Healthy",
        HealthStatus::Warning => "Warning",
        HealthStatus::Critical => "Critical",
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let header_lines = vec![
        Line::from(vec![Span::styled(format!(" {} ", resource.name), bold)]),
        Line::from(vec![
            Span::raw(" Role: "),
            Span::styled(or_dash(&resource.role).to_string(), app.theme.role_style(&resource.role)),
            Span::raw("    Suspended: "),
            Span::styled(or_dash(&resource.suspended).to_string(), bold),
            Span::raw("    Write ordering: "),
            Span::styled(or_dash(&resource.write_ordering).to_string(), bold),
        ]),
        Line::from(vec![
            Span::raw(" Uptime: "),
            Span::styled(resource.uptime.to_string(), bold),
            Span::raw("    Read: "),
            Span::styled(format_rate(resource.read_per_second()), bold),
            Span::raw("    Write: "),
            Span::styled(format_rate(resource.write_per_second()), bold),
            Span::raw("    Status: "),
            Span::styled(
                format!("{} {}", health.symbol(), health_label),
                app.theme.status_style(health).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let header = Paragraph::new(header_lines).block(
        Block::default()
            .title(" Resource Detail ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.highlight)),
    );
    frame.render_widget(header, chunks[0]);

    // ===== CONNECTIONS =====
    let conn_rows: Vec<Row> = resource
        .connections
        .values()
        .map(|c| {
            let health = connection_health(c);
            Row::new(vec![
                Cell::from(c.name.clone()),
                Cell::from(or_dash(&c.peer_node_id).to_string()),
                Cell::from(or_dash(&c.connection).to_string())
                    .style(app.theme.state_style(&c.connection, health)),
                Cell::from(or_dash(&c.role).to_string()),
                Cell::from(or_dash(&c.congested).to_string()),
                Cell::from(c.update_count.to_string()),
                Cell::from(c.uptime.to_string()),
                Cell::from(if c.stale { "stale" } else { health.symbol() })
                    .style(app.theme.status_style(health)),
            ])
        })
        .collect();

    render_table(
        frame,
        app,
        chunks[1],
        &format!(" Connections ({}) ", resource.connections.len()),
        "No connections",
        &["Peer", "Node", "State", "Role", "Congested", "Updates", "Uptime", "Status"],
        &[
            Constraint::Fill(2),
            Constraint::Length(5),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(6),
        ],
        conn_rows,
    );

    // ===== LOCAL VOLUMES =====
    let vol_rows: Vec<Row> = resource
        .volumes
        .iter()
        .map(|(id, v)| {
            let health = volume_health(v);
            Row::new(vec![
                Cell::from(id.clone()),
                Cell::from(or_dash(&v.minor).to_string()),
                Cell::from(or_dash(&v.disk).to_string())
                    .style(app.theme.state_style(&v.disk, health)),
                Cell::from(format_kib(v.size.min(i64::MAX as u64) as i64)),
                Cell::from(format_rate(v.read_kib.per_second)),
                Cell::from(format_rate(v.written_kib.per_second)),
                Cell::from(format!("{}/{}", v.upper_pending.current, v.lower_pending.current)),
                Cell::from(format!("{:.1}", v.al_writes.per_second)),
                Cell::from(health.symbol()).style(app.theme.status_style(health)),
            ])
        })
        .collect();

    render_table(
        frame,
        app,
        chunks[2],
        &format!(" Volumes ({}) ", resource.volumes.len()),
        "No local volumes",
        &["Vol", "Minor", "Disk", "Size", "Read", "Write", "Pending", "AL/s", "Status"],
        &[
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
        vol_rows,
    );

    // ===== PEER VOLUMES =====
    let peer_rows: Vec<Row> = resource
        .peer_volumes()
        .map(|(conn, vol, pv)| {
            let health = peer_volume_health(pv);
            Row::new(vec![
                Cell::from(conn.clone()),
                Cell::from(vol.clone()),
                Cell::from(or_dash(&pv.replication).to_string())
                    .style(app.theme.state_style(&pv.replication, health)),
                Cell::from(or_dash(&pv.peer_disk).to_string()),
                Cell::from(format_kib(pv.out_of_sync_kib.current)),
                Cell::from(format_rate(pv.received_kib.per_second)),
                Cell::from(format_rate(pv.sent_kib.per_second)),
                Cell::from(format!("{}/{}", pv.pending.current, pv.unacked.current)),
                Cell::from(health.symbol()).style(app.theme.status_style(health)),
            ])
        })
        .collect();
    let peer_count = peer_rows.len();

    render_table(
        frame,
        app,
        chunks[3],
        &format!(" Peer Volumes ({}) ", peer_count),
        "No peer volumes",
        &["Peer", "Vol", "Replication", "Peer Disk", "OOS", "Recv", "Sent", "Pend/Ack", "Status"],
        &[
            Constraint::Fill(2),
            Constraint::Length(4),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Length(6),
        ],
        peer_rows,
    );

    // ===== ISSUES =====
    let issue_lines: Vec<Line> = if issues.is_empty() {
        vec![Line::from(Span::styled(
            "  No issues",
            Style::default().fg(app.theme.healthy),
        ))]
    } else {
        issues
            .iter()
            .map(|(status, message)| {
                Line::from(vec![
                    Span::styled(format!(" {:<5}", status.symbol()), app.theme.status_style(*status)),
                    Span::raw(message.clone()),
                ])
            })
            .collect()
    };

    let issues_block = Paragraph::new(issue_lines).block(
        Block::default()
            .title(format!(" Issues ({}) ", issues.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(if issues.is_empty() {
                app.theme.border
            } else {
                app.theme.warning
            })),
    );
    frame.render_widget(issues_block, chunks[4]);

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " ↑↓:next resource  Esc:close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[5]);
}

#[allow(clippy::too_many_arguments)]
fn render_table(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    empty_message: &'static str,
    columns: &[&'static str],
    widths: &[Constraint],
    rows: Vec<Row>,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if rows.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            format!("  {}", empty_message),
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(columns.iter().map(|c| Cell::from(*c)).collect::<Vec<_>>())
        .height(1)
        .style(app.theme.header);

    let table = Table::new(rows, widths.to_vec()).header(header).block(block);
    frame.render_widget(table, area);
}
