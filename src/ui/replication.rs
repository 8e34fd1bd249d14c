//! Replication view rendering.
//!
//! One row per peer volume: the replication state towards each peer, the
//! peer's disk state, how much data is out of sync and the resync traffic.

use std::cmp::Ordering;

use blockwatch_types::Snapshot;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{format_kib, format_rate, or_dash};
use crate::app::{App, PeerRow};
use crate::data::health::peer_volume_health;
use crate::data::HealthStatus;

/// Column to sort peer volumes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationSortColumn {
    #[default]
    Status,
    Resource,
    Connection,
    Replication,
    OutOfSync,
    Received,
    Sent,
}

impl ReplicationSortColumn {
    pub fn next(self) -> Self {
        match self {
            Self::Status => Self::Resource,
            Self::Resource => Self::Connection,
            Self::Connection => Self::Replication,
            Self::Replication => Self::OutOfSync,
            Self::OutOfSync => Self::Received,
            Self::Received => Self::Sent,
            Self::Sent => Self::Status,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Resource => "resource",
            Self::Connection => "connection",
            Self::Replication => "replication",
            Self::OutOfSync => "oos",
            Self::Received => "recv",
            Self::Sent => "sent",
        }
    }
}

/// Render the replication view as a table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    let rows = app.peer_rows();
    if rows.is_empty() {
        render_empty(frame, app, area);
        return;
    }

    let degraded = rows
        .iter()
        .filter(|(_, _, _, pv)| peer_volume_health(pv) != HealthStatus::Healthy)
        .count();

    let header = Row::new(vec![
        Cell::from(format_header("Status", ReplicationSortColumn::Status, app)),
        Cell::from(format_header("Resource", ReplicationSortColumn::Resource, app)),
        Cell::from(format_header("Peer", ReplicationSortColumn::Connection, app)),
        Cell::from("Vol"),
        Cell::from(format_header("Replication", ReplicationSortColumn::Replication, app)),
        Cell::from("Peer Disk"),
        Cell::from(format_header("OOS", ReplicationSortColumn::OutOfSync, app)),
        Cell::from("Synced"),
        Cell::from(format_header("Recv", ReplicationSortColumn::Received, app)),
        Cell::from(format_header("Sent", ReplicationSortColumn::Sent, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|&(resource, connection, volume, pv)| {
            let health = peer_volume_health(pv);
            let status_style = app.theme.status_style(health);
            let oos = pv.out_of_sync_kib.current;

            Row::new(vec![
                Cell::from(health.symbol()).style(status_style),
                Cell::from(resource.to_string())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(connection.to_string()),
                Cell::from(volume.to_string()),
                Cell::from(or_dash(&pv.replication).to_string())
                    .style(app.theme.state_style(&pv.replication, health)),
                Cell::from(or_dash(&pv.peer_disk).to_string()),
                if oos > 0 {
                    Cell::from(format_kib(oos)).style(app.theme.out_of_sync_style(oos))
                } else {
                    Cell::from("-")
                },
                Cell::from(sync_progress(data, resource, volume, oos)),
                Cell::from(format_rate(pv.received_kib.per_second)),
                Cell::from(format_rate(pv.sent_kib.per_second)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),  // Status
        Constraint::Fill(2),    // Resource
        Constraint::Fill(2),    // Peer
        Constraint::Length(4),  // Vol
        Constraint::Fill(2),    // Replication
        Constraint::Fill(2),    // Peer disk
        Constraint::Fill(1),    // OOS
        Constraint::Length(7),  // Synced
        Constraint::Fill(1),    // Recv
        Constraint::Fill(1),    // Sent
    ];

    let selected = app.selected_peer_index.min(rows.len().saturating_sub(1));
    let sort_dir = if app.replication_sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let title = format!(
        " Peer Volumes ({}) - {} degraded [s:sort {}{}]{} [{}/{}] ",
        rows.len(),
        degraded,
        app.replication_sort_column.label(),
        sort_dir,
        filter_info,
        selected + 1,
        rows.len()
    );

    let border_color = if degraded > 0 {
        app.theme.warning
    } else {
        app.theme.border
    };

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(border_color)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Percentage of the local volume that is in sync with the peer.
fn sync_progress(data: &Snapshot, resource: &str, volume: &str, out_of_sync: i64) -> String {
    let size = data
        .get(resource)
        .and_then(|r| r.volumes.get(volume))
        .map(|v| v.size)
        .unwrap_or(0);
    if size == 0 {
        return "-".to_string();
    }
    let synced = 1.0 - (out_of_sync.max(0) as f64 / size as f64);
    format!("{:.1}%", synced.clamp(0.0, 1.0) * 100.0)
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Peer Volumes ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let message = if app.filter_text.is_empty() {
        "  No peer volumes reported yet"
    } else {
        "  No peer volumes match the filter"
    };

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().add_modifier(Modifier::DIM))),
    ])
    .block(block);
    frame.render_widget(text, area);
}

fn format_header(name: &str, col: ReplicationSortColumn, app: &App) -> Span<'static> {
    if app.replication_sort_column == col {
        let arrow = if app.replication_sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort peer volume rows by the given column and direction.
///
/// Ties fall back to `(resource, connection, volume)` order.
pub fn sort_peers_by(rows: &mut [PeerRow<'_>], column: ReplicationSortColumn, ascending: bool) {
    rows.sort_by(|a, b| {
        let primary = match column {
            ReplicationSortColumn::Status => peer_volume_health(a.3).cmp(&peer_volume_health(b.3)),
            ReplicationSortColumn::Resource => a.0.cmp(b.0),
            ReplicationSortColumn::Connection => a.1.cmp(b.1),
            ReplicationSortColumn::Replication => a.3.replication.cmp(&b.3.replication),
            ReplicationSortColumn::OutOfSync => {
                a.3.out_of_sync_kib.current.cmp(&b.3.out_of_sync_kib.current)
            }
            ReplicationSortColumn::Received => {
                a.3.received_kib.per_second.total_cmp(&b.3.received_kib.per_second)
            }
            ReplicationSortColumn::Sent => a.3.sent_kib.per_second.total_cmp(&b.3.sent_kib.per_second),
        };

        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        if primary == Ordering::Equal {
            (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2))
        } else {
            primary
        }
    });
}
