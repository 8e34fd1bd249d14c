//! Resources view rendering.
//!
//! Displays a table of all resources with role, health, throughput, a write
//! trend sparkline, out-of-sync data and uptime.

use std::cmp::Ordering;

use blockwatch_types::ResourceSnapshot;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{format_kib, format_rate, or_dash, render_sparkline};
use crate::app::App;
use crate::data::health::resource_health;

/// Column to sort by in the Resources view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Sort by resource name alphabetically.
    #[default]
    Name,
    /// Sort by role.
    Role,
    /// Sort by combined read rate.
    Read,
    /// Sort by combined write rate.
    Write,
    /// Sort by out-of-sync data across peers.
    OutOfSync,
    /// Sort by time since the resource was first seen.
    Uptime,
    /// Sort by health status.
    Status,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Name => SortColumn::Role,
            SortColumn::Role => SortColumn::Read,
            SortColumn::Read => SortColumn::Write,
            SortColumn::Write => SortColumn::OutOfSync,
            SortColumn::OutOfSync => SortColumn::Uptime,
            SortColumn::Uptime => SortColumn::Status,
            SortColumn::Status => SortColumn::Name,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Role => "role",
            SortColumn::Read => "read",
            SortColumn::Write => "write",
            SortColumn::OutOfSync => "oos",
            SortColumn::Uptime => "uptime",
            SortColumn::Status => "status",
        }
    }
}

/// Render the Resources view showing every resource in a sortable table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref data) = app.data else {
        return;
    };

    if data.is_empty() {
        render_empty(frame, app, area);
        return;
    }

    let resources = app.resource_rows();

    let header = Row::new(vec![
        Cell::from(format_header("Resource", SortColumn::Name, app)),
        Cell::from(format_header("Role", SortColumn::Role, app)),
        Cell::from("Conns"),
        Cell::from(format_header("Read", SortColumn::Read, app)),
        Cell::from(format_header("Write", SortColumn::Write, app)),
        Cell::from("Trend"),
        Cell::from(format_header("OOS", SortColumn::OutOfSync, app)),
        Cell::from(format_header("Uptime", SortColumn::Uptime, app)),
        Cell::from(format_header("Status", SortColumn::Status, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = resources
        .iter()
        .map(|r| {
            let health = resource_health(r);
            let connected = r
                .connections
                .values()
                .filter(|c| c.connection == "Connected")
                .count();
            let conns_style = if connected < r.connections.len() {
                Style::default().fg(app.theme.warning)
            } else {
                Style::default()
            };
            let out_of_sync = r.out_of_sync_kib();

            let mut name = r.name.clone();
            if r.suspended == "yes" {
                name.push_str(" (suspended)");
            }

            Row::new(vec![
                Cell::from(name),
                Cell::from(or_dash(&r.role).to_string()).style(app.theme.role_style(&r.role)),
                Cell::from(format!("{}/{}", connected, r.connections.len())).style(conns_style),
                Cell::from(format_rate(r.read_per_second())),
                Cell::from(format_rate(r.write_per_second())),
                Cell::from(render_sparkline(&r.write_history())),
                if out_of_sync > 0 {
                    Cell::from(format_kib(out_of_sync)).style(app.theme.out_of_sync_style(out_of_sync))
                } else {
                    Cell::from("-")
                },
                Cell::from(r.uptime.to_string()),
                Cell::from(health.symbol()).style(app.theme.status_style(health)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),   // Resource
        Constraint::Fill(1),   // Role
        Constraint::Length(6), // Conns
        Constraint::Fill(1),   // Read
        Constraint::Fill(1),   // Write
        Constraint::Min(8),    // Trend
        Constraint::Fill(1),   // OOS
        Constraint::Fill(1),   // Uptime
        Constraint::Min(6),    // Status
    ];

    let selected = app.selected_resource_index.min(resources.len().saturating_sub(1));

    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !resources.is_empty() {
        format!(" [{}/{}]", selected + 1, resources.len())
    } else {
        String::new()
    };

    let title = format!(
        " Resources ({}/{}) [s:sort {}{}]{}{} ",
        resources.len(),
        data.len(),
        app.sort_column.label(),
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Resources (0) ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "  No resources reported yet",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .block(block);
    frame.render_widget(text, area);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort resources by the given column and direction.
///
/// Ties are broken by name so the order is stable between refreshes.
pub fn sort_resources_by(rows: &mut [&ResourceSnapshot], column: SortColumn, ascending: bool) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Role => a.role.cmp(&b.role),
            SortColumn::Read => a.read_per_second().total_cmp(&b.read_per_second()),
            SortColumn::Write => a.write_per_second().total_cmp(&b.write_per_second()),
            SortColumn::OutOfSync => a.out_of_sync_kib().cmp(&b.out_of_sync_kib()),
            SortColumn::Uptime => a.uptime.cmp(&b.uptime),
            SortColumn::Status => resource_health(a).cmp(&resource_health(b)),
        };

        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        if primary == Ordering::Equal {
            a.name.cmp(&b.name)
        } else {
            primary
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwatch_types::{Microseconds, PeerVolumeSnapshot, StatsSnapshot};

    fn resource(name: &str, role: &str, uptime_secs: u64) -> ResourceSnapshot {
        let mut r = ResourceSnapshot::new(name);
        r.role = role.to_string();
        r.uptime = Microseconds::from_secs(uptime_secs);
        r
    }

    fn names(rows: &[&ResourceSnapshot]) -> Vec<String> {
        rows.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_sort_column_cycles() {
        let mut col = SortColumn::default();
        for _ in 0..7 {
            col = col.next();
        }
        assert_eq!(col, SortColumn::Name);
    }

    #[test]
    fn test_sort_by_name_and_direction() {
        let a = resource("alpha", "Primary", 10);
        let b = resource("beta", "Secondary", 5);
        let mut rows = vec![&b, &a];

        sort_resources_by(&mut rows, SortColumn::Name, true);
        assert_eq!(names(&rows), ["alpha", "beta"]);

        sort_resources_by(&mut rows, SortColumn::Name, false);
        assert_eq!(names(&rows), ["beta", "alpha"]);
    }

    #[test]
    fn test_sort_by_uptime_breaks_ties_by_name() {
        let a = resource("a", "", 10);
        let b = resource("b", "", 5);
        let c = resource("c", "", 10);
        let mut rows = vec![&c, &a, &b];

        sort_resources_by(&mut rows, SortColumn::Uptime, false);
        assert_eq!(names(&rows), ["a", "c", "b"]);
    }

    #[test]
    fn test_sort_by_status_puts_worst_last_ascending() {
        let ok = resource("ok", "Primary", 0);
        let mut bad = resource("bad", "Primary", 0);
        bad.suspended = "yes".to_string();
        let mut rows = vec![&bad, &ok];

        sort_resources_by(&mut rows, SortColumn::Status, true);
        assert_eq!(names(&rows), ["ok", "bad"]);
    }

    #[test]
    fn test_sort_by_out_of_sync() {
        let clean = resource("clean", "", 0);
        let mut dirty = resource("dirty", "", 0);
        let mut vols = std::collections::BTreeMap::new();
        vols.insert(
            "0".to_string(),
            PeerVolumeSnapshot {
                out_of_sync_kib: StatsSnapshot {
                    current: 4096,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        dirty.peer_devices.insert("peer".to_string(), vols);

        let mut rows = vec![&clean, &dirty];
        sort_resources_by(&mut rows, SortColumn::OutOfSync, false);
        assert_eq!(names(&rows), ["dirty", "clean"]);
    }
}
