//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use blockwatch_types::{PeerVolumeSnapshot, ResourceSnapshot, Snapshot};
use chrono::TimeDelta;

use crate::data::health::{peer_volume_health, resource_health};
use crate::data::SharedRegistry;
use crate::ingest::{note_source_error, Ingestor};
use crate::source::DataSource;
use crate::ui::replication::ReplicationSortColumn;
use crate::ui::resources::SortColumn;
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Resource detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// One row per resource with health, throughput and uptime.
    Resources,
    /// One row per peer volume with replication state.
    Replication,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Resources => View::Replication,
            View::Replication => View::Resources,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        self.next()
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Resources => "Resources",
            View::Replication => "Replication",
        }
    }
}

/// A peer volume row: `(resource, connection, volume, state)`.
pub type PeerRow<'a> = (&'a str, &'a str, &'a str, &'a PeerVolumeSnapshot);

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data source and engine
    source: Box<dyn DataSource>,
    registry: SharedRegistry,
    ingestor: Ingestor,
    pub stale_after: TimeDelta,
    pub data: Option<Snapshot>,
    pub last_updated: Option<Instant>,
    pub load_error: Option<String>,

    // Navigation state
    pub selected_resource_index: usize,
    pub selected_peer_index: usize,

    // Sorting (Resources view)
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Sorting (Replication view)
    pub replication_sort_column: ReplicationSortColumn,
    pub replication_sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `source` into `registry`.
    pub fn new(source: Box<dyn DataSource>, registry: SharedRegistry, stale_after: TimeDelta) -> Self {
        Self {
            running: true,
            current_view: View::Resources,
            show_help: false,
            show_detail_overlay: false,
            source,
            registry,
            ingestor: Ingestor::default(),
            stale_after,
            data: None,
            last_updated: None,
            load_error: None,
            selected_resource_index: 0,
            selected_peer_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            replication_sort_column: ReplicationSortColumn::default(),
            replication_sort_ascending: false, // Default descending (worst first)
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Number of records applied and how many of them failed.
    pub fn ingest_counts(&self) -> (u64, u64) {
        (self.ingestor.applied(), self.ingestor.errors())
    }

    /// The most recent ingestion error.
    pub fn last_ingest_error(&self) -> Option<&str> {
        self.ingestor.last_error()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Drain pending records into the registry and refresh the snapshot.
    ///
    /// Returns Ok(true) if any record was applied.
    pub fn reload_data(&mut self) -> Result<bool> {
        let taken = self.ingestor.drain(self.source.as_mut(), &self.registry);

        note_source_error(&mut self.load_error, self.source.error());

        if taken == 0 && self.data.is_some() {
            return Ok(false);
        }

        let snapshot = self.registry.read().snapshot(self.stale_after);
        self.data = Some(snapshot);
        self.last_updated = Some(Instant::now());
        self.clamp_selection();
        Ok(taken > 0)
    }

    fn clamp_selection(&mut self) {
        let resources = self.filtered_resource_count();
        if self.selected_resource_index >= resources {
            self.selected_resource_index = resources.saturating_sub(1);
        }
        let peers = self.peer_rows().len();
        if self.selected_peer_index >= peers {
            self.selected_peer_index = peers.saturating_sub(1);
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Resources => {
                let max = self.filtered_resource_count().saturating_sub(1);
                self.selected_resource_index = (self.selected_resource_index + n).min(max);
            }
            View::Replication => {
                let max = self.peer_rows().len().saturating_sub(1);
                self.selected_peer_index = (self.selected_peer_index + n).min(max);
            }
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Resources => {
                self.selected_resource_index = self.selected_resource_index.saturating_sub(n);
            }
            View::Replication => {
                self.selected_peer_index = self.selected_peer_index.saturating_sub(n);
            }
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::Resources => self.selected_resource_index = 0,
            View::Replication => self.selected_peer_index = 0,
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        match self.current_view {
            View::Resources => {
                self.selected_resource_index = self.filtered_resource_count().saturating_sub(1);
            }
            View::Replication => {
                self.selected_peer_index = self.peer_rows().len().saturating_sub(1);
            }
        }
    }

    fn filtered_resource_count(&self) -> usize {
        self.resource_rows().len()
    }

    /// Resources after filtering and sorting, in display order.
    pub fn resource_rows(&self) -> Vec<&ResourceSnapshot> {
        let Some(ref data) = self.data else {
            return Vec::new();
        };
        let mut rows: Vec<&ResourceSnapshot> = data
            .resources
            .values()
            .filter(|r| self.matches_filter(&r.name))
            .collect();
        crate::ui::resources::sort_resources_by(&mut rows, self.sort_column, self.sort_ascending);
        rows
    }

    /// Peer volumes after filtering and sorting, in display order.
    pub fn peer_rows(&self) -> Vec<PeerRow<'_>> {
        let Some(ref data) = self.data else {
            return Vec::new();
        };
        let search = self.filter_text.to_lowercase();
        let mut rows: Vec<PeerRow<'_>> = data
            .resources
            .values()
            .flat_map(|r| {
                r.peer_volumes()
                    .map(move |(conn, vol, pv)| (r.name.as_str(), conn.as_str(), vol.as_str(), pv))
            })
            .filter(|(res, conn, _, _)| {
                search.is_empty()
                    || res.to_lowercase().contains(&search)
                    || conn.to_lowercase().contains(&search)
            })
            .collect();
        crate::ui::replication::sort_peers_by(
            &mut rows,
            self.replication_sort_column,
            self.replication_sort_ascending,
        );
        rows
    }

    /// The resource under the cursor in the current view.
    pub fn selected_resource(&self) -> Option<&ResourceSnapshot> {
        match self.current_view {
            View::Resources => self.resource_rows().get(self.selected_resource_index).copied(),
            View::Replication => {
                let rows = self.peer_rows();
                let (name, _, _, _) = rows.get(self.selected_peer_index)?;
                self.data.as_ref()?.get(name)
            }
        }
    }

    /// Open the detail overlay for the currently selected resource.
    pub fn enter_detail(&mut self) {
        if self.selected_resource().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then return to Resources.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.current_view != View::Resources {
            self.current_view = View::Resources;
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column for the current view.
    pub fn cycle_sort(&mut self) {
        match self.current_view {
            View::Resources => self.sort_column = self.sort_column.next(),
            View::Replication => {
                self.replication_sort_column = self.replication_sort_column.next()
            }
        }
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        match self.current_view {
            View::Resources => self.sort_ascending = !self.sort_ascending,
            View::Replication => {
                self.replication_sort_ascending = !self.replication_sort_ascending
            }
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a resource name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Count of resources per health status: (healthy, warning, critical).
    pub fn health_counts(&self) -> (usize, usize, usize) {
        let Some(ref data) = self.data else {
            return (0, 0, 0);
        };
        data.resources
            .values()
            .fold((0, 0, 0), |(h, w, c), r| match resource_health(r) {
                crate::data::HealthStatus::Healthy => (h + 1, w, c),
                crate::data::HealthStatus::Warning => (h, w + 1, c),
                crate::data::HealthStatus::Critical => (h, w, c + 1),
            })
    }

    /// Number of peer volumes not in a healthy replication state.
    pub fn degraded_peer_count(&self) -> usize {
        self.peer_rows()
            .iter()
            .filter(|(_, _, _, pv)| peer_volume_health(pv) != crate::data::HealthStatus::Healthy)
            .count()
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current snapshot to a file as pretty JSON.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref data) = self.data else {
            anyhow::bail!("No data to export");
        };
        write_snapshot(data, path)
    }
}

/// Write a snapshot to `path` as pretty JSON.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}
