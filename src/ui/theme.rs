//! Colors for the dashboard.
//!
//! Two palettes, picked from the terminal background. Besides the three
//! health levels there are colors for resync traffic and out-of-sync data,
//! which are normal while a peer catches up and should not read as alarms.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::HealthStatus;

/// Background luminance above which the light palette is used.
const LIGHT_BACKGROUND_LUMA: f32 = 0.5;

/// Palette and table styles shared by every view.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primaries, overlay borders and status messages.
    pub highlight: Color,
    pub healthy: Color,
    pub warning: Color,
    pub critical: Color,
    /// Replication states of a running resync (`SyncSource`, `SyncTarget`, ...).
    pub syncing: Color,
    /// Out-of-sync amounts.
    pub out_of_sync: Color,
    pub border: Color,
    pub header: Style,
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Palette for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::LightCyan,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::LightRed,
            syncing: Color::LightMagenta,
            out_of_sync: Color::LightYellow,
            border: Color::DarkGray,
            header: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            selected: Style::default().bg(Color::Rgb(40, 44, 52)).add_modifier(Modifier::BOLD),
            tab_active: Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Plain,
        }
    }

    /// Palette for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            healthy: Color::Green,
            warning: Color::Rgb(175, 95, 0),
            critical: Color::Red,
            syncing: Color::Magenta,
            out_of_sync: Color::Rgb(175, 95, 0),
            border: Color::Gray,
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            selected: Style::default().bg(Color::Rgb(220, 228, 240)).add_modifier(Modifier::BOLD),
            tab_active: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Plain,
        }
    }

    /// Pick a palette from a measured background luminance.
    ///
    /// Terminals that do not answer the query get the dark palette.
    pub fn for_background(luma: Option<f32>) -> Self {
        match luma {
            Some(luma) if luma > LIGHT_BACKGROUND_LUMA => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Query the terminal background and pick a palette.
    pub fn auto_detect() -> Self {
        Self::for_background(terminal_light::luma().ok())
    }

    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Style for a raw state string such as a disk, connection or
    /// replication state.
    ///
    /// Unreported states are dimmed. Resync states use the resync color
    /// unless something worse than a warning is going on.
    pub fn state_style(&self, state: &str, status: HealthStatus) -> Style {
        if state.is_empty() {
            Style::default().add_modifier(Modifier::DIM)
        } else if is_resync_state(state) && status != HealthStatus::Critical {
            Style::default().fg(self.syncing)
        } else {
            self.status_style(status)
        }
    }

    /// Style for the role column; primaries stand out.
    pub fn role_style(&self, role: &str) -> Style {
        match role {
            "Primary" => Style::default().fg(self.highlight).add_modifier(Modifier::BOLD),
            "" | "Unknown" => Style::default().add_modifier(Modifier::DIM),
            _ => Style::default(),
        }
    }

    /// Style for an out-of-sync amount in KiB.
    pub fn out_of_sync_style(&self, kib: i64) -> Style {
        if kib > 0 {
            Style::default().fg(self.out_of_sync)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        }
    }
}

fn is_resync_state(state: &str) -> bool {
    state.starts_with("Sync") || state.starts_with("PausedSync")
}
