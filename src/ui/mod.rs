//! Terminal UI rendering using ratatui.
//!
//! Each view lives in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`resources`]: One row per resource with role, throughput, out-of-sync and uptime
//! - [`replication`]: One row per peer volume with replication state and sync progress
//! - [`detail`]: Modal overlay with connections, volumes and open issues of a resource
//! - [`common`]: Shared components (header, tabs, status bar, help overlay, formatting)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (resources/replication::render)      │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - detail::render_overlay
//!    - common::render_help
//! ```

pub mod common;
pub mod detail;
pub mod replication;
pub mod resources;
pub mod theme;

pub use replication::ReplicationSortColumn;
pub use resources::SortColumn;
pub use theme::Theme;
