//! # blockwatch-types
//!
//! Snapshot schema for replicated block-storage monitoring. This crate defines
//! the read-only, point-in-time view that the blockwatch aggregation engine
//! hands to renderers, exporters and anything else that wants to consume the
//! live state of resources, connections, local volumes and peer volumes.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON export
//! - **Owned copies**: A snapshot never borrows from the engine, so it can be
//!   taken under a short lock and rendered at leisure
//! - **Versioned schema**: Snapshots include version info for forward compatibility
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use blockwatch_types::{Microseconds, Snapshot};
//!
//! let snapshot = Snapshot::builder()
//!     .timestamp_ms(1_487_192_273_000)
//!     .resource("r0", |r| {
//!         r.role = "Primary".to_string();
//!         r.uptime = Microseconds::from_secs(90);
//!     })
//!     .build();
//!
//! assert_eq!(snapshot.len(), 1);
//! assert_eq!(snapshot.get("r0").unwrap().role, "Primary");
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. The version is included in serialized
//! snapshots to allow consumers to handle format evolution gracefully.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod duration;
mod entities;
mod snapshot;
mod version;

pub use duration::*;
pub use entities::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const SCHEMA_VERSION: u32 = 1;
