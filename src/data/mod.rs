//! The aggregation engine.
//!
//! Status events from the storage subsystem are routed by the [`Registry`]
//! to long-lived entity states, which drive a small set of numeric trackers.
//! Readers never see the states directly; they take an owned
//! [`blockwatch_types::Snapshot`].
//!
//! ## Submodules
//!
//! - [`event`]: The [`Event`] ingestion contract and per-target field vocabularies
//! - [`uptime`], [`history`], [`stats`], [`rate`]: Numeric trackers
//! - [`resource`], [`connection`], [`device`], [`peer_device`]: Entity states
//! - [`registry`]: Event routing, entity lifecycle and snapshots
//! - [`health`]: Display health classification of snapshots
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! Event { timestamp, target, fields }
//!        │
//!        ▼
//! Registry::ingest()  ── routes by target + identity fields
//!        │
//!        ├──▶ ResourceState / ConnectionState
//!        ├──▶ DeviceState ──▶ DeviceVolumeState (per volume)
//!        └──▶ PeerDeviceState ──▶ PeerVolumeState (per volume)
//!                    │
//!                    └──▶ RateTracker / RunningStats / UptimeTracker
//!
//! Registry::snapshot() ──▶ Snapshot (owned, for renderers)
//! ```

pub mod connection;
pub mod device;
pub mod duration;
pub mod error;
pub mod event;
pub mod health;
pub mod history;
pub mod peer_device;
pub mod rate;
pub mod registry;
pub mod resource;
pub mod stats;
pub mod uptime;

pub use connection::ConnectionState;
pub use device::{DeviceState, DeviceVolumeState};
pub use error::{ParseError, UpdateError};
pub use event::{
    ConnectionKey, DeviceKey, Event, FieldKey, PeerDeviceKey, ResourceKey, Target, Timestamp,
};
pub use health::HealthStatus;
pub use history::{BoundedHistory, DEFAULT_HISTORY_LEN};
pub use peer_device::{PeerDeviceState, PeerVolumeState};
pub use rate::RateTracker;
pub use registry::{Registry, SharedRegistry};
pub use resource::ResourceState;
pub use stats::RunningStats;
pub use uptime::UptimeTracker;
