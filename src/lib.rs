//! # blockwatch
//!
//! A live monitor for replicated block-storage resources.
//!
//! The storage subsystem reports its state as a stream of text events: one
//! line per change to a resource, a connection to a peer, a local volume or
//! the replication state of a volume towards a peer. This crate turns that
//! stream into an always-current picture of the cluster, with rates,
//! min/max/avg statistics and uptimes, and shows it in an interactive
//! terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │  ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌────────┐          │
//! │  │ source  │──▶│  ingest  │──▶│   data   │──▶│  app   │──▶ ui    │
//! │  │ (lines) │   │ (batches)│   │(registry)│   │(state) │          │
//! │  └─────────┘   └──────────┘   └──────────┘   └────────┘          │
//! │       ▲                             │                            │
//! │  File | Stream | Command | Channel  └──▶ Snapshot ──▶ JSON export │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Line tokenizer and the [`DataSource`] trait, with sources
//!   for event log files, byte streams, child processes and channels
//! - **[`ingest`]**: Applies records to the shared [`Registry`] in batches
//! - **[`data`]**: The aggregation engine: entity states, trackers, registry
//!   and health classification
//! - **[`app`]**: Application state, view navigation and user interaction
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]** and **[`logging`]**: Settings and log setup for the binary
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Follow the live event stream (default command)
//! blockwatch
//!
//! # Tail a captured log
//! blockwatch --file events.log
//!
//! # Replay a log and write the final state as JSON
//! blockwatch --file events.log --export state.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use blockwatch::data::Registry;
//! use blockwatch::{parse_line, Ingestor};
//!
//! let registry = Registry::default().shared();
//! let mut ingestor = Ingestor::default();
//!
//! let record = parse_line("2017-02-15T12:57:53.000000-08:00 exists resource name:r0 role:Primary")
//!     .unwrap()
//!     .unwrap();
//! ingestor.apply(&mut registry.write(), &record);
//!
//! let snapshot = registry.read().snapshot(chrono::TimeDelta::seconds(30));
//! assert_eq!(snapshot.get("r0").unwrap().role, "Primary");
//! ```
//!
//! ### Feeding records through a channel
//!
//! ```
//! use blockwatch::{parse_line, ChannelSource, DataSource, Ingestor};
//! use blockwatch::data::Registry;
//!
//! let (tx, mut source) = ChannelSource::create("embedded");
//! tx.send(parse_line("exists connection name:r0 conn-name:peer connection:Connected").unwrap().unwrap())
//!     .unwrap();
//!
//! let registry = Registry::default().shared();
//! Ingestor::default().drain_all(&mut source, &registry);
//! assert!(registry.read().connection("r0", "peer").is_some());
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod ingest;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use blockwatch_types::Snapshot;
pub use config::Settings;
pub use data::{Event, HealthStatus, Registry, SharedRegistry, Target};
pub use ingest::Ingestor;
pub use source::{
    parse_line, Action, ChannelSource, CommandSource, DataSource, FileSource, LineError, Record,
    StreamSource,
};
