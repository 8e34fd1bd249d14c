//! Per-entity snapshot types.
//!
//! Every textual attribute is carried verbatim as the storage subsystem
//! reported it ("Primary", "UpToDate", "yes"/"no", ...). Interpreting the
//! vocabulary is up to the consumer.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::Microseconds;

/// Output of a rate tracker fed from a monotonic (but resettable) counter.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateSnapshot {
    /// Change per second over the most recent sampling interval.
    pub per_second: f64,
    /// Cumulative change since the tracker was created; never decreases.
    pub total: f64,
    /// Recent per-interval deltas, oldest first.
    pub history: Vec<f64>,
}

/// Output of a lifetime min/max/average tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
    pub current: i64,
}

/// A network connection between the local node and one peer.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionSnapshot {
    /// Connection (peer) name.
    pub name: String,
    pub peer_node_id: String,
    /// Connection status, e.g. "Connected", "StandAlone".
    pub connection: String,
    /// Role of the peer, e.g. "Secondary".
    pub role: String,
    pub congested: String,
    /// Number of events applied to this connection.
    pub update_count: u64,
    /// Time since the connection was first seen.
    pub uptime: Microseconds,
    /// True when no event has arrived for longer than the staleness threshold.
    pub stale: bool,
}

impl ConnectionSnapshot {
    /// True if the connection has only ever been seen once.
    pub fn is_fresh(&self) -> bool {
        self.update_count <= 1
    }
}

/// A local block device volume.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceVolumeSnapshot {
    pub minor: String,
    /// Disk state, e.g. "UpToDate", "Inconsistent".
    pub disk: String,
    /// Size in KiB.
    pub size: u64,
    pub read_kib: RateSnapshot,
    pub written_kib: RateSnapshot,
    pub al_writes: RateSnapshot,
    pub bm_writes: RateSnapshot,
    pub upper_pending: StatsSnapshot,
    pub lower_pending: StatsSnapshot,
    pub al_suspended: String,
    pub blocked: String,
}

/// The remote counterpart of a volume, as seen over one connection.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerVolumeSnapshot {
    /// Replication state, e.g. "Established", "SyncSource".
    pub replication: String,
    pub peer_disk: String,
    pub resync_suspended: String,
    pub received_kib: RateSnapshot,
    pub sent_kib: RateSnapshot,
    pub out_of_sync_kib: StatsSnapshot,
    pub pending: StatsSnapshot,
    pub unacked: StatsSnapshot,
}

/// A replicated resource with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceSnapshot {
    pub name: String,
    /// Local role, e.g. "Primary".
    pub role: String,
    pub suspended: String,
    pub write_ordering: String,
    /// Time since the first resource event.
    pub uptime: Microseconds,

    /// Connections keyed by connection name.
    pub connections: BTreeMap<String, ConnectionSnapshot>,

    /// Local volumes keyed by volume id.
    pub volumes: BTreeMap<String, DeviceVolumeSnapshot>,

    /// Peer volumes keyed by connection name, then volume id.
    pub peer_devices: BTreeMap<String, BTreeMap<String, PeerVolumeSnapshot>>,
}

impl ResourceSnapshot {
    /// Create an empty resource snapshot.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Iterate over all peer volumes as `(connection, volume, state)`.
    pub fn peer_volumes(&self) -> impl Iterator<Item = (&String, &String, &PeerVolumeSnapshot)> {
        self.peer_devices
            .iter()
            .flat_map(|(conn, vols)| vols.iter().map(move |(vol, pv)| (conn, vol, pv)))
    }

    /// Combined read throughput of all local volumes (KiB/s).
    pub fn read_per_second(&self) -> f64 {
        self.volumes.values().map(|v| v.read_kib.per_second).sum()
    }

    /// Combined write throughput of all local volumes (KiB/s).
    pub fn write_per_second(&self) -> f64 {
        self.volumes.values().map(|v| v.written_kib.per_second).sum()
    }

    /// Current out-of-sync amount summed over every peer volume (KiB).
    pub fn out_of_sync_kib(&self) -> i64 {
        self.peer_volumes()
            .map(|(_, _, pv)| pv.out_of_sync_kib.current)
            .sum()
    }

    /// Per-interval write deltas summed across volumes, aligned at the newest sample.
    pub fn write_history(&self) -> Vec<f64> {
        let len = self
            .volumes
            .values()
            .map(|v| v.written_kib.history.len())
            .max()
            .unwrap_or(0);
        let mut combined = alloc::vec![0.0; len];
        for vol in self.volumes.values() {
            let offset = len - vol.written_kib.history.len();
            for (i, delta) in vol.written_kib.history.iter().enumerate() {
                combined[offset + i] += delta;
            }
        }
        combined
    }
}
