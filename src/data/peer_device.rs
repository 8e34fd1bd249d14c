//! Remote peer device state, one sub-state per volume.

use std::collections::BTreeMap;

use blockwatch_types::PeerVolumeSnapshot;
use super::error::{keep_first, ParseError};
use super::event::{Event, FieldKey, PeerDeviceKey, Timestamp};
use super::history::DEFAULT_HISTORY_LEN;
use super::rate::RateTracker;
use super::stats::RunningStats;

/// The remote counterpart of one volume, seen over one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerVolumeState {
    last_update: Option<Timestamp>,
    pub replication: String,
    pub peer_disk: String,
    pub resync_suspended: String,
    pub received_kib: RateTracker,
    pub sent_kib: RateTracker,
    /// Only `current` is meaningful to most consumers.
    pub out_of_sync_kib: RunningStats,
    pub pending: RunningStats,
    pub unacked: RunningStats,
}

impl PeerVolumeState {
    pub fn new(history_len: usize) -> Self {
        Self {
            last_update: None,
            replication: String::new(),
            peer_disk: String::new(),
            resync_suspended: String::new(),
            received_kib: RateTracker::new(history_len),
            sent_kib: RateTracker::new(history_len),
            out_of_sync_kib: RunningStats::new(),
            pending: RunningStats::new(),
            unacked: RunningStats::new(),
        }
    }

    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        let now = event.timestamp();
        self.last_update = Some(now);

        let mut first = None;
        for (key, value) in event.known_fields::<PeerDeviceKey>() {
            let field = key.name();
            match key {
                PeerDeviceKey::Name | PeerDeviceKey::ConnName | PeerDeviceKey::Volume => {}
                PeerDeviceKey::Replication => self.replication = value.to_string(),
                PeerDeviceKey::PeerDisk => self.peer_disk = value.to_string(),
                PeerDeviceKey::ResyncSuspended => self.resync_suspended = value.to_string(),
                PeerDeviceKey::Received => keep_first(
                    &mut first,
                    self.received_kib.sample(now, field, value),
                ),
                PeerDeviceKey::Sent => {
                    keep_first(&mut first, self.sent_kib.sample(now, field, value))
                }
                PeerDeviceKey::OutOfSync => {
                    keep_first(&mut first, self.out_of_sync_kib.calculate(field, value))
                }
                PeerDeviceKey::Pending => {
                    keep_first(&mut first, self.pending.calculate(field, value))
                }
                PeerDeviceKey::Unacked => {
                    keep_first(&mut first, self.unacked.calculate(field, value))
                }
            }
        }

        first.map_or(Ok(()), Err)
    }

    pub fn snapshot(&self) -> PeerVolumeSnapshot {
        PeerVolumeSnapshot {
            replication: self.replication.clone(),
            peer_disk: self.peer_disk.clone(),
            resync_suspended: self.resync_suspended.clone(),
            received_kib: self.received_kib.snapshot(),
            sent_kib: self.sent_kib.snapshot(),
            out_of_sync_kib: self.out_of_sync_kib.snapshot(),
            pending: self.pending.snapshot(),
            unacked: self.unacked.snapshot(),
        }
    }
}

/// All peer volumes of one resource over one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerDeviceState {
    resource: String,
    connection: String,
    history_len: usize,
    pub volumes: BTreeMap<String, PeerVolumeState>,
}

impl PeerDeviceState {
    pub fn new(resource: impl Into<String>, connection: impl Into<String>) -> Self {
        Self::with_history_len(resource, connection, DEFAULT_HISTORY_LEN)
    }

    pub fn with_history_len(
        resource: impl Into<String>,
        connection: impl Into<String>,
        history_len: usize,
    ) -> Self {
        Self {
            resource: resource.into(),
            connection: connection.into(),
            history_len,
            volumes: BTreeMap::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    /// Apply a `peer-device` event to the volume it names, creating the
    /// volume on first sight. Events without a volume id are ignored.
    pub fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        let Some(volume) = event.get(PeerDeviceKey::Volume) else {
            return Ok(());
        };
        let history_len = self.history_len;
        self.volumes
            .entry(volume.to_string())
            .or_insert_with(|| PeerVolumeState::new(history_len))
            .update(event)
    }

    pub fn snapshot(&self) -> BTreeMap<String, PeerVolumeSnapshot> {
        self.volumes
            .iter()
            .map(|(id, vol)| (id.clone(), vol.snapshot()))
            .collect()
    }
}
