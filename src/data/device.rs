//! Local block device state, one sub-state per volume.

use std::collections::BTreeMap;

use blockwatch_types::DeviceVolumeSnapshot;
use super::error::{keep_first, ParseError};
use super::event::{DeviceKey, Event, FieldKey, Timestamp};
use super::history::DEFAULT_HISTORY_LEN;
use super::rate::RateTracker;
use super::stats::RunningStats;

/// One local volume of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceVolumeState {
    last_update: Option<Timestamp>,
    pub minor: String,
    pub disk: String,
    /// Size in KiB.
    pub size: u64,
    pub read_kib: RateTracker,
    pub written_kib: RateTracker,
    pub al_writes: RateTracker,
    pub bm_writes: RateTracker,
    pub upper_pending: RunningStats,
    pub lower_pending: RunningStats,
    pub al_suspended: String,
    pub blocked: String,
}

impl DeviceVolumeState {
    pub fn new(history_len: usize) -> Self {
        Self {
            last_update: None,
            minor: String::new(),
            disk: String::new(),
            size: 0,
            read_kib: RateTracker::new(history_len),
            written_kib: RateTracker::new(history_len),
            al_writes: RateTracker::new(history_len),
            bm_writes: RateTracker::new(history_len),
            upper_pending: RunningStats::new(),
            lower_pending: RunningStats::new(),
            al_suspended: String::new(),
            blocked: String::new(),
        }
    }

    /// Timestamp of the last event applied to this volume.
    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        let now = event.timestamp();
        self.last_update = Some(now);

        let mut first = None;
        for (key, value) in event.known_fields::<DeviceKey>() {
            let field = key.name();
            match key {
                DeviceKey::Name | DeviceKey::Volume => {}
                DeviceKey::Minor => self.minor = value.to_string(),
                DeviceKey::Disk => self.disk = value.to_string(),
                DeviceKey::Size => {
                    let size = value
                        .trim()
                        .parse::<u64>()
                        .map_err(|e| ParseError::new(field, value, e));
                    if let Ok(size) = size {
                        self.size = size;
                    }
                    keep_first(&mut first, size);
                }
                DeviceKey::Read => {
                    keep_first(&mut first, self.read_kib.sample(now, field, value))
                }
                DeviceKey::Written => keep_first(
                    &mut first,
                    self.written_kib.sample(now, field, value),
                ),
                DeviceKey::AlWrites => {
                    keep_first(&mut first, self.al_writes.sample(now, field, value))
                }
                DeviceKey::BmWrites => {
                    keep_first(&mut first, self.bm_writes.sample(now, field, value))
                }
                DeviceKey::UpperPending => {
                    keep_first(&mut first, self.upper_pending.calculate(field, value))
                }
                DeviceKey::LowerPending => {
                    keep_first(&mut first, self.lower_pending.calculate(field, value))
                }
                DeviceKey::AlSuspended => self.al_suspended = value.to_string(),
                DeviceKey::Blocked => self.blocked = value.to_string(),
            }
        }

        first.map_or(Ok(()), Err)
    }

    pub fn snapshot(&self) -> DeviceVolumeSnapshot {
        DeviceVolumeSnapshot {
            minor: self.minor.clone(),
            disk: self.disk.clone(),
            size: self.size,
            read_kib: self.read_kib.snapshot(),
            written_kib: self.written_kib.snapshot(),
            al_writes: self.al_writes.snapshot(),
            bm_writes: self.bm_writes.snapshot(),
            upper_pending: self.upper_pending.snapshot(),
            lower_pending: self.lower_pending.snapshot(),
            al_suspended: self.al_suspended.clone(),
            blocked: self.blocked.clone(),
        }
    }
}

/// All local volumes of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    resource: String,
    history_len: usize,
    pub volumes: BTreeMap<String, DeviceVolumeState>,
}

impl DeviceState {
    pub fn new(resource: impl Into<String>) -> Self {
        Self::with_history_len(resource, DEFAULT_HISTORY_LEN)
    }

    /// Create a device whose rate trackers keep `history_len` deltas.
    pub fn with_history_len(resource: impl Into<String>, history_len: usize) -> Self {
        Self {
            resource: resource.into(),
            history_len,
            volumes: BTreeMap::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Apply a `device` event to the volume it names, creating the volume on
    /// first sight.
    ///
    /// Events without a volume id are ignored. Every field that parses is
    /// applied; the first field that does not is returned as the error.
    pub fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        let Some(volume) = event.get(DeviceKey::Volume) else {
            return Ok(());
        };
        let history_len = self.history_len;
        self.volumes
            .entry(volume.to_string())
            .or_insert_with(|| DeviceVolumeState::new(history_len))
            .update(event)
    }

    pub fn snapshot(&self) -> BTreeMap<String, DeviceVolumeSnapshot> {
        self.volumes
            .iter()
            .map(|(id, vol)| (id.clone(), vol.snapshot()))
            .collect()
    }
}
