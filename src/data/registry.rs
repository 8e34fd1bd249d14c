//! Entity registry: routes events to entity states and produces snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use blockwatch_types::{ResourceSnapshot, Snapshot};
use chrono::TimeDelta;
use parking_lot::RwLock;
use tracing::debug;

use super::connection::ConnectionState;
use super::device::DeviceState;
use super::error::UpdateError;
use super::event::{ConnectionKey, DeviceKey, Event, PeerDeviceKey, ResourceKey, Target, Timestamp};
use super::history::DEFAULT_HISTORY_LEN;
use super::peer_device::PeerDeviceState;
use super::resource::ResourceState;

/// Registry shared between the ingestion driver and the readers.
///
/// Ingestion takes the write lock per batch; readers take the read lock only
/// long enough to copy out a [`Snapshot`].
pub type SharedRegistry = Arc<RwLock<Registry>>;

type ConnKey = (String, String);

/// Owns every live entity, keyed by identity.
///
/// Entities are created on first sight and dropped only through
/// [`Registry::remove_resource`] or [`Registry::remove_connection`].
#[derive(Debug, Clone)]
pub struct Registry {
    history_len: usize,
    resources: BTreeMap<String, ResourceState>,
    connections: BTreeMap<ConnKey, ConnectionState>,
    devices: BTreeMap<String, DeviceState>,
    peer_devices: BTreeMap<ConnKey, PeerDeviceState>,
    latest: Option<Timestamp>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl Registry {
    /// Create an empty registry whose rate trackers keep `history_len` deltas.
    pub fn new(history_len: usize) -> Self {
        Self {
            history_len,
            resources: BTreeMap::new(),
            connections: BTreeMap::new(),
            devices: BTreeMap::new(),
            peer_devices: BTreeMap::new(),
            latest: None,
        }
    }

    /// Wrap the registry for sharing across threads.
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Timestamp of the newest event routed so far.
    pub fn latest(&self) -> Option<Timestamp> {
        self.latest
    }

    /// Route one event to its entity, creating the entity if needed.
    ///
    /// Unknown targets and events missing an identity field are rejected
    /// before anything is created or mutated. A field-level parse failure is
    /// returned after every other field of the event has been applied.
    pub fn ingest(&mut self, event: &Event) -> Result<(), UpdateError> {
        let history_len = self.history_len;

        match event.target() {
            Target::Unknown(name) => return Err(UpdateError::UnknownTarget(name.clone())),
            Target::Resource => {
                let name = event.require(ResourceKey::Name)?;
                self.touch(event);
                self.resources
                    .entry(name.to_string())
                    .or_insert_with(|| {
                        debug!(resource = name, "New resource");
                        ResourceState::new(name)
                    })
                    .update(event)?;
            }
            Target::Connection => {
                let name = event.require(ConnectionKey::Name)?;
                let conn = event.require(ConnectionKey::ConnName)?;
                self.touch(event);
                self.connections
                    .entry((name.to_string(), conn.to_string()))
                    .or_insert_with(|| {
                        debug!(resource = name, connection = conn, "New connection");
                        ConnectionState::new(name, conn)
                    })
                    .update(event)?;
            }
            Target::Device => {
                let name = event.require(DeviceKey::Name)?;
                event.require(DeviceKey::Volume)?;
                self.touch(event);
                self.devices
                    .entry(name.to_string())
                    .or_insert_with(|| DeviceState::with_history_len(name, history_len))
                    .update(event)?;
            }
            Target::PeerDevice => {
                let name = event.require(PeerDeviceKey::Name)?;
                let conn = event.require(PeerDeviceKey::ConnName)?;
                event.require(PeerDeviceKey::Volume)?;
                self.touch(event);
                self.peer_devices
                    .entry((name.to_string(), conn.to_string()))
                    .or_insert_with(|| PeerDeviceState::with_history_len(name, conn, history_len))
                    .update(event)?;
            }
        }
        Ok(())
    }

    fn touch(&mut self, event: &Event) {
        let ts = event.timestamp();
        if self.latest.is_none_or(|latest| ts > latest) {
            self.latest = Some(ts);
        }
    }

    /// Drop a resource together with its connections, devices and peer devices.
    ///
    /// Returns false if nothing was known under `name`.
    pub fn remove_resource(&mut self, name: &str) -> bool {
        let mut removed = self.resources.remove(name).is_some();
        removed |= self.devices.remove(name).is_some();

        let before = self.connections.len() + self.peer_devices.len();
        self.connections.retain(|(res, _), _| res != name);
        self.peer_devices.retain(|(res, _), _| res != name);
        removed |= before != self.connections.len() + self.peer_devices.len();

        removed
    }

    /// Drop one connection and the peer-device state seen over it.
    pub fn remove_connection(&mut self, resource: &str, connection: &str) -> bool {
        let key = (resource.to_string(), connection.to_string());
        let conn = self.connections.remove(&key).is_some();
        let peer = self.peer_devices.remove(&key).is_some();
        conn || peer
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    pub fn connection(&self, resource: &str, connection: &str) -> Option<&ConnectionState> {
        self.connections
            .get(&(resource.to_string(), connection.to_string()))
    }

    pub fn device(&self, resource: &str) -> Option<&DeviceState> {
        self.devices.get(resource)
    }

    pub fn peer_device(&self, resource: &str, connection: &str) -> Option<&PeerDeviceState> {
        self.peer_devices
            .get(&(resource.to_string(), connection.to_string()))
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceState> {
        self.resources.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionState> {
        self.connections.values()
    }

    /// Every resource name referenced by any entity.
    pub fn resource_names(&self) -> BTreeSet<&str> {
        self.resources
            .keys()
            .map(String::as_str)
            .chain(self.devices.keys().map(String::as_str))
            .chain(self.connections.keys().map(|(res, _)| res.as_str()))
            .chain(self.peer_devices.keys().map(|(res, _)| res.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
            && self.connections.is_empty()
            && self.devices.is_empty()
            && self.peer_devices.is_empty()
    }

    /// Connections with no applied event within `stale_after` of `now`,
    /// as `(resource, connection)` pairs.
    pub fn stale_connections(&self, now: Timestamp, stale_after: TimeDelta) -> Vec<(&str, &str)> {
        self.connections
            .values()
            .filter(|c| c.is_stale(now, stale_after))
            .map(|c| (c.resource(), c.name()))
            .collect()
    }

    /// Copy the current state of every entity into an owned snapshot.
    ///
    /// Staleness is judged against the newest event timestamp seen.
    pub fn snapshot(&self, stale_after: TimeDelta) -> Snapshot {
        let timestamp_ms = self
            .latest
            .map_or(0, |ts| u64::try_from(ts.timestamp_millis()).unwrap_or(0));

        let mut builder = Snapshot::builder().timestamp_ms(timestamp_ms);
        for name in self.resource_names() {
            builder = builder.resource_snapshot(self.resource_snapshot(name, stale_after));
        }
        builder.build()
    }

    fn resource_snapshot(&self, name: &str, stale_after: TimeDelta) -> ResourceSnapshot {
        let mut snap = ResourceSnapshot::new(name);

        if let Some(res) = self.resources.get(name) {
            snap.role = res.role.clone();
            snap.suspended = res.suspended.clone();
            snap.write_ordering = res.write_ordering.clone();
            snap.uptime = res.uptime.as_micros();
        }

        for conn in self.connections.values().filter(|c| c.resource() == name) {
            let stale = self
                .latest
                .is_some_and(|now| conn.is_stale(now, stale_after));
            snap.connections
                .insert(conn.name().to_string(), conn.snapshot(stale));
        }

        if let Some(dev) = self.devices.get(name) {
            snap.volumes = dev.snapshot();
        }

        for peer in self.peer_devices.values().filter(|p| p.resource() == name) {
            snap.peer_devices
                .insert(peer.connection().to_string(), peer.snapshot());
        }

        snap
    }
}
