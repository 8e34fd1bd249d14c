//! The ingestion contract: status events and their field vocabularies.
//!
//! Every event names the kind of entity it describes ([`Target`]) and carries
//! a flat `key -> raw value` map. Each target has a fixed, ordered vocabulary
//! of keys it understands ([`ResourceKey`], [`ConnectionKey`], [`DeviceKey`],
//! [`PeerDeviceKey`]); the same tables drive lookups into the field map and
//! any fixed-order display.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use super::error::UpdateError;

/// Absolute, offset-aware timestamp as reported by the event source.
pub type Timestamp = DateTime<FixedOffset>;

/// The kind of entity an event describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Resource,
    Connection,
    Device,
    PeerDevice,
    /// Anything else the source emits (paths, helpers, ...). Rejected by the registry.
    Unknown(String),
}

impl Target {
    /// The wire name of this target.
    pub fn as_str(&self) -> &str {
        match self {
            Target::Resource => "resource",
            Target::Connection => "connection",
            Target::Device => "device",
            Target::PeerDevice => "peer-device",
            Target::Unknown(name) => name,
        }
    }
}

impl FromStr for Target {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "resource" => Target::Resource,
            "connection" => Target::Connection,
            "device" => Target::Device,
            "peer-device" => Target::PeerDevice,
            other => Target::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key in one target's field vocabulary.
pub trait FieldKey: Copy + 'static {
    /// Every key of the vocabulary, in display order.
    const ALL: &'static [Self];

    /// The wire name used in the event's field map.
    fn name(self) -> &'static str;
}

/// Fields of a `resource` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Name,
    Role,
    Suspended,
    WriteOrdering,
}

impl FieldKey for ResourceKey {
    const ALL: &'static [Self] = &[Self::Name, Self::Role, Self::Suspended, Self::WriteOrdering];

    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Role => "role",
            Self::Suspended => "suspended",
            Self::WriteOrdering => "write-ordering",
        }
    }
}

/// Fields of a `connection` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKey {
    Name,
    PeerNodeId,
    ConnName,
    Connection,
    Role,
    Congested,
}

impl FieldKey for ConnectionKey {
    const ALL: &'static [Self] = &[
        Self::Name,
        Self::PeerNodeId,
        Self::ConnName,
        Self::Connection,
        Self::Role,
        Self::Congested,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PeerNodeId => "peer-node-id",
            Self::ConnName => "conn-name",
            Self::Connection => "connection",
            Self::Role => "role",
            Self::Congested => "congested",
        }
    }
}

/// Fields of a `device` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKey {
    Name,
    Volume,
    Minor,
    Disk,
    Size,
    Read,
    Written,
    AlWrites,
    BmWrites,
    UpperPending,
    LowerPending,
    AlSuspended,
    Blocked,
}

impl FieldKey for DeviceKey {
    const ALL: &'static [Self] = &[
        Self::Name,
        Self::Volume,
        Self::Minor,
        Self::Disk,
        Self::Size,
        Self::Read,
        Self::Written,
        Self::AlWrites,
        Self::BmWrites,
        Self::UpperPending,
        Self::LowerPending,
        Self::AlSuspended,
        Self::Blocked,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Volume => "volume",
            Self::Minor => "minor",
            Self::Disk => "disk",
            Self::Size => "size",
            Self::Read => "read",
            Self::Written => "written",
            Self::AlWrites => "al-writes",
            Self::BmWrites => "bm-writes",
            Self::UpperPending => "upper-pending",
            Self::LowerPending => "lower-pending",
            Self::AlSuspended => "al-suspended",
            Self::Blocked => "blocked",
        }
    }
}

/// Fields of a `peer-device` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerDeviceKey {
    Name,
    ConnName,
    Volume,
    Replication,
    PeerDisk,
    ResyncSuspended,
    Received,
    Sent,
    OutOfSync,
    Pending,
    Unacked,
}

impl FieldKey for PeerDeviceKey {
    const ALL: &'static [Self] = &[
        Self::Name,
        Self::ConnName,
        Self::Volume,
        Self::Replication,
        Self::PeerDisk,
        Self::ResyncSuspended,
        Self::Received,
        Self::Sent,
        Self::OutOfSync,
        Self::Pending,
        Self::Unacked,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ConnName => "conn-name",
            Self::Volume => "volume",
            Self::Replication => "replication",
            Self::PeerDisk => "peer-disk",
            Self::ResyncSuspended => "resync-suspended",
            Self::Received => "received",
            Self::Sent => "sent",
            Self::OutOfSync => "out-of-sync",
            Self::Pending => "pending",
            Self::Unacked => "unacked",
        }
    }
}

/// One status event from the storage subsystem.
///
/// Immutable once built: the `with*` constructors consume and return the
/// event, there are no setters.
///
/// ```
/// use blockwatch::data::{DeviceKey, Event, Target};
///
/// let ts = "2017-02-15T12:57:53.000000-08:00".parse().unwrap();
/// let event = Event::new(ts, Target::Device)
///     .with(DeviceKey::Name, "r0")
///     .with(DeviceKey::Volume, "0")
///     .with(DeviceKey::Read, "1024");
///
/// assert_eq!(event.get(DeviceKey::Read), Some("1024"));
/// assert_eq!(event.get(DeviceKey::Written), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: Timestamp,
    target: Target,
    fields: HashMap<String, String>,
}

impl Event {
    /// Create an event with no fields.
    pub fn new(timestamp: Timestamp, target: Target) -> Self {
        Self {
            timestamp,
            target,
            fields: HashMap::new(),
        }
    }

    /// Create an event from an already collected field map.
    pub fn from_fields(timestamp: Timestamp, target: Target, fields: HashMap<String, String>) -> Self {
        Self {
            timestamp,
            target,
            fields,
        }
    }

    /// Add a field from a target's vocabulary.
    pub fn with<K: FieldKey>(self, key: K, value: impl Into<String>) -> Self {
        self.with_raw(key.name(), value)
    }

    /// Add a field by wire name. A later value for the same key replaces the earlier one.
    pub fn with_raw(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The raw field map, including keys outside the target's vocabulary.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Look up a field by vocabulary key.
    pub fn get<K: FieldKey>(&self, key: K) -> Option<&str> {
        self.fields.get(key.name()).map(String::as_str)
    }

    /// Look up an identity field the event cannot be routed without.
    pub fn require<K: FieldKey>(&self, key: K) -> Result<&str, UpdateError> {
        self.get(key).ok_or_else(|| UpdateError::MissingKey {
            target: self.target.clone(),
            field: key.name(),
        })
    }

    /// Recognised fields of vocabulary `K` present on this event, in vocabulary order.
    pub fn known_fields<K: FieldKey>(&self) -> impl Iterator<Item = (K, &str)> + '_ {
        K::ALL
            .iter()
            .filter_map(move |&key| self.get(key).map(|value| (key, value)))
    }
}
