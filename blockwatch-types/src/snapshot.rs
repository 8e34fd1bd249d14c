//! Snapshot - a point-in-time view of every monitored resource.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::{ResourceSnapshot, SchemaVersion};

/// A point-in-time copy of the aggregation engine's state.
///
/// Snapshots are taken under a short read lock and then handed to the
/// renderer or exporter, which may hold on to them as long as it likes.
///
/// # Example
///
/// ```rust
/// use blockwatch_types::Snapshot;
///
/// let snapshot = Snapshot::builder()
///     .resource("r0", |r| r.role = "Secondary".to_string())
///     .resource("r1", |r| r.role = "Primary".to_string())
///     .build();
///
/// assert_eq!(snapshot.len(), 2);
/// // Serialize with serde (requires "serde" feature)
/// // let json = serde_json::to_string(&snapshot)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Resources keyed by resource name.
    pub resources: BTreeMap<String, ResourceSnapshot>,
}

impl Snapshot {
    /// Create a new, empty snapshot with the current timestamp.
    #[cfg(feature = "std")]
    pub fn new() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }

    /// Create a new, empty snapshot with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            version: SchemaVersion::current(),
            timestamp_ms,
            resources: BTreeMap::new(),
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Check if the snapshot is empty (no resources).
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of resources in the snapshot.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Get a resource by name.
    pub fn get(&self, resource: &str) -> Option<&ResourceSnapshot> {
        self.resources.get(resource)
    }

    /// Iterate over all resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceSnapshot)> {
        self.resources.iter()
    }

    /// Total number of connections across all resources.
    pub fn connection_count(&self) -> usize {
        self.resources.values().map(|r| r.connections.len()).sum()
    }

    /// Combined read throughput across all resources (KiB/s).
    pub fn read_per_second(&self) -> f64 {
        self.resources.values().map(|r| r.read_per_second()).sum()
    }

    /// Combined write throughput across all resources (KiB/s).
    pub fn write_per_second(&self) -> f64 {
        self.resources.values().map(|r| r.write_per_second()).sum()
    }
}

#[cfg(feature = "std")]
impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    resources: BTreeMap<String, ResourceSnapshot>,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            timestamp_ms: None,
            resources: BTreeMap::new(),
        }
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add a resource, filling it in with a closure.
    pub fn resource<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(&mut ResourceSnapshot),
    {
        let name = name.into();
        let mut resource = ResourceSnapshot::new(name.clone());
        f(&mut resource);
        self.resources.insert(name, resource);
        self
    }

    /// Add a fully built resource.
    pub fn resource_snapshot(mut self, resource: ResourceSnapshot) -> Self {
        self.resources.insert(resource.name.clone(), resource);
        self
    }

    /// Build the snapshot.
    #[cfg(feature = "std")]
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            resources: self.resources,
        }
    }

    /// Build the snapshot with a specific timestamp (for no_std).
    #[cfg(not(feature = "std"))]
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or(0),
            resources: self.resources,
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
