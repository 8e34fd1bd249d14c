//! Schema versioning for forward compatibility.

use crate::SCHEMA_VERSION;

/// Schema version information embedded in snapshots.
///
/// Exported snapshots outlive the process that wrote them; the version lets
/// a reader reject a file it does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaVersion {
    /// Major version - breaking changes increment this.
    pub major: u32,

    /// Minor version - backwards-compatible additions increment this.
    pub minor: u32,
}

impl SchemaVersion {
    /// Create a new schema version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The current schema version used by this library.
    pub const fn current() -> Self {
        Self {
            major: SCHEMA_VERSION,
            minor: 0,
        }
    }

    /// Returns true if the major version matches (minor differences are OK).
    pub fn is_compatible(&self) -> bool {
        self.major == SCHEMA_VERSION
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_bump_stays_compatible() {
        assert!(SchemaVersion::new(SCHEMA_VERSION, 7).is_compatible());
        assert!(!SchemaVersion::new(SCHEMA_VERSION + 1, 0).is_compatible());
    }
}
