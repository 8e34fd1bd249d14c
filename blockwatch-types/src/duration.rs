//! Duration representation for serialization.
//!
//! Uptimes travel as microseconds so that every consumer (JSON export,
//! terminal renderer, other languages) sees the same integer unit.

use core::fmt;
use core::time::Duration;

/// Duration in microseconds.
///
/// Used for entity uptimes. Microseconds keep the sub-second precision of the
/// source timestamps while fitting comfortably in a `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Microseconds(pub u64);

impl Microseconds {
    /// Zero duration.
    pub const ZERO: Self = Self(0);

    /// Create from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create from a signed microsecond count, clamping negatives to zero.
    ///
    /// Differences between wall-clock timestamps can come out negative when a
    /// source clock steps backwards; an uptime is never negative.
    pub const fn from_signed_micros(micros: i64) -> Self {
        if micros < 0 {
            Self(0)
        } else {
            Self(micros as u64)
        }
    }

    /// Create from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1000)
    }

    /// Create from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Get the value in microseconds.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Get the value in milliseconds (truncated).
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1000
    }

    /// Get the value in seconds (truncated).
    pub const fn as_secs(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Get the value in fractional seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to a standard Duration.
    pub const fn to_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl From<Duration> for Microseconds {
    fn from(d: Duration) -> Self {
        Self(d.as_micros() as u64)
    }
}

impl From<Microseconds> for Duration {
    fn from(m: Microseconds) -> Self {
        Duration::from_micros(m.0)
    }
}

/// Human-readable uptime: `3d 4h 5m 6s`, dropping leading zero units.
impl fmt::Display for Microseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs();
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if days > 0 {
            write!(f, "{}d {}h {}m {}s", days, hours, minutes, seconds)
        } else if hours > 0 {
            write!(f, "{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            write!(f, "{}m {}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}
