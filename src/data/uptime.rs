//! Uptime accounting from source-reported timestamps.

use blockwatch_types::Microseconds;
use chrono::TimeDelta;

use super::event::Timestamp;

/// Tracks how long an entity has been observed.
///
/// The first timestamp defines the epoch; every later one moves the current
/// time forward and recomputes the uptime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UptimeTracker {
    pub start_time: Option<Timestamp>,
    pub current_time: Option<Timestamp>,
    pub uptime: TimeDelta,
}

impl UptimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation at `t`.
    pub fn update_times(&mut self, t: Timestamp) {
        let start = *self.start_time.get_or_insert(t);
        self.current_time = Some(t);
        self.uptime = t - start;
    }

    /// Uptime for display; negative spans (clock stepped back) clamp to zero.
    pub fn as_micros(&self) -> Microseconds {
        Microseconds::from_signed_micros(self.uptime.num_microseconds().unwrap_or(i64::MAX))
    }
}
