//! Resource-level state.

use super::error::ParseError;
use super::event::{Event, ResourceKey};
use super::uptime::UptimeTracker;

/// A replicated resource as seen through `resource` events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    name: String,
    pub role: String,
    pub suspended: String,
    pub write_ordering: String,
    pub uptime: UptimeTracker,
}

impl ResourceState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply a `resource` event. Absent fields keep their previous value.
    ///
    /// Resources carry no numeric fields, so this never fails; the result
    /// keeps the signature uniform with the other entity states.
    pub fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        self.uptime.update_times(event.timestamp());

        for (key, value) in event.known_fields::<ResourceKey>() {
            match key {
                ResourceKey::Name => {}
                ResourceKey::Role => self.role = value.to_string(),
                ResourceKey::Suspended => self.suspended = value.to_string(),
                ResourceKey::WriteOrdering => self.write_ordering = value.to_string(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::event::{Target, Timestamp};
    use chrono::{DateTime, TimeDelta};

    fn ts() -> Timestamp {
        DateTime::parse_from_rfc3339("2017-02-15T12:57:53.000000-08:00").unwrap()
    }

    fn event(at: Timestamp) -> Event {
        Event::new(at, Target::Resource).with(ResourceKey::Name, "test0")
    }

    #[test]
    fn update_copies_textual_fields() {
        let mut r = ResourceState::new("test0");
        r.update(
            &event(ts())
                .with(ResourceKey::Role, "Primary")
                .with(ResourceKey::Suspended, "no")
                .with(ResourceKey::WriteOrdering, "flush"),
        )
        .unwrap();

        assert_eq!(r.name(), "test0");
        assert_eq!(r.role, "Primary");
        assert_eq!(r.suspended, "no");
        assert_eq!(r.write_ordering, "flush");
    }

    #[test]
    fn partial_update_keeps_missing_fields() {
        let mut r = ResourceState::new("test0");
        r.update(
            &event(ts())
                .with(ResourceKey::Role, "Primary")
                .with(ResourceKey::Suspended, "no"),
        )
        .unwrap();
        r.update(&event(ts()).with(ResourceKey::Role, "Secondary"))
            .unwrap();

        assert_eq!(r.role, "Secondary");
        assert_eq!(r.suspended, "no");
    }

    #[test]
    fn update_drives_uptime() {
        let mut r = ResourceState::new("test0");
        r.update(&event(ts())).unwrap();
        r.update(&event(ts() + TimeDelta::seconds(12))).unwrap();

        assert_eq!(r.uptime.start_time, Some(ts()));
        assert_eq!(r.uptime.uptime, TimeDelta::seconds(12));
    }

    #[test]
    fn replay_is_idempotent() {
        let mut r = ResourceState::new("test0");
        let e = event(ts()).with(ResourceKey::Role, "Primary");
        r.update(&e).unwrap();
        let before = r.clone();
        r.update(&e).unwrap();
        assert_eq!(r, before);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut r = ResourceState::new("test0");
        r.update(&event(ts()).with_raw("may_promote", "yes")).unwrap();
        assert_eq!(r.role, "");
    }
}
