//! Connection-level state.

use blockwatch_types::ConnectionSnapshot;
use chrono::TimeDelta;

use super::error::ParseError;
use super::event::{ConnectionKey, Event, Timestamp};
use super::uptime::UptimeTracker;

/// The link between a resource's local node and one peer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    resource: String,
    name: String,
    pub peer_node_id: String,
    pub connection: String,
    pub role: String,
    pub congested: String,
    update_count: u64,
    pub uptime: UptimeTracker,
}

impl ConnectionState {
    pub fn new(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of events applied so far.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Timestamp of the most recently applied event.
    pub fn last_update(&self) -> Option<Timestamp> {
        self.uptime.current_time
    }

    /// Apply a `connection` event and bump the update counter.
    pub fn update(&mut self, event: &Event) -> Result<(), ParseError> {
        self.uptime.update_times(event.timestamp());

        for (key, value) in event.known_fields::<ConnectionKey>() {
            match key {
                ConnectionKey::Name | ConnectionKey::ConnName => {}
                ConnectionKey::PeerNodeId => self.peer_node_id = value.to_string(),
                ConnectionKey::Connection => self.connection = value.to_string(),
                ConnectionKey::Role => self.role = value.to_string(),
                ConnectionKey::Congested => self.congested = value.to_string(),
            }
        }

        self.update_count += 1;
        Ok(())
    }

    /// True if nothing has been applied within `stale_after` of `now`.
    pub fn is_stale(&self, now: Timestamp, stale_after: TimeDelta) -> bool {
        match self.last_update() {
            Some(last) => now - last > stale_after,
            None => true,
        }
    }

    pub fn snapshot(&self, stale: bool) -> ConnectionSnapshot {
        ConnectionSnapshot {
            name: self.name.clone(),
            peer_node_id: self.peer_node_id.clone(),
            connection: self.connection.clone(),
            role: self.role.clone(),
            congested: self.congested.clone(),
            update_count: self.update_count,
            uptime: self.uptime.as_micros(),
            stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::event::Target;
    use chrono::DateTime;

    fn ts() -> Timestamp {
        DateTime::parse_from_rfc3339("2017-02-15T12:57:53.000000-08:00").unwrap()
    }

    fn event(at: Timestamp) -> Event {
        Event::new(at, Target::Connection)
            .with(ConnectionKey::Name, "test0")
            .with(ConnectionKey::ConnName, "peer")
    }

    #[test]
    fn update_counts_every_apply() {
        let mut c = ConnectionState::new("test0", "peer");
        let e = event(ts())
            .with(ConnectionKey::PeerNodeId, "1")
            .with(ConnectionKey::Connection, "Connected")
            .with(ConnectionKey::Role, "Secondary")
            .with(ConnectionKey::Congested, "no");

        c.update(&e).unwrap();
        assert_eq!(c.update_count(), 1);
        assert_eq!(c.peer_node_id, "1");
        assert_eq!(c.connection, "Connected");
        assert_eq!(c.role, "Secondary");
        assert_eq!(c.congested, "no");

        c.update(&e).unwrap();
        assert_eq!(c.update_count(), 2);
    }

    #[test]
    fn replay_only_changes_counter() {
        let mut c = ConnectionState::new("test0", "peer");
        let e = event(ts()).with(ConnectionKey::Connection, "Connected");
        c.update(&e).unwrap();
        let before = c.clone();

        c.update(&e).unwrap();
        assert_eq!(c.update_count(), before.update_count() + 1);
        assert_eq!(c.connection, before.connection);
        assert_eq!(c.uptime, before.uptime);
    }

    #[test]
    fn partial_update_keeps_missing_fields() {
        let mut c = ConnectionState::new("test0", "peer");
        c.update(
            &event(ts())
                .with(ConnectionKey::Connection, "Connected")
                .with(ConnectionKey::Role, "Secondary"),
        )
        .unwrap();
        c.update(&event(ts()).with(ConnectionKey::Connection, "Connecting"))
            .unwrap();

        assert_eq!(c.connection, "Connecting");
        assert_eq!(c.role, "Secondary");
    }

    #[test]
    fn staleness_is_relative_to_last_update() {
        let mut c = ConnectionState::new("test0", "peer");
        assert!(c.is_stale(ts(), TimeDelta::seconds(30)));

        c.update(&event(ts())).unwrap();
        assert!(!c.is_stale(ts() + TimeDelta::seconds(30), TimeDelta::seconds(30)));
        assert!(c.is_stale(ts() + TimeDelta::seconds(31), TimeDelta::seconds(30)));
    }

    #[test]
    fn snapshot_carries_counter_and_uptime() {
        let mut c = ConnectionState::new("test0", "peer");
        c.update(&event(ts())).unwrap();
        c.update(&event(ts() + TimeDelta::seconds(3))).unwrap();

        let snap = c.snapshot(false);
        assert_eq!(snap.name, "peer");
        assert_eq!(snap.update_count, 2);
        assert_eq!(snap.uptime.as_secs(), 3);
        assert!(!snap.is_fresh());
        assert!(!snap.stale);
    }
}
