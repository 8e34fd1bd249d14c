//! Ingestion driver: drains a data source into the shared registry.

use tracing::{debug, info, warn};

use crate::data::{ConnectionKey, Registry, ResourceKey, SharedRegistry, Target, UpdateError};
use crate::source::{Action, DataSource, Record};

/// Default number of records applied under one write lock.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Applies records to a registry and keeps count of what went wrong.
///
/// Errors never stop ingestion; they are counted and the latest one is kept
/// for display.
#[derive(Debug, Clone)]
pub struct Ingestor {
    batch_size: usize,
    applied: u64,
    errors: u64,
    last_error: Option<String>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Ingestor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            applied: 0,
            errors: 0,
            last_error: None,
        }
    }

    /// Records applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Records that were rejected or partly applied.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply up to one batch of pending records under a single write lock.
    ///
    /// Returns the number of records taken from the source.
    pub fn drain(&mut self, source: &mut dyn DataSource, registry: &SharedRegistry) -> usize {
        let Some(first) = source.poll() else {
            return 0;
        };

        let mut registry = registry.write();
        self.apply(&mut registry, &first);
        let mut taken = 1;
        while taken < self.batch_size {
            let Some(record) = source.poll() else {
                break;
            };
            self.apply(&mut registry, &record);
            taken += 1;
        }
        taken
    }

    /// Apply every record the source has right now, batch after batch.
    pub fn drain_all(&mut self, source: &mut dyn DataSource, registry: &SharedRegistry) -> usize {
        let mut total = 0;
        loop {
            let taken = self.drain(source, registry);
            if taken == 0 {
                return total;
            }
            total += taken;
        }
    }

    /// Apply one record, recording any error.
    pub fn apply(&mut self, registry: &mut Registry, record: &Record) {
        self.applied += 1;
        if let Err(e) = apply_record(registry, record) {
            match e {
                UpdateError::Parse(_) => debug!(error = %e, "Field skipped"),
                _ => debug!(error = %e, action = %record.action, "Event rejected"),
            }
            self.errors += 1;
            self.last_error = Some(e.to_string());
        }
    }
}

/// Route one record to the registry according to its action.
///
/// `exists`, `create` and `change` update state; `destroy` on a resource or
/// connection removes it; every other combination is ignored.
pub fn apply_record(registry: &mut Registry, record: &Record) -> Result<(), UpdateError> {
    let event = &record.event;
    match record.action {
        Action::Exists | Action::Create | Action::Change => registry.ingest(event),
        Action::Destroy => match event.target() {
            Target::Resource => {
                let name = event.require(ResourceKey::Name)?;
                if registry.remove_resource(name) {
                    info!(resource = name, "Resource destroyed");
                }
                Ok(())
            }
            Target::Connection => {
                let name = event.require(ConnectionKey::Name)?;
                let conn = event.require(ConnectionKey::ConnName)?;
                if registry.remove_connection(name, conn) {
                    info!(resource = name, connection = conn, "Connection destroyed");
                }
                Ok(())
            }
            Target::Device | Target::PeerDevice => {
                debug!(object = %event.target(), "Ignoring volume destroy");
                Ok(())
            }
            Target::Unknown(name) => Err(UpdateError::UnknownTarget(name.clone())),
        },
        Action::Call | Action::Response => Ok(()),
    }
}

/// Log a source error once per distinct message.
pub fn note_source_error(last: &mut Option<String>, current: Option<String>) {
    if current != *last {
        if let Some(ref msg) = current {
            warn!(error = msg.as_str(), "Data source error");
        }
        *last = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{parse_line, ChannelSource};

    fn record(line: &str) -> Record {
        parse_line(line).unwrap().unwrap()
    }

    fn ingest(registry: &mut Registry, lines: &[&str]) -> Ingestor {
        let mut ingestor = Ingestor::default();
        for line in lines {
            ingestor.apply(registry, &record(line));
        }
        ingestor
    }

    #[test]
    fn change_lines_update_state() {
        let mut reg = Registry::default();
        let ing = ingest(
            &mut reg,
            &[
                "2017-02-15T12:57:53.000000-08:00 exists resource name:r0 role:Primary",
                "2017-02-15T12:57:54.000000-08:00 change resource name:r0 role:Secondary",
            ],
        );

        assert_eq!(reg.resource("r0").unwrap().role, "Secondary");
        assert_eq!(ing.applied(), 2);
        assert_eq!(ing.errors(), 0);
    }

    #[test]
    fn destroy_resource_and_connection() {
        let mut reg = Registry::default();
        ingest(
            &mut reg,
            &[
                "exists resource name:r0",
                "exists connection name:r0 conn-name:a connection:Connected",
                "exists connection name:r0 conn-name:b connection:Connected",
                "destroy connection name:r0 conn-name:a",
            ],
        );
        assert!(reg.connection("r0", "a").is_none());
        assert!(reg.connection("r0", "b").is_some());

        ingest(&mut reg, &["destroy resource name:r0"]);
        assert!(reg.is_empty());
    }

    #[test]
    fn destroy_volume_is_ignored() {
        let mut reg = Registry::default();
        let ing = ingest(
            &mut reg,
            &[
                "exists device name:r0 volume:0 disk:UpToDate",
                "destroy device name:r0 volume:0",
            ],
        );
        assert_eq!(reg.device("r0").unwrap().volumes.len(), 1);
        assert_eq!(ing.errors(), 0);
    }

    #[test]
    fn helper_calls_are_ignored() {
        let mut reg = Registry::default();
        let ing = ingest(
            &mut reg,
            &[
                "call helper name:r0 helper:before-resync-target",
                "response helper name:r0 helper:before-resync-target status:0",
            ],
        );
        assert!(reg.is_empty());
        assert_eq!(ing.errors(), 0);
    }

    #[test]
    fn errors_are_counted_not_fatal() {
        let mut reg = Registry::default();
        let ing = ingest(
            &mut reg,
            &[
                "exists path name:r0 conn-name:peer",
                "exists device name:r0 volume:0 read:lots disk:UpToDate",
                "exists resource role:Primary",
                "exists resource name:r1",
            ],
        );

        assert_eq!(ing.errors(), 3);
        assert!(ing.last_error().unwrap().contains("missing required field name"));
        assert_eq!(reg.device("r0").unwrap().volumes["0"].disk, "UpToDate");
        assert!(reg.resource("r1").is_some());
    }

    #[test]
    fn drain_respects_batch_size() {
        let (tx, mut source) = ChannelSource::create("test");
        for i in 0..5 {
            tx.send(record(&format!("exists resource name:r{i}"))).unwrap();
        }

        let registry = Registry::default().shared();
        let mut ing = Ingestor::new(2);
        assert_eq!(ing.drain(&mut source, &registry), 2);
        assert_eq!(registry.read().resources().count(), 2);

        assert_eq!(ing.drain_all(&mut source, &registry), 3);
        assert_eq!(registry.read().resources().count(), 5);
        assert_eq!(ing.drain(&mut source, &registry), 0);
    }

    #[test]
    fn source_errors_logged_once() {
        let mut last = None;
        note_source_error(&mut last, Some("Connection closed".into()));
        assert_eq!(last.as_deref(), Some("Connection closed"));
        note_source_error(&mut last, None);
        assert!(last.is_none());
    }
}
