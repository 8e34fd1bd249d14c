//! End-to-end: captured event log -> tokenizer -> registry -> snapshot.

use std::io::Write;

use blockwatch::data::health::{resource_health, resource_issues};
use blockwatch::data::Registry;
use blockwatch::{DataSource, FileSource, HealthStatus, Ingestor, Snapshot};
use chrono::TimeDelta;
use tempfile::NamedTempFile;

const INITIAL_DUMP: &str = "\
2017-02-15T12:57:53.000000-08:00 exists resource name:r0 role:Primary suspended:no write-ordering:flush
2017-02-15T12:57:53.000000-08:00 exists connection name:r0 peer-node-id:1 conn-name:peer connection:Connected role:Secondary congested:no
2017-02-15T12:57:53.000000-08:00 exists device name:r0 volume:0 minor:0 disk:UpToDate size:1048576 read:100 written:200 al-writes:4 bm-writes:0 upper-pending:0 lower-pending:0 al-suspended:no blocked:no
2017-02-15T12:57:53.000000-08:00 exists peer-device name:r0 peer-node-id:1 conn-name:peer volume:0 replication:Established peer-disk:UpToDate resync-suspended:no received:0 sent:0 out-of-sync:0 pending:0 unacked:0
exists -
";

const CHANGES: &str = "\
2017-02-15T12:57:55.000000-08:00 change device name:r0 volume:0 read:300 written:1200
2017-02-15T12:57:55.000000-08:00 change peer-device name:r0 conn-name:peer volume:0 replication:SyncSource sent:1000 out-of-sync:512
";

fn log_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

fn replay(contents: &str, stale_after: TimeDelta) -> (Snapshot, Ingestor) {
    let file = log_file(contents);
    let mut source = FileSource::new(file.path());
    let registry = Registry::default().shared();
    let mut ingestor = Ingestor::default();
    ingestor.drain_all(&mut source, &registry);
    let snapshot = registry.read().snapshot(stale_after);
    (snapshot, ingestor)
}

#[test]
fn initial_dump_builds_every_entity() {
    let (snapshot, ingestor) = replay(INITIAL_DUMP, TimeDelta::seconds(30));

    assert_eq!(ingestor.applied(), 4);
    assert_eq!(ingestor.errors(), 0);

    let r0 = snapshot.get("r0").unwrap();
    assert_eq!(r0.role, "Primary");
    assert_eq!(r0.write_ordering, "flush");

    let conn = &r0.connections["peer"];
    assert_eq!(conn.connection, "Connected");
    assert_eq!(conn.peer_node_id, "1");
    assert!(conn.is_fresh());

    let vol = &r0.volumes["0"];
    assert_eq!(vol.disk, "UpToDate");
    assert_eq!(vol.size, 1_048_576);
    assert_eq!(vol.read_kib.total, 0.0);

    assert_eq!(r0.peer_devices["peer"]["0"].replication, "Established");
    assert_eq!(resource_health(r0), HealthStatus::Healthy);
}

#[test]
fn statistics_turn_into_rates_and_envelopes() {
    let (snapshot, ingestor) = replay(&format!("{INITIAL_DUMP}{CHANGES}"), TimeDelta::seconds(30));
    assert_eq!(ingestor.errors(), 0);

    let r0 = snapshot.get("r0").unwrap();
    let vol = &r0.volumes["0"];
    assert_eq!(vol.read_kib.per_second, 100.0);
    assert_eq!(vol.read_kib.total, 200.0);
    assert_eq!(vol.written_kib.per_second, 500.0);
    assert_eq!(vol.written_kib.history, vec![0.0, 1000.0]);

    let pv = &r0.peer_devices["peer"]["0"];
    assert_eq!(pv.sent_kib.per_second, 500.0);
    assert_eq!(pv.out_of_sync_kib.current, 512);
    assert_eq!(pv.out_of_sync_kib.max, 512);
    assert_eq!(pv.out_of_sync_kib.min, 0);
    assert_eq!(pv.out_of_sync_kib.avg, 256.0);

    assert_eq!(snapshot.write_per_second(), 500.0);
    assert_eq!(r0.out_of_sync_kib(), 512);
    assert_eq!(r0.uptime.as_secs(), 0);
    assert_eq!(resource_health(r0), HealthStatus::Warning);
}

#[test]
fn quiet_connections_become_stale() {
    let (snapshot, _) = replay(&format!("{INITIAL_DUMP}{CHANGES}"), TimeDelta::seconds(1));

    let r0 = snapshot.get("r0").unwrap();
    assert!(r0.connections["peer"].stale);

    let issues = resource_issues(r0);
    assert!(issues.iter().any(|(_, msg)| msg.contains("no updates")));
}

#[test]
fn destroy_removes_resource_tree() {
    let log = format!(
        "{INITIAL_DUMP}{CHANGES}\
2017-02-15T12:58:00.000000-08:00 destroy connection name:r0 conn-name:peer
2017-02-15T12:58:01.000000-08:00 destroy resource name:r0
"
    );
    let (snapshot, ingestor) = replay(&log, TimeDelta::seconds(30));

    assert!(snapshot.is_empty());
    assert_eq!(ingestor.errors(), 0);
}

#[test]
fn bad_lines_are_skipped_and_good_ones_applied() {
    let log = "\
garbage without structure
2017-02-15T12:57:53.000000-08:00 exists path name:r0 conn-name:peer local:ipv4:10.0.0.1:7789
2017-02-15T12:57:53.000000-08:00 exists device name:r0 volume:0 read:lots disk:Inconsistent
2017-02-15T12:57:53.000000-08:00 exists resource name:r1 role:Secondary
";
    let file = log_file(log);
    let mut source = FileSource::new(file.path());
    let registry = Registry::default().shared();
    let mut ingestor = Ingestor::default();
    ingestor.drain_all(&mut source, &registry);

    assert!(source.error().unwrap().contains("Parse error"));
    assert_eq!(ingestor.applied(), 3);
    assert_eq!(ingestor.errors(), 2);

    let snapshot = registry.read().snapshot(TimeDelta::seconds(30));
    assert_eq!(snapshot.get("r0").unwrap().volumes["0"].disk, "Inconsistent");
    assert_eq!(resource_health(snapshot.get("r0").unwrap()), HealthStatus::Critical);
    assert_eq!(snapshot.get("r1").unwrap().role, "Secondary");
}

#[test]
fn replay_keeps_unterminated_last_event() {
    let log = "\
2017-02-15T12:57:53.000000-08:00 exists resource name:r0 role:Secondary
2017-02-15T12:57:54.000000-08:00 change resource name:r0 role:Primary";
    let file = log_file(log);
    let mut source = FileSource::replay(file.path());
    let registry = Registry::default().shared();
    let mut ingestor = Ingestor::default();

    assert_eq!(ingestor.drain_all(&mut source, &registry), 2);
    let snapshot = registry.read().snapshot(TimeDelta::seconds(30));
    assert_eq!(snapshot.get("r0").unwrap().role, "Primary");
}

#[test]
fn counter_restart_keeps_totals_monotonic() {
    let log = "\
2017-02-15T12:57:53.000000-08:00 exists device name:r0 volume:0 written:100
2017-02-15T12:57:54.000000-08:00 change device name:r0 volume:0 written:200
2017-02-15T12:57:55.000000-08:00 change device name:r0 volume:0 written:50
";
    let (snapshot, _) = replay(log, TimeDelta::seconds(30));

    let written = &snapshot.get("r0").unwrap().volumes["0"].written_kib;
    assert_eq!(written.total, 150.0);
    assert_eq!(written.history, vec![0.0, 100.0, 50.0]);
}

#[test]
fn snapshot_serializes_to_json() {
    let (snapshot, _) = replay(INITIAL_DUMP, TimeDelta::seconds(30));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["resources"]["r0"]["role"], "Primary");
    assert_eq!(json["resources"]["r0"]["volumes"]["0"]["disk"], "UpToDate");
    assert_eq!(json["timestamp_ms"], 1_487_192_273_000u64);
}
