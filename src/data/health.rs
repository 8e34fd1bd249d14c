//! Health classification of snapshot entities for display.
//!
//! Rules work on the verbatim state strings the storage subsystem reports.
//! An entity's health is the worst of its own checks; a resource's health is
//! the worst over everything that hangs off it.

use blockwatch_types::{
    ConnectionSnapshot, DeviceVolumeSnapshot, PeerVolumeSnapshot, ResourceSnapshot,
};

/// Health status for a resource or one of its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

/// Disk states that mean local data cannot be trusted.
const BAD_DISK_STATES: &[&str] = &["Failed", "Inconsistent", "Outdated"];

fn is_yes(flag: &str) -> bool {
    flag == "yes"
}

/// `blocked` names the blocked side(s): `upper`, `lower` or `upper,lower`.
fn is_blocked(flag: &str) -> bool {
    !flag.is_empty() && flag != "no"
}

pub fn connection_health(conn: &ConnectionSnapshot) -> HealthStatus {
    if !conn.connection.is_empty() && conn.connection != "Connected" {
        HealthStatus::Critical
    } else if is_yes(&conn.congested) || conn.stale {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

pub fn volume_health(vol: &DeviceVolumeSnapshot) -> HealthStatus {
    if BAD_DISK_STATES.contains(&vol.disk.as_str())
        || is_blocked(&vol.blocked)
        || is_yes(&vol.al_suspended)
    {
        HealthStatus::Critical
    } else {
        HealthStatus::Healthy
    }
}

pub fn peer_volume_health(pv: &PeerVolumeSnapshot) -> HealthStatus {
    let replicating = pv.replication.is_empty() || pv.replication == "Established";
    if pv.out_of_sync_kib.current > 0 || !replicating {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

/// Worst status over the resource and everything under it.
pub fn resource_health(res: &ResourceSnapshot) -> HealthStatus {
    let own = if is_yes(&res.suspended) {
        HealthStatus::Critical
    } else {
        HealthStatus::Healthy
    };

    res.connections
        .values()
        .map(connection_health)
        .chain(res.volumes.values().map(volume_health))
        .chain(res.peer_volumes().map(|(_, _, pv)| peer_volume_health(pv)))
        .fold(own, HealthStatus::max)
}

/// Human-readable problems found on a resource, worst first.
pub fn resource_issues(res: &ResourceSnapshot) -> Vec<(HealthStatus, String)> {
    let mut issues = Vec::new();

    if is_yes(&res.suspended) {
        issues.push((HealthStatus::Critical, "I/O suspended".to_string()));
    }

    for (name, conn) in &res.connections {
        if connection_health(conn) == HealthStatus::Critical {
            issues.push((
                HealthStatus::Critical,
                format!("connection {name}: {}", conn.connection),
            ));
        }
        if is_yes(&conn.congested) {
            issues.push((HealthStatus::Warning, format!("connection {name}: congested")));
        }
        if conn.stale {
            issues.push((HealthStatus::Warning, format!("connection {name}: no updates")));
        }
    }

    for (id, vol) in &res.volumes {
        if volume_health(vol) != HealthStatus::Healthy {
            issues.push((
                HealthStatus::Critical,
                format!(
                    "volume {id}: disk {} blocked {} al-suspended {}",
                    vol.disk, vol.blocked, vol.al_suspended
                ),
            ));
        }
    }

    for (conn, id, pv) in res.peer_volumes() {
        if peer_volume_health(pv) != HealthStatus::Healthy {
            issues.push((
                HealthStatus::Warning,
                format!(
                    "peer {conn}/{id}: {} out-of-sync {} KiB",
                    pv.replication, pv.out_of_sync_kib.current
                ),
            ));
        }
    }

    issues.sort_by(|a, b| b.0.cmp(&a.0));
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwatch_types::StatsSnapshot;

    fn healthy() -> ResourceSnapshot {
        let mut r = ResourceSnapshot::new("r0");
        r.suspended = "no".into();
        r.connections.insert(
            "peer".into(),
            ConnectionSnapshot {
                name: "peer".into(),
                connection: "Connected".into(),
                congested: "no".into(),
                ..Default::default()
            },
        );
        r.volumes.insert(
            "0".into(),
            DeviceVolumeSnapshot {
                disk: "UpToDate".into(),
                blocked: "no".into(),
                al_suspended: "no".into(),
                ..Default::default()
            },
        );
        r.peer_devices.entry("peer".into()).or_default().insert(
            "0".into(),
            PeerVolumeSnapshot {
                replication: "Established".into(),
                peer_disk: "UpToDate".into(),
                ..Default::default()
            },
        );
        r
    }

    #[test]
    fn fully_healthy_resource() {
        let r = healthy();
        assert_eq!(resource_health(&r), HealthStatus::Healthy);
        assert!(resource_issues(&r).is_empty());
    }

    #[test]
    fn empty_resource_is_healthy() {
        assert_eq!(resource_health(&ResourceSnapshot::new("r0")), HealthStatus::Healthy);
    }

    #[test]
    fn suspended_is_critical() {
        let mut r = healthy();
        r.suspended = "yes".into();
        assert_eq!(resource_health(&r), HealthStatus::Critical);
    }

    #[test]
    fn disconnected_is_critical() {
        let mut r = healthy();
        r.connections.get_mut("peer").unwrap().connection = "StandAlone".into();
        assert_eq!(resource_health(&r), HealthStatus::Critical);

        let issues = resource_issues(&r);
        assert_eq!(issues[0].0, HealthStatus::Critical);
        assert!(issues[0].1.contains("StandAlone"));
    }

    #[test]
    fn bad_disk_states_are_critical() {
        for disk in ["Failed", "Inconsistent", "Outdated"] {
            let mut r = healthy();
            r.volumes.get_mut("0").unwrap().disk = disk.into();
            assert_eq!(resource_health(&r), HealthStatus::Critical, "{disk}");
        }
    }

    #[test]
    fn congested_and_stale_warn() {
        let mut r = healthy();
        r.connections.get_mut("peer").unwrap().congested = "yes".into();
        assert_eq!(resource_health(&r), HealthStatus::Warning);

        let mut r = healthy();
        r.connections.get_mut("peer").unwrap().stale = true;
        assert_eq!(resource_health(&r), HealthStatus::Warning);
        assert!(resource_issues(&r)[0].1.contains("no updates"));
    }

    #[test]
    fn out_of_sync_warns() {
        let mut r = healthy();
        let pv = r.peer_devices.get_mut("peer").unwrap().get_mut("0").unwrap();
        pv.out_of_sync_kib = StatsSnapshot {
            current: 4096,
            ..Default::default()
        };
        assert_eq!(resource_health(&r), HealthStatus::Warning);
    }

    #[test]
    fn resync_warns() {
        let mut r = healthy();
        let pv = r.peer_devices.get_mut("peer").unwrap().get_mut("0").unwrap();
        pv.replication = "SyncSource".into();
        assert_eq!(peer_volume_health(pv), HealthStatus::Warning);
        assert_eq!(resource_health(&r), HealthStatus::Warning);
    }

    #[test]
    fn blocked_side_is_critical() {
        let mut r = healthy();
        for side in ["upper", "lower", "upper,lower"] {
            let vol = r.volumes.get_mut("0").unwrap();
            vol.blocked = side.into();
            assert_eq!(volume_health(vol), HealthStatus::Critical, "blocked:{side}");
            assert_eq!(resource_health(&r), HealthStatus::Critical);
        }

        let vol = r.volumes.get_mut("0").unwrap();
        vol.blocked = "no".into();
        assert_eq!(volume_health(vol), HealthStatus::Healthy);
        vol.blocked = String::new();
        assert_eq!(volume_health(vol), HealthStatus::Healthy);
    }

    #[test]
    fn critical_outranks_warning() {
        let mut r = healthy();
        r.connections.get_mut("peer").unwrap().congested = "yes".into();
        r.volumes.get_mut("0").unwrap().blocked = "lower".into();
        assert_eq!(resource_health(&r), HealthStatus::Critical);

        let issues = resource_issues(&r);
        assert_eq!(issues.first().unwrap().0, HealthStatus::Critical);
        assert_eq!(issues.last().unwrap().0, HealthStatus::Warning);
    }
}
