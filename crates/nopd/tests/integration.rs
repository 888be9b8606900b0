//! Integration tests for nopd
//!
//! These tests verify the end-to-end behavior of the daemon components:
//! config file, on-disk store and reconciler working together.

use chrono::{DateTime, TimeZone, Utc};
use nop_api::{ConditionReason, ConditionStatus, ConditionType, ResourceLifecycle};
use nop_config::{load_config, Policy};
use nop_core::{CoreEvent, NopConnector, Reconciler};
use nop_store::{AuditEventType, SqliteStore, Store};
use nop_util::ResourceName;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = r#"
config_version = 1

[daemon]
poll_interval = "500ms"

[[resources]]
name = "example"
condition_after = [
    { time = "10s", condition_type = "Ready", condition_status = "False" },
    { time = "5s", condition_type = "Ready", condition_status = "False" },
    { time = "7s", condition_type = "Ready", condition_status = "True" },
    { time = "5s", condition_type = "Synced", condition_status = "False" },
    { time = "10s", condition_type = "Synced", condition_status = "True" },
    { time = "2s", condition_type = "Ready", condition_status = "False" },
]

[[resources]]
name = "eager"
external_name = "eager-bucket"
condition_after = [
    { time = "eventually", condition_type = "Ready", condition_status = "True" },
]
"#;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn at(millis: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::milliseconds(millis)
}

fn write_config(dir: &Path, content: &str) -> Policy {
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();
    load_config(&path).unwrap()
}

fn open_store(dir: &Path) -> Arc<dyn Store> {
    Arc::new(SqliteStore::open(dir.join("nopd.db")).unwrap())
}

fn summary(reconciler: &Reconciler, name: &str) -> Vec<(ConditionType, ConditionStatus)> {
    reconciler
        .get(&ResourceName::new(name))
        .unwrap()
        .status
        .conditions
        .summary()
}

#[test]
fn test_config_drives_conditions_over_time() {
    let dir = tempfile::tempdir().unwrap();
    let policy = write_config(dir.path(), CONFIG);
    assert_eq!(policy.daemon.poll_interval, Duration::from_millis(500));

    let mut reconciler = Reconciler::new(Arc::new(NopConnector), open_store(dir.path()));
    reconciler.reload(&policy, t0());
    assert_eq!(reconciler.len(), 2);

    reconciler.tick(at(1999));
    assert!(summary(&reconciler, "example").is_empty());

    reconciler.tick(at(2000));
    assert_eq!(
        summary(&reconciler, "example"),
        vec![(ConditionType::ready(), ConditionStatus::False)]
    );

    reconciler.tick(at(8000));
    assert_eq!(
        summary(&reconciler, "example"),
        vec![
            (ConditionType::ready(), ConditionStatus::True),
            (ConditionType::synced(), ConditionStatus::False),
        ]
    );
    let views = reconciler.snapshot(at(8000));
    let example = views.iter().find(|v| v.name.as_str() == "example").unwrap();
    assert_eq!(example.next_transition, Some(Duration::from_secs(2)));

    reconciler.tick(at(50_000));
    assert_eq!(
        summary(&reconciler, "example"),
        vec![
            (ConditionType::ready(), ConditionStatus::False),
            (ConditionType::synced(), ConditionStatus::True),
        ]
    );
}

#[test]
fn test_malformed_threshold_applies_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let policy = write_config(dir.path(), CONFIG);

    let mut reconciler = Reconciler::new(Arc::new(NopConnector), open_store(dir.path()));
    reconciler.reload(&policy, t0());
    reconciler.tick(t0());

    assert_eq!(
        summary(&reconciler, "eager"),
        vec![(ConditionType::ready(), ConditionStatus::True)]
    );

    let eager = reconciler.get(&ResourceName::new("eager")).unwrap();
    assert_eq!(eager.meta.external_name.as_deref(), Some("eager-bucket"));
}

#[test]
fn test_status_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let policy = write_config(dir.path(), CONFIG);

    {
        let mut reconciler = Reconciler::new(Arc::new(NopConnector), open_store(dir.path()));
        reconciler.reload(&policy, t0());
        reconciler.tick(at(8000));
    }

    // Restarted much later; ages are measured from the original creation
    let mut reconciler = Reconciler::new(Arc::new(NopConnector), open_store(dir.path()));
    let events = reconciler.reload(&policy, at(40_000));
    assert!(events.iter().any(|e| matches!(
        e,
        CoreEvent::ResourceRegistered { restored: true, name, .. } if name.as_str() == "example"
    )));

    let views = reconciler.snapshot(at(40_000));
    let example = views.iter().find(|v| v.name.as_str() == "example").unwrap();
    assert_eq!(example.age, Duration::from_secs(40));
    assert_eq!(example.status.conditions.len(), 2);

    reconciler.tick(at(40_000));
    assert_eq!(
        summary(&reconciler, "example"),
        vec![
            (ConditionType::ready(), ConditionStatus::False),
            (ConditionType::synced(), ConditionStatus::True),
        ]
    );
}

#[test]
fn test_removed_resource_goes_through_deletion() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let policy = write_config(dir.path(), CONFIG);

    let mut reconciler = Reconciler::new(Arc::new(NopConnector), store.clone());
    reconciler.reload(&policy, t0());
    reconciler.tick(at(3000));

    let trimmed = write_config(
        dir.path(),
        r#"
        config_version = 1

        [[resources]]
        name = "example"
        condition_after = [
            { time = "2s", condition_type = "Ready", condition_status = "False" },
        ]
        "#,
    );
    let events = reconciler.reload(&trimmed, at(4000));
    assert!(events.contains(&CoreEvent::DeletionRequested {
        name: ResourceName::new("eager")
    }));

    let eager = reconciler.snapshot(at(4000)).into_iter().find(|v| v.name.as_str() == "eager");
    let eager = eager.unwrap();
    assert_eq!(eager.lifecycle, ResourceLifecycle::Deleting);
    let ready = eager.status.conditions.get(&ConditionType::ready()).unwrap();
    assert_eq!(ready.reason, ConditionReason::Deleting);
    assert_eq!(ready.status, ConditionStatus::False);

    let events = reconciler.tick(at(5000));
    assert!(events.contains(&CoreEvent::ResourceDeleted {
        name: ResourceName::new("eager")
    }));
    assert!(reconciler.get(&ResourceName::new("eager")).is_none());
    assert!(store.load_resource(&ResourceName::new("eager")).unwrap().is_none());
    assert!(store.load_resource(&ResourceName::new("example")).unwrap().is_some());
}

#[test]
fn test_audit_trail_records_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let policy = write_config(dir.path(), CONFIG);

    let mut reconciler = Reconciler::new(Arc::new(NopConnector), store.clone());
    reconciler.reload(&policy, t0());
    reconciler.tick(at(2000));
    reconciler
        .request_deletion(&ResourceName::new("example"), at(2500))
        .unwrap();
    reconciler.tick(at(3000));

    let mut audits = store.get_recent_audits(50).unwrap();
    audits.reverse();
    let kinds: Vec<&str> = audits
        .iter()
        .map(|a| match &a.event {
            AuditEventType::ResourceRegistered { .. } => "registered",
            AuditEventType::ConfigLoaded { .. } => "config",
            AuditEventType::ConditionsChanged { .. } => "changed",
            AuditEventType::DeletionRequested { .. } => "deletion",
            AuditEventType::ResourceDeleted { .. } => "deleted",
            _ => "other",
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "registered",
            "registered",
            "config",
            "changed",
            "changed",
            "deletion",
            "deleted",
        ]
    );
}
