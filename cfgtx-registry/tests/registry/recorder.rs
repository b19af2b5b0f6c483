//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use cfgtx_registry::recorder::{self, BatchRecorder, Outcome};
use cfgtx_registry::test::stub::{FailOn, FakeBackend};
use cfgtx_registry::{Change, WriteContext};
use maplit::btreeset;
use serde_json::json;

use super::*;

fn recorder_config(dir: &tempfile::TempDir) -> Config {
    Config {
        recorder: recorder::Config {
            enabled: true,
            dir: dir.path().display().to_string(),
        },
        ..Default::default()
    }
}

#[test]
fn test_record_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let config = recorder_config(&dir);
    let (registry, handlers) = interface_registry(&backend, config.clone());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    let applied = vec![
        Change::create(interface_id("eth0"), json!({"mtu": 1500})),
        Change::create(sub_interface_id("eth0", 1), json!({"vlan": 1})),
    ];
    registry.apply(applied.clone(), &ctx).unwrap();

    // Empty batches aren't recorded.
    registry.apply(Vec::<Change>::new(), &ctx).unwrap();

    registry
        .apply([Change::create(iid("/system/hostname"), json!("rt1"))], &ctx)
        .unwrap_err();

    handlers.acl.fail_on(FailOn::Always);
    registry
        .apply(
            [
                Change::create(acl_id("eth0", 1), json!({"name": "acl1"})),
                Change::create(interface_id("eth1"), json!({})),
            ],
            &ctx,
        )
        .unwrap_err();

    let batches =
        recorder::read_records(BatchRecorder::path(&config.recorder)).unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0].changes, applied);
    assert_eq!(batches[0].outcome, Outcome::Applied);
    assert!(matches!(batches[1].outcome, Outcome::Rejected { .. }));
    assert_eq!(
        batches[2].outcome,
        Outcome::Failed {
            unprocessed: btreeset![acl_id("eth0", 1)],
            reason: "failed to create \
                     /interfaces/interface[name='eth0']/sub-interfaces/\
                     sub-interface[id='1']/acl: injected failure"
                .to_owned(),
        }
    );
}

#[test]
fn test_replay_records() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let config = recorder_config(&dir);
    let (registry, _) = interface_registry(&backend, config.clone());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::create(sub_interface_id("eth0", 1), json!({"vlan": 1})),
                Change::create(interface_id("eth0"), json!({"mtu": 1500})),
            ],
            &ctx,
        )
        .unwrap();
    registry
        .apply(
            [Change::delete(sub_interface_id("eth0", 1), json!({"vlan": 1}))],
            &ctx,
        )
        .unwrap();

    // Replaying the recorded batches against a fresh backend yields the
    // same state.
    let replay_backend = FakeBackend::new();
    let (replay_registry, _) =
        interface_registry(&replay_backend, Config::default());
    let batches =
        recorder::read_records(BatchRecorder::path(&config.recorder)).unwrap();
    for batch in batches {
        replay_registry.apply(batch.changes, &ctx).unwrap();
    }
    assert_eq!(replay_backend.state(), backend.state());
    assert_eq!(replay_backend.invoked_ids(), backend.invoked_ids());
}

#[test]
fn test_recorder_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let config = Config {
        recorder: recorder::Config {
            enabled: false,
            dir: dir.path().display().to_string(),
        },
        ..Default::default()
    };
    let (registry, _) = interface_registry(&backend, config.clone());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply([Change::create(interface_id("eth0"), json!({}))], &ctx)
        .unwrap();
    assert!(!BatchRecorder::path(&config.recorder).exists());
}

#[test]
fn test_records_shared_across_registries() {
    let dir = tempfile::tempdir().unwrap();
    let config = recorder_config(&dir);
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, config.clone());
    registry
        .apply([Change::create(interface_id("eth0"), json!({}))], &ctx)
        .unwrap();

    // A registry recording to the same directory keeps earlier records.
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, config.clone());
    registry
        .apply([Change::create(interface_id("eth1"), json!({}))], &ctx)
        .unwrap();

    let batches =
        recorder::read_records(BatchRecorder::path(&config.recorder)).unwrap();
    let ids = batches
        .iter()
        .flat_map(|batch| batch.changes.iter().map(Change::id))
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![interface_id("eth0"), interface_id("eth1")]);
}
