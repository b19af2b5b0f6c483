//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use cfgtx_registry::{Change, Error, Operation, WriteContext};
use maplit::btreeset;
use serde_json::json;

use super::*;

#[test]
fn test_create_forward_order() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::create(acl_id("eth0", 1), json!({"name": "acl1"})),
                Change::create(interface_id("eth0"), json!({"mtu": 1500})),
                Change::create(sub_interface_id("eth0", 1), json!({"vlan": 1})),
            ],
            &ctx,
        )
        .unwrap();

    assert_eq!(
        backend.invoked_types(),
        node_types(&[INTERFACE, SUB_INTERFACE, ACL])
    );
    assert!(
        backend
            .invocations()
            .iter()
            .all(|invocation| invocation.operation == Operation::Create)
    );
}

#[test]
fn test_delete_reverse_order() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::delete(sub_interface_id("eth0", 1), json!({"vlan": 1})),
                Change::delete(interface_id("eth0"), json!({"mtu": 1500})),
                Change::delete(acl_id("eth0", 1), json!({"name": "acl1"})),
            ],
            &ctx,
        )
        .unwrap();

    assert_eq!(
        backend.invoked_types(),
        node_types(&[ACL, SUB_INTERFACE, INTERFACE])
    );
}

#[test]
fn test_deletions_before_updates() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::create(interface_id("eth1"), json!({"mtu": 9000})),
                Change::update(
                    acl_id("eth0", 1),
                    json!({"name": "acl1"}),
                    json!({"name": "acl2"}),
                ),
                Change::delete(sub_interface_id("eth0", 2), json!({"vlan": 2})),
            ],
            &ctx,
        )
        .unwrap();

    assert_eq!(
        backend.invoked_ids(),
        vec![
            sub_interface_id("eth0", 2),
            interface_id("eth1"),
            acl_id("eth0", 1)
        ]
    );
}

#[test]
fn test_same_type_keeps_input_order() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::create(interface_id("eth2"), json!({})),
                Change::create(interface_id("eth0"), json!({})),
                Change::create(interface_id("eth1"), json!({})),
            ],
            &ctx,
        )
        .unwrap();

    assert_eq!(
        backend.invoked_ids(),
        vec![interface_id("eth2"), interface_id("eth0"), interface_id("eth1")]
    );
}

#[test]
fn test_missing_handlers() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    let result = registry.apply(
        [
            Change::create(interface_id("eth0"), json!({})),
            Change::create(
                iid("/routing/static-route[prefix='10.0.0.0/8']"),
                json!({}),
            ),
            Change::delete(iid("/system/hostname"), json!("rt1")),
        ],
        &ctx,
    );

    let Err(Error::MissingHandlers(missing)) = result else {
        panic!("unexpected result: {result:?}");
    };
    assert_eq!(
        missing,
        btreeset![
            NodeType::new("/routing/static-route"),
            NodeType::new("/system/hostname"),
        ]
    );
    assert!(backend.invocations().is_empty());
}

#[test]
fn test_empty_batch() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry.apply(Vec::<Change>::new(), &ctx).unwrap();
    assert!(backend.invocations().is_empty());
}

#[test]
fn test_round_trip() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());
    let snapshot = empty_snapshot();
    let ctx = WriteContext::new(&snapshot);

    registry
        .apply(
            [
                Change::create(interface_id("eth0"), json!({"mtu": 1500})),
                Change::create(sub_interface_id("eth0", 1), json!({"vlan": 1})),
            ],
            &ctx,
        )
        .unwrap();
    let state = backend.state();

    let change = Change::update(
        interface_id("eth0"),
        json!({"mtu": 1500}),
        json!({"mtu": 9000}),
    );
    registry.apply([change.clone()], &ctx).unwrap();
    assert_ne!(backend.state(), state);

    registry.apply([change.reverse()], &ctx).unwrap();
    assert_eq!(backend.state(), state);
}

#[test]
fn test_single_type_batch() {
    for single_type_shortcut in [true, false] {
        let backend = FakeBackend::new();
        let config = Config {
            single_type_shortcut,
            ..Default::default()
        };
        let (registry, _) = interface_registry(&backend, config);
        let snapshot = empty_snapshot();
        let ctx = WriteContext::new(&snapshot);

        registry
            .apply(
                [
                    Change::create(sub_interface_id("eth0", 1), json!({})),
                    Change::delete(sub_interface_id("eth0", 2), json!({})),
                ],
                &ctx,
            )
            .unwrap();

        assert_eq!(
            backend.invoked_ids(),
            vec![sub_interface_id("eth0", 2), sub_interface_id("eth0", 1)]
        );
    }
}

#[test]
fn test_shared_registry() {
    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, Config::default());

    std::thread::scope(|s| {
        for thread in 0..4 {
            let registry = registry.clone();
            s.spawn(move || {
                let snapshot = empty_snapshot();
                let ctx = WriteContext::new(&snapshot);
                let name = format!("eth{thread}");
                registry
                    .apply(
                        [
                            Change::create(
                                sub_interface_id(&name, 1),
                                json!({}),
                            ),
                            Change::create(interface_id(&name), json!({})),
                        ],
                        &ctx,
                    )
                    .unwrap();
            });
        }
    });

    let state = backend.state();
    assert_eq!(state.len(), 8);
    for thread in 0..4 {
        let name = format!("eth{thread}");
        assert!(state.contains_key(&interface_id(&name)));
        assert!(state.contains_key(&sub_interface_id(&name, 1)));
    }
}
