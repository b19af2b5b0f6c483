//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use cfgtx_registry::test::stub::FakeBackend;
use cfgtx_registry::{Error, Registration};

use super::*;

//
// Helper functions.
//

fn build_error(builder: RegistryBuilder) -> Error {
    match builder.build() {
        Err(error) => error,
        Ok(registry) => panic!("unexpected registry: {registry:?}"),
    }
}

#[test]
fn test_registration_order_ties() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder
        .add(backend.handler("/c"))
        .unwrap()
        .add(backend.handler("/a"))
        .unwrap()
        .add(backend.handler("/b"))
        .unwrap();
    let registry = builder.build().unwrap();

    assert_eq!(registry.order(), node_types(&["/c", "/a", "/b"]));
}

#[test]
fn test_before_and_after() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder
        .add_after(backend.handler("/c"), node_types(&["/b"]))
        .unwrap()
        .add_before(backend.handler("/a"), node_types(&["/b"]))
        .unwrap()
        .add(backend.handler("/b"))
        .unwrap()
        .add_before(backend.handler("/d"), node_types(&["/a"]))
        .unwrap();
    let registry = builder.build().unwrap();

    assert_eq!(registry.order(), node_types(&["/d", "/a", "/b", "/c"]));
}

#[test]
fn test_unhandled_types_chain_constraints() {
    setup();
    let backend = FakeBackend::new();

    // Nothing handles "/middle", yet "/first" must still precede "/last".
    let mut builder = RegistryBuilder::new();
    builder
        .add_after(backend.handler("/last"), node_types(&["/middle"]))
        .unwrap()
        .add_before(backend.handler("/first"), node_types(&["/middle"]))
        .unwrap();
    let registry = builder.build().unwrap();

    assert_eq!(registry.order(), node_types(&["/first", "/last"]));
    assert!(!registry.is_handled(&NodeType::new("/middle")));
}

#[test]
fn test_cycle() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder
        .add_after(backend.handler("/a"), node_types(&["/b"]))
        .unwrap()
        .add_after(backend.handler("/b"), node_types(&["/a"]))
        .unwrap()
        .add_after(backend.handler("/c"), node_types(&["/a"]))
        .unwrap();

    let Error::OrderingCycle(cycle) = build_error(builder) else {
        panic!("expected ordering cycle");
    };
    assert_eq!(cycle, node_types(&["/a", "/b"]));
}

#[test]
fn test_self_cycle() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder
        .add_before(backend.handler("/a"), node_types(&["/a"]))
        .unwrap();

    let Error::OrderingCycle(cycle) = build_error(builder) else {
        panic!("expected ordering cycle");
    };
    assert_eq!(cycle, node_types(&["/a"]));
}

#[test]
fn test_duplicate_handler() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder.add(backend.handler("/a")).unwrap();
    let result = builder.add(backend.handler("/a")).map(|_| ());

    assert!(matches!(
        result,
        Err(Error::DuplicateHandler(node_type)) if node_type == NodeType::new("/a")
    ));
}

#[test]
fn test_duplicate_child() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    builder
        .subtree_add(node_types(&["/a/b/c"]), backend.handler("/a"))
        .unwrap();

    // Claimed as a subtree child, then as a handler.
    let result = builder.add(backend.handler("/a/b/c")).map(|_| ());
    assert!(matches!(result, Err(Error::DuplicateHandler(_))));

    // Claimed as a subtree child twice.
    let result = builder
        .subtree_add(node_types(&["/a/b/c"]), backend.handler("/a/b"))
        .map(|_| ());
    assert!(matches!(result, Err(Error::DuplicateHandler(_))));

    // Claimed as a handler, then as a subtree child.
    builder.add(backend.handler("/x/y")).unwrap();
    let result = builder
        .subtree_add(node_types(&["/x/y"]), backend.handler("/x"))
        .map(|_| ());
    assert!(matches!(result, Err(Error::DuplicateHandler(_))));
}

#[test]
fn test_invalid_subtree_child() {
    setup();
    let backend = FakeBackend::new();

    let mut builder = RegistryBuilder::new();
    for child in ["/b/c", "/a", "/ab/c"] {
        let result = builder
            .register(
                Registration::new(backend.handler("/a"))
                    .subtree(node_types(&[child])),
            )
            .map(|_| ());
        assert!(
            matches!(result, Err(Error::InvalidSubtreeChild(_, _))),
            "{child}"
        );
    }

    // Rejected registrations leave no trace.
    builder.add(backend.handler("/a")).unwrap();
    let registry = builder.build().unwrap();
    assert_eq!(registry.order(), node_types(&["/a"]));
}
