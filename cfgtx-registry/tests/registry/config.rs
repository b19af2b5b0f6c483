//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::Write;

use cfgtx_registry::test::stub::FakeBackend;
use cfgtx_registry::Error;

use super::*;

#[test]
fn test_load_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        single_type_shortcut = false

        [recorder]
        enabled = false
        dir = "/tmp/cfgtx-test"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert!(!config.single_type_shortcut);
    assert_eq!(config.recorder.dir, "/tmp/cfgtx-test");

    let backend = FakeBackend::new();
    let (registry, _) = interface_registry(&backend, config);
    assert!(!registry.config().single_type_shortcut);
}

#[test]
fn test_load_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "single_type_shortcut = \"yes\"").unwrap();

    let result = Config::load(file.path());
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.single_type_shortcut);
    assert!(!config.recorder.enabled);
}
