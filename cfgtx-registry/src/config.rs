//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::recorder;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Bypass ordered iteration when a batch touches a single node type.
    pub single_type_shortcut: bool,
    pub recorder: recorder::Config,
}

// ===== impl Config =====

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
        let config_str =
            std::fs::read_to_string(path).map_err(Error::ConfigIo)?;
        Config::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Config, Error> {
        toml::from_str(config_str).map_err(Error::ConfigParse)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            single_type_shortcut: true,
            recorder: Default::default(),
        }
    }
}

// ===== unit tests =====
