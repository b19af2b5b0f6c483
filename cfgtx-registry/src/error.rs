//
// Copyright (c) The Holo Core Contributors
//
// See LICENSE for license details.
//

use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::warn;

use crate::path::{InstanceId, NodeType};
use crate::revert::BulkUpdateError;

// Registry errors.
#[derive(Debug)]
pub enum Error {
    DuplicateHandler(NodeType),
    InvalidSubtreeChild(NodeType, NodeType),
    OrderingCycle(Vec<NodeType>),
    InvalidChange(InstanceId),
    MissingHandlers(BTreeSet<NodeType>),
    BulkUpdate(BulkUpdateError),
    ConfigIo(std::io::Error),
    ConfigParse(toml::de::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::DuplicateHandler(node_type) => {
                warn!(%node_type, "{}", self);
            }
            Error::InvalidSubtreeChild(node_type, child) => {
                warn!(%node_type, %child, "{}", self);
            }
            Error::OrderingCycle(node_types) => {
                warn!(node_types = %node_types.iter().join(", "), "{}", self);
            }
            Error::InvalidChange(id) => {
                warn!(%id, "{}", self);
            }
            Error::MissingHandlers(node_types) => {
                warn!(node_types = %node_types.iter().join(", "), "{}", self);
            }
            Error::BulkUpdate(error) => {
                error.log();
            }
            Error::ConfigIo(error) => {
                warn!(%error, "{}", self);
            }
            Error::ConfigParse(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DuplicateHandler(node_type) => {
                write!(f, "handler for type {node_type} already present")
            }
            Error::InvalidSubtreeChild(node_type, child) => {
                write!(
                    f,
                    "subtree handler for {node_type} can't handle {child}: not a descendant"
                )
            }
            Error::OrderingCycle(node_types) => {
                write!(
                    f,
                    "handler ordering constraints form a cycle: {}",
                    node_types.iter().join(", ")
                )
            }
            Error::InvalidChange(id) => {
                write!(f, "change for {id} has neither before nor after data")
            }
            Error::MissingHandlers(node_types) => {
                write!(
                    f,
                    "unable to process update, missing handlers for: {}",
                    node_types.iter().join(", ")
                )
            }
            Error::BulkUpdate(error) => error.fmt(f),
            Error::ConfigIo(..) => {
                write!(f, "failed to read configuration file")
            }
            Error::ConfigParse(..) => {
                write!(f, "failed to parse configuration file")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BulkUpdate(error) => Some(error),
            Error::ConfigIo(error) => Some(error),
            Error::ConfigParse(error) => Some(error),
            _ => None,
        }
    }
}

impl From<BulkUpdateError> for Error {
    fn from(error: BulkUpdateError) -> Error {
        Error::BulkUpdate(error)
    }
}
