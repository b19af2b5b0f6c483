//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Ordered, revertible application of configuration changes.
//!
//! A [`Registry`] owns a set of [`Handler`]s, each bound to one node type of
//! the configuration tree, arranged in a total order derived from the
//! "before"/"after" constraints given to the [`RegistryBuilder`]. Applying a
//! batch runs deletions in reverse order (children before parents) and
//! everything else in forward order (parents before children). When a handler
//! fails, the returned [`BulkUpdateError`] carries a [`Reverter`] able to undo
//! what was already applied.

mod debug;

pub mod builder;
pub mod change;
pub mod config;
pub mod error;
pub mod handler;
pub mod path;
pub mod recorder;
pub mod registry;
pub mod revert;
pub mod snapshot;

pub use crate::builder::{Registration, RegistryBuilder};
pub use crate::change::{Change, ChangeSet, DataObject, Operation};
pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::handler::{Handler, SnapshotProvider, WriteContext, WriteError};
pub use crate::path::{InstanceId, NodeType};
pub use crate::registry::{Direction, Registry};
pub use crate::revert::{BulkUpdateError, RevertFailedError, Reverter};
pub use crate::snapshot::MemorySnapshot;
