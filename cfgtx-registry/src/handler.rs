//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;

use crate::change::{DataObject, Operation};
use crate::path::{InstanceId, NodeType};

/// Applies changes of a single node type to the backend.
///
/// Handlers are shared by every apply call running against the same registry,
/// so any state they keep must be synchronized internally. A handler that
/// allocates identifiers from a shared table must hold the table's lock for
/// the whole allocate-then-use sequence.
pub trait Handler: Send + Sync {
    // Node type managed by this handler.
    fn node_type(&self) -> &NodeType;

    // Applies a single change. Exactly one of `before` and `after` may be
    // absent.
    fn apply(
        &self,
        id: &InstanceId,
        before: Option<&DataObject>,
        after: Option<&DataObject>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), WriteError>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Read access to the configuration before and after the transaction.
///
/// Both views must stay consistent for the lifetime of a batch.
pub trait SnapshotProvider: Send + Sync {
    fn read_before(&self, id: &InstanceId) -> Option<DataObject>;

    fn read_after(&self, id: &InstanceId) -> Option<DataObject>;
}

// Context passed to every handler invocation.
#[derive(Clone, Copy, new)]
pub struct WriteContext<'a> {
    snapshot: &'a dyn SnapshotProvider,
}

// Handler errors.
#[derive(Debug)]
pub enum WriteError {
    CreateFailed(InstanceId, String),
    UpdateFailed(InstanceId, String),
    DeleteFailed(InstanceId, String),
    SubtreeRootMissing(InstanceId),
}

// ===== impl WriteContext =====

impl WriteContext<'_> {
    pub fn read_before(&self, id: &InstanceId) -> Option<DataObject> {
        self.snapshot.read_before(id)
    }

    pub fn read_after(&self, id: &InstanceId) -> Option<DataObject> {
        self.snapshot.read_after(id)
    }
}

impl std::fmt::Debug for WriteContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteContext").finish_non_exhaustive()
    }
}

// ===== impl WriteError =====

impl WriteError {
    pub fn new(
        operation: Operation,
        id: &InstanceId,
        reason: impl ToString,
    ) -> WriteError {
        let id = id.clone();
        let reason = reason.to_string();
        match operation {
            Operation::Create => WriteError::CreateFailed(id, reason),
            Operation::Update => WriteError::UpdateFailed(id, reason),
            Operation::Delete => WriteError::DeleteFailed(id, reason),
        }
    }

    pub fn id(&self) -> &InstanceId {
        match self {
            WriteError::CreateFailed(id, _)
            | WriteError::UpdateFailed(id, _)
            | WriteError::DeleteFailed(id, _)
            | WriteError::SubtreeRootMissing(id) => id,
        }
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::CreateFailed(id, reason) => {
                write!(f, "failed to create {id}: {reason}")
            }
            WriteError::UpdateFailed(id, reason) => {
                write!(f, "failed to update {id}: {reason}")
            }
            WriteError::DeleteFailed(id, reason) => {
                write!(f, "failed to delete {id}: {reason}")
            }
            WriteError::SubtreeRootMissing(id) => {
                write!(f, "subtree root {id} missing from both snapshots")
            }
        }
    }
}

impl std::error::Error for WriteError {}
