//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::path::{InstanceId, NodeType};

// Configuration data attached to a single node.
pub type DataObject = serde_json::Value;

// Changes indexed by their wildcarded node type, in submission order.
pub type Updates = BTreeMap<NodeType, Vec<Change>>;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Single changed configuration node.
///
/// At least one of `before` and `after` is always present: a missing `before`
/// means the node is being created, a missing `after` means it is being
/// deleted.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Change {
    id: InstanceId,
    before: Option<DataObject>,
    after: Option<DataObject>,
}

/// Batch of changes submitted to a single apply call, split into deletions
/// and everything else.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    deletes: Updates,
    updates: Updates,
}

// ===== impl Operation =====

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

// ===== impl Change =====

impl Change {
    pub fn new(
        id: InstanceId,
        before: Option<DataObject>,
        after: Option<DataObject>,
    ) -> Result<Change, Error> {
        if before.is_none() && after.is_none() {
            return Err(Error::InvalidChange(id));
        }

        Ok(Change { id, before, after })
    }

    pub fn create(id: InstanceId, after: DataObject) -> Change {
        Change {
            id,
            before: None,
            after: Some(after),
        }
    }

    pub fn update(
        id: InstanceId,
        before: DataObject,
        after: DataObject,
    ) -> Change {
        Change {
            id,
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn delete(id: InstanceId, before: DataObject) -> Change {
        Change {
            id,
            before: Some(before),
            after: None,
        }
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn before(&self) -> Option<&DataObject> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&DataObject> {
        self.after.as_ref()
    }

    pub fn node_type(&self) -> NodeType {
        self.id.node_type()
    }

    pub fn operation(&self) -> Operation {
        match (&self.before, &self.after) {
            (None, _) => Operation::Create,
            (Some(_), None) => Operation::Delete,
            (Some(_), Some(_)) => Operation::Update,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.after.is_none()
    }

    // Returns the change that undoes this one.
    #[must_use]
    pub fn reverse(&self) -> Change {
        Change {
            id: self.id.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    fn is_valid(&self) -> bool {
        self.before.is_some() || self.after.is_some()
    }
}

// ===== impl ChangeSet =====

impl ChangeSet {
    pub fn new<I>(changes: I) -> Result<ChangeSet, Error>
    where
        I: IntoIterator<Item = Change>,
    {
        let mut set = ChangeSet::default();
        for change in changes {
            // Deserialized changes bypass the constructor checks.
            if !change.is_valid() {
                return Err(Error::InvalidChange(change.id));
            }

            let updates = if change.is_delete() {
                &mut set.deletes
            } else {
                &mut set.updates
            };
            updates.entry(change.node_type()).or_default().push(change);
        }

        Ok(set)
    }

    pub fn deletes(&self) -> &Updates {
        &self.deletes
    }

    pub fn updates(&self) -> &Updates {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    // Returns all node types touched by this batch.
    pub fn node_types(&self) -> BTreeSet<&NodeType> {
        self.deletes.keys().chain(self.updates.keys()).collect()
    }

    // Returns true if deletions and updates all target one node type.
    pub fn is_single_type(&self) -> bool {
        self.node_types().len() == 1
    }

    // Iterates over all changes, deletions first.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.deletes
            .values()
            .chain(self.updates.values())
            .flat_map(|changes| changes.iter())
    }
}

// ===== unit tests =====
