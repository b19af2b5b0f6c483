//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use crate::change::DataObject;
use crate::handler::SnapshotProvider;
use crate::path::InstanceId;

// Snapshot pair backed by two maps of node data.
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshot {
    before: BTreeMap<InstanceId, DataObject>,
    after: BTreeMap<InstanceId, DataObject>,
}

// ===== impl MemorySnapshot =====

impl MemorySnapshot {
    pub fn new(
        before: BTreeMap<InstanceId, DataObject>,
        after: BTreeMap<InstanceId, DataObject>,
    ) -> MemorySnapshot {
        MemorySnapshot { before, after }
    }

    #[must_use]
    pub fn with_before(mut self, id: InstanceId, data: DataObject) -> Self {
        self.before.insert(id, data);
        self
    }

    #[must_use]
    pub fn with_after(mut self, id: InstanceId, data: DataObject) -> Self {
        self.after.insert(id, data);
        self
    }
}

impl SnapshotProvider for MemorySnapshot {
    fn read_before(&self, id: &InstanceId) -> Option<DataObject> {
        self.before.get(id).cloned()
    }

    fn read_after(&self, id: &InstanceId) -> Option<DataObject> {
        self.after.get(id).cloned()
    }
}
