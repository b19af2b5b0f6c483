//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, error, warn};

use crate::change::{Change, ChangeSet, Updates};
use crate::config::Config;
use crate::debug::Debug;
use crate::error::Error;
use crate::handler::{Handler, WriteContext, WriteError};
use crate::path::{InstanceId, NodeType};
use crate::recorder::{BatchRecorder, Outcome, RecordedBatch};
use crate::revert::{BulkUpdateError, RevertStage, Reverter};

/// Order in which handlers are visited during a pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    // Registry order: parents before children.
    Forward,
    // Reverse registry order: children before parents.
    Reverse,
}

/// Immutable, ordered collection of handlers.
///
/// Cloning is cheap: all clones share the same handlers.
#[derive(Clone)]
pub struct Registry(Arc<RegistryInner>);

struct RegistryInner {
    handlers: HashMap<NodeType, HandlerEntry>,
    order: Vec<NodeType>,
    order_reversed: Vec<NodeType>,
    // Every handled node type (own or subtree child) mapped to the node type
    // of its handler.
    handled_types: HashMap<NodeType, NodeType>,
    config: Config,
    recorder: Option<Mutex<BatchRecorder>>,
}

pub(crate) struct HandlerEntry {
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) children: BTreeSet<NodeType>,
}

// Handler selection for a pass.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Plan<'a> {
    Ordered,
    Single(&'a NodeType),
}

// Change handed to a handler, along with every batch identifier it accounts
// for.
#[derive(Debug)]
struct Invocation {
    change: Change,
    covers: Vec<InstanceId>,
}

// What a pass managed to apply before stopping.
#[derive(Clone, Debug, Default)]
pub(crate) struct Progress {
    // Changes applied, in invocation order.
    pub(crate) applied: Vec<Change>,
    pub(crate) processed: HashSet<InstanceId>,
}

// ===== impl Direction =====

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

// ===== impl Registry =====

impl Registry {
    pub(crate) fn new(
        handlers: HashMap<NodeType, HandlerEntry>,
        order: Vec<NodeType>,
        config: Config,
    ) -> Registry {
        let order_reversed = order.iter().rev().cloned().collect();
        let handled_types = handlers
            .iter()
            .flat_map(|(node_type, entry)| {
                std::iter::once(node_type)
                    .chain(entry.children.iter())
                    .map(move |handled| (handled.clone(), node_type.clone()))
            })
            .collect();
        let recorder = config
            .recorder
            .enabled
            .then(|| BatchRecorder::new(&config.recorder))
            .flatten()
            .map(Mutex::new);

        Registry(Arc::new(RegistryInner {
            handlers,
            order,
            order_reversed,
            handled_types,
            config,
            recorder,
        }))
    }

    /// Handler node types in registry order.
    pub fn order(&self) -> &[NodeType] {
        &self.0.order
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Returns whether changes of the given node type can be processed.
    pub fn is_handled(&self, node_type: &NodeType) -> bool {
        self.0.handled_types.contains_key(node_type)
    }

    /// Subtree children claimed by the handler registered for `node_type`.
    pub fn handled_child_types(
        &self,
        node_type: &NodeType,
    ) -> Option<&BTreeSet<NodeType>> {
        self.0.handlers.get(node_type).map(|entry| &entry.children)
    }

    /// Applies a batch of changes.
    ///
    /// Deletions are processed first, visiting handlers in reverse registry
    /// order. All remaining changes follow in registry order. Nothing is
    /// applied when some node type in the batch has no handler.
    pub fn apply<I>(
        &self,
        changes: I,
        ctx: &WriteContext<'_>,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = Change>,
    {
        let changes = ChangeSet::new(changes)?;
        if changes.is_empty() {
            return Ok(());
        }
        Debug::BatchRx(&changes).log();

        let result = self.update(&changes, ctx);

        if let Some(recorder) = &self.0.recorder
            && let Ok(mut recorder) = recorder.lock()
        {
            let batch = RecordedBatch::new(
                Utc::now(),
                changes.iter().cloned().collect(),
                Outcome::from_result(&result),
            );
            recorder.record(&batch);
        }

        if result.is_ok() {
            debug!(count = changes.len(), "batch applied");
        }

        result
    }

    fn update(
        &self,
        changes: &ChangeSet,
        ctx: &WriteContext<'_>,
    ) -> Result<(), Error> {
        self.check_all_types_handled(changes)?;

        // A batch touching a single node type only needs its own handler.
        let mut plan = Plan::Ordered;
        if self.0.config.single_type_shortcut
            && let Ok(node_type) =
                changes.node_types().into_iter().exactly_one()
            && let Some(handler_type) = self.0.handled_types.get(node_type)
        {
            plan = Plan::Single(handler_type);
        }

        self.bulk_update(changes, plan, ctx)?;
        Ok(())
    }

    fn check_all_types_handled(
        &self,
        changes: &ChangeSet,
    ) -> Result<(), Error> {
        let missing: BTreeSet<NodeType> = changes
            .node_types()
            .into_iter()
            .filter(|node_type| !self.is_handled(node_type))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(
                node_types = %missing.iter().join(", "),
                "unable to process update, missing handlers"
            );
            return Err(Error::MissingHandlers(missing));
        }

        Ok(())
    }

    fn bulk_update(
        &self,
        changes: &ChangeSet,
        plan: Plan<'_>,
        ctx: &WriteContext<'_>,
    ) -> Result<(), BulkUpdateError> {
        let mut deleted = Progress::default();
        if let Err(error) = self.run_pass(
            changes.deletes(),
            Direction::Reverse,
            plan,
            ctx,
            &mut deleted,
        ) {
            let unprocessed = unprocessed_ids(changes.deletes(), &deleted)
                .chain(changes.updates().values().flatten().map(Change::id))
                .cloned()
                .collect();
            let reverter = Reverter::new(
                self.clone(),
                vec![RevertStage::new(&deleted, Direction::Reverse)],
            );
            return Err(BulkUpdateError::new(unprocessed, error, reverter));
        }

        let mut updated = Progress::default();
        if let Err(error) = self.run_pass(
            changes.updates(),
            Direction::Forward,
            plan,
            ctx,
            &mut updated,
        ) {
            let unprocessed = unprocessed_ids(changes.updates(), &updated)
                .cloned()
                .collect();
            let reverter = Reverter::new(
                self.clone(),
                vec![
                    RevertStage::new(&updated, Direction::Forward),
                    RevertStage::new(&deleted, Direction::Reverse),
                ],
            );
            return Err(BulkUpdateError::new(unprocessed, error, reverter));
        }

        Ok(())
    }

    // Visits handlers in the given direction, invoking each on the changes
    // it's responsible for. Stops at the first failure.
    pub(crate) fn run_pass(
        &self,
        updates: &Updates,
        direction: Direction,
        plan: Plan<'_>,
        ctx: &WriteContext<'_>,
        progress: &mut Progress,
    ) -> Result<(), WriteError> {
        if updates.is_empty() {
            return Ok(());
        }
        Debug::PassStart(direction, updates.values().map(Vec::len).sum())
            .log();

        let handler_types = match plan {
            Plan::Ordered => self.order_in(direction),
            Plan::Single(node_type) => std::slice::from_ref(node_type),
        };
        for handler_type in handler_types {
            let Some(entry) = self.0.handlers.get(handler_type) else {
                continue;
            };

            let invocations = collect(handler_type, entry, updates, ctx)?;
            if invocations.is_empty() {
                Debug::HandlerSkipped(handler_type).log();
                continue;
            }

            for invocation in invocations {
                let change = &invocation.change;
                Debug::HandlerInvoke(handler_type, change).log();
                if let Err(error) = entry.handler.apply(
                    change.id(),
                    change.before(),
                    change.after(),
                    ctx,
                ) {
                    error!(
                        node_type = %handler_type,
                        handler = %entry.handler.name(),
                        %error,
                        "error while processing data change"
                    );
                    return Err(error);
                }
                Debug::HandlerSuccess(handler_type, change.id()).log();
                progress.record(invocation);
            }
        }

        Ok(())
    }

    fn order_in(&self, direction: Direction) -> &[NodeType] {
        match direction {
            Direction::Forward => &self.0.order,
            Direction::Reverse => &self.0.order_reversed,
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Registry({:?})", self.0.order)
    }
}

// ===== impl Progress =====

impl Progress {
    fn record(&mut self, invocation: Invocation) {
        self.processed.insert(invocation.change.id().clone());
        self.processed.extend(invocation.covers);
        self.applied.push(invocation.change);
    }
}

// ===== helper functions =====

// Gathers the changes a handler must be invoked with during a pass.
//
// Changes to the handler's own node type are used as they are. Changes to its
// subtree children are folded into a change of their enclosing root instance,
// one per root, read from the snapshots when the batch has no change for the
// root itself.
fn collect(
    handler_type: &NodeType,
    entry: &HandlerEntry,
    updates: &Updates,
    ctx: &WriteContext<'_>,
) -> Result<Vec<Invocation>, WriteError> {
    let mut invocations: Vec<Invocation> = updates
        .get(handler_type)
        .into_iter()
        .flatten()
        .map(|change| Invocation {
            change: change.clone(),
            covers: vec![change.id().clone()],
        })
        .collect();
    let mut roots: HashMap<InstanceId, usize> = invocations
        .iter()
        .enumerate()
        .map(|(idx, invocation)| (invocation.change.id().clone(), idx))
        .collect();

    for child_type in &entry.children {
        for change in updates.get(child_type).into_iter().flatten() {
            let Some(root) = change.id().cut(handler_type) else {
                continue;
            };

            if let Some(idx) = roots.get(&root) {
                invocations[*idx].covers.push(change.id().clone());
                continue;
            }

            Debug::SubtreeRootSynthesized(handler_type, &root).log();
            let before = ctx.read_before(&root);
            let after = ctx.read_after(&root);
            let root_change = Change::new(root.clone(), before, after)
                .map_err(|_| WriteError::SubtreeRootMissing(root.clone()))?;
            roots.insert(root, invocations.len());
            invocations.push(Invocation {
                change: root_change,
                covers: vec![change.id().clone()],
            });
        }
    }

    Ok(invocations)
}

// Identifiers of the given changes not accounted for by the pass progress.
fn unprocessed_ids<'a>(
    updates: &'a Updates,
    progress: &'a Progress,
) -> impl Iterator<Item = &'a InstanceId> + 'a {
    updates
        .values()
        .flatten()
        .map(Change::id)
        .filter(|id| !progress.processed.contains(*id))
}
