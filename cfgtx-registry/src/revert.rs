//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use itertools::Itertools;
use tracing::{error, info, warn};

use crate::change::{Change, Updates};
use crate::debug::Debug;
use crate::handler::{WriteContext, WriteError};
use crate::path::InstanceId;
use crate::registry::{Direction, Plan, Progress, Registry};

/// Failure of a bulk update.
///
/// Carries everything needed to undo the part of the batch that was already
/// applied.
#[derive(Debug)]
pub struct BulkUpdateError {
    unprocessed: BTreeSet<InstanceId>,
    cause: WriteError,
    reverter: Reverter,
}

/// Undoes the changes applied by a failed bulk update.
///
/// Changes are reverted in stages, most recent pass first. Each stage applies
/// the inverse of the changes of a pass, visiting handlers in the direction
/// opposite to the one they were applied in.
#[derive(Clone, Debug)]
pub struct Reverter {
    registry: Registry,
    stages: Vec<RevertStage>,
}

#[derive(Clone, Debug)]
pub(crate) struct RevertStage {
    direction: Direction,
    // Inverse changes, in invocation order.
    changes: Vec<Change>,
}

/// Failure to revert a failed bulk update.
#[derive(Debug)]
pub struct RevertFailedError {
    not_reverted: BTreeSet<InstanceId>,
    cause: WriteError,
    // Inverse changes still pending.
    reverter: Reverter,
}

// ===== impl BulkUpdateError =====

impl BulkUpdateError {
    pub(crate) fn new(
        unprocessed: BTreeSet<InstanceId>,
        cause: WriteError,
        reverter: Reverter,
    ) -> BulkUpdateError {
        BulkUpdateError {
            unprocessed,
            cause,
            reverter,
        }
    }

    /// Identifiers of the changes that were never applied.
    pub fn unprocessed_ids(&self) -> &BTreeSet<InstanceId> {
        &self.unprocessed
    }

    pub fn cause(&self) -> &WriteError {
        &self.cause
    }

    pub fn new_reverter(&self) -> Reverter {
        self.reverter.clone()
    }

    pub fn revert_changes(
        &self,
        ctx: &WriteContext<'_>,
    ) -> Result<(), RevertFailedError> {
        self.reverter.revert(ctx)
    }

    pub fn log(&self) {
        warn!(
            unprocessed = %self.unprocessed.iter().join(", "),
            error = %self.cause,
            "{}", self
        );
    }
}

impl std::fmt::Display for BulkUpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bulk update failed at: {}",
            self.unprocessed.iter().join(", ")
        )
    }
}

impl std::error::Error for BulkUpdateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

// ===== impl Reverter =====

impl Reverter {
    pub(crate) fn new(
        registry: Registry,
        stages: Vec<RevertStage>,
    ) -> Reverter {
        let stages = stages
            .into_iter()
            .filter(|stage| !stage.changes.is_empty())
            .collect();
        Reverter { registry, stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Inverse changes, in the order they will be attempted.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.stages.iter().flat_map(|stage| stage.changes.iter())
    }

    /// Applies the inverse of every change applied before the failure.
    ///
    /// A failure during revert is reported as is and never reverted itself.
    pub fn revert(
        &self,
        ctx: &WriteContext<'_>,
    ) -> Result<(), RevertFailedError> {
        if self.is_empty() {
            return Ok(());
        }
        info!(count = self.changes().count(), "attempting revert");

        for (idx, stage) in self.stages.iter().enumerate() {
            Debug::RevertStage(stage.direction, stage.changes.len()).log();

            let mut updates = Updates::new();
            for change in &stage.changes {
                updates
                    .entry(change.node_type())
                    .or_default()
                    .push(change.clone());
            }

            let mut progress = Progress::default();
            if let Err(cause) = self.registry.run_pass(
                &updates,
                stage.direction,
                Plan::Ordered,
                ctx,
                &mut progress,
            ) {
                let pending = RevertStage {
                    direction: stage.direction,
                    changes: stage
                        .changes
                        .iter()
                        .filter(|change| {
                            !progress.processed.contains(change.id())
                        })
                        .cloned()
                        .collect(),
                };
                let stages = std::iter::once(pending)
                    .chain(self.stages[idx + 1..].iter().cloned())
                    .collect();
                let reverter = Reverter::new(self.registry.clone(), stages);
                let not_reverted =
                    reverter.changes().map(Change::id).cloned().collect();
                let error = RevertFailedError {
                    not_reverted,
                    cause,
                    reverter,
                };
                error.log();
                return Err(error);
            }
        }

        info!("revert successful");
        Ok(())
    }
}

// ===== impl RevertStage =====

impl RevertStage {
    // Stage undoing what a pass applied in the given direction.
    pub(crate) fn new(progress: &Progress, applied: Direction) -> RevertStage {
        RevertStage {
            direction: applied.opposite(),
            changes: progress.applied.iter().map(Change::reverse).collect(),
        }
    }
}

// ===== impl RevertFailedError =====

impl RevertFailedError {
    /// Identifiers of the changes still applied after the failed revert.
    pub fn not_reverted(&self) -> &BTreeSet<InstanceId> {
        &self.not_reverted
    }

    pub fn cause(&self) -> &WriteError {
        &self.cause
    }

    /// Reverter limited to the changes still applied, skipping the inverse
    /// changes that already succeeded.
    pub fn new_reverter(&self) -> Reverter {
        self.reverter.clone()
    }

    pub fn log(&self) {
        error!(
            not_reverted = %self.not_reverted.iter().join(", "),
            error = %self.cause,
            "{}", self
        );
    }
}

impl std::fmt::Display for RevertFailedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unable to revert changes: {}",
            self.not_reverted.iter().join(", ")
        )
    }
}

impl std::error::Error for RevertFailedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
