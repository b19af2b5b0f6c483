//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use itertools::Itertools;
use tracing::{trace, trace_span};

use crate::change::{Change, ChangeSet};
use crate::path::{InstanceId, NodeType};
use crate::registry::Direction;

#[derive(Debug)]
pub enum Debug<'a> {
    HandlerRegistered(&'a NodeType, &'a str),
    BatchRx(&'a ChangeSet),
    PassStart(Direction, usize),
    HandlerSkipped(&'a NodeType),
    SubtreeRootSynthesized(&'a NodeType, &'a InstanceId),
    HandlerInvoke(&'a NodeType, &'a Change),
    HandlerSuccess(&'a NodeType, &'a InstanceId),
    RevertStage(Direction, usize),
}

// ===== impl Debug =====

impl Debug<'_> {
    pub fn log(&self) {
        match self {
            Debug::HandlerRegistered(node_type, name) => {
                trace_span!("registry").in_scope(|| {
                    trace!(%node_type, %name, "{}", self);
                });
            }
            Debug::BatchRx(changes) => {
                trace_span!("registry").in_scope(|| {
                    let node_types = changes.node_types().iter().join(", ");
                    trace!(count = changes.len(), %node_types, "{}", self);
                });
            }
            Debug::PassStart(direction, count) => {
                trace_span!("registry").in_scope(|| {
                    trace!(?direction, %count, "{}", self);
                });
            }
            Debug::HandlerSkipped(node_type) => {
                trace_span!("registry").in_scope(|| {
                    trace!(%node_type, "{}", self);
                });
            }
            Debug::SubtreeRootSynthesized(node_type, id) => {
                trace_span!("registry").in_scope(|| {
                    trace!(%node_type, %id, "{}", self);
                });
            }
            Debug::HandlerInvoke(node_type, change) => {
                trace_span!("registry").in_scope(|| {
                    trace!(
                        %node_type, id = %change.id(),
                        operation = %change.operation(),
                        "{}", self
                    )
                });
            }
            Debug::HandlerSuccess(node_type, id) => {
                trace_span!("registry")
                    .in_scope(|| trace!(%node_type, %id, "{}", self));
            }
            Debug::RevertStage(direction, count) => {
                trace_span!("registry").in_scope(|| {
                    trace!(?direction, %count, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::HandlerRegistered(..) => {
                write!(f, "handler registered")
            }
            Debug::BatchRx(..) => {
                write!(f, "received batch")
            }
            Debug::PassStart(..) => {
                write!(f, "starting pass")
            }
            Debug::HandlerSkipped(..) => {
                write!(f, "handler unaffected, skipping")
            }
            Debug::SubtreeRootSynthesized(..) => {
                write!(f, "synthesized subtree root change")
            }
            Debug::HandlerInvoke(..) => {
                write!(f, "invoking handler")
            }
            Debug::HandlerSuccess(..) => {
                write!(f, "handler succeeded")
            }
            Debug::RevertStage(..) => {
                write!(f, "reverting stage")
            }
        }
    }
}
