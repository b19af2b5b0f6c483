//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::config::Config;
use crate::debug::Debug;
use crate::error::Error;
use crate::handler::Handler;
use crate::path::NodeType;
use crate::registry::{HandlerEntry, Registry};

/// Handler along with its subtree ownership and ordering constraints.
pub struct Registration {
    handler: Arc<dyn Handler>,
    children: BTreeSet<NodeType>,
    after: Vec<NodeType>,
    before: Vec<NodeType>,
}

/// Collects handler registrations and resolves their ordering constraints
/// into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    config: Config,
    // Ordering graph vertices, in order of first appearance.
    vertices: Vec<NodeType>,
    vertex_ids: HashMap<NodeType, usize>,
    // (a, b): vertex `a` must be applied before vertex `b`.
    edges: BTreeSet<(usize, usize)>,
    handlers: HashMap<NodeType, HandlerEntry>,
    // Handler node types in registration order.
    registered: Vec<NodeType>,
    // Every claimed node type (own or subtree child) and its owning handler.
    claimed: HashMap<NodeType, NodeType>,
}

// ===== impl Registration =====

impl Registration {
    pub fn new(handler: impl Handler + 'static) -> Registration {
        Registration::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn Handler>) -> Registration {
        Registration {
            handler,
            children: Default::default(),
            after: Default::default(),
            before: Default::default(),
        }
    }

    // Node types below the handler's own type that it also takes care of.
    #[must_use]
    pub fn subtree<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn after<I>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.after.extend(related);
        self
    }

    #[must_use]
    pub fn before<I>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.before.extend(related);
        self
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("node_type", self.handler.node_type())
            .field("children", &self.children)
            .field("after", &self.after)
            .field("before", &self.before)
            .finish()
    }
}

// ===== impl RegistryBuilder =====

impl RegistryBuilder {
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn with_config(config: Config) -> RegistryBuilder {
        RegistryBuilder {
            config,
            ..Default::default()
        }
    }

    pub fn register(
        &mut self,
        registration: Registration,
    ) -> Result<&mut Self, Error> {
        let Registration {
            handler,
            children,
            after,
            before,
        } = registration;
        let node_type = handler.node_type().clone();

        // Validate everything before touching the graph.
        if self.claimed.contains_key(&node_type) {
            return Err(Error::DuplicateHandler(node_type));
        }
        for child in &children {
            if !node_type.is_ancestor_of(child) {
                return Err(Error::InvalidSubtreeChild(
                    node_type,
                    child.clone(),
                ));
            }
            if self.claimed.contains_key(child) {
                return Err(Error::DuplicateHandler(child.clone()));
            }
        }

        let vertex = self.add_vertex(&node_type);
        for related in &after {
            let related = self.add_vertex(related);
            self.edges.insert((related, vertex));
        }
        for related in &before {
            let related = self.add_vertex(related);
            self.edges.insert((vertex, related));
        }

        self.claimed.insert(node_type.clone(), node_type.clone());
        for child in &children {
            self.claimed.insert(child.clone(), node_type.clone());
        }

        Debug::HandlerRegistered(&node_type, handler.name()).log();
        self.registered.push(node_type.clone());
        self.handlers
            .insert(node_type, HandlerEntry { handler, children });

        Ok(self)
    }

    pub fn add(
        &mut self,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, Error> {
        self.register(Registration::new(handler))
    }

    pub fn add_after<I>(
        &mut self,
        handler: impl Handler + 'static,
        related: I,
    ) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.register(Registration::new(handler).after(related))
    }

    pub fn add_before<I>(
        &mut self,
        handler: impl Handler + 'static,
        related: I,
    ) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.register(Registration::new(handler).before(related))
    }

    pub fn subtree_add<I>(
        &mut self,
        children: I,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = NodeType>,
    {
        self.register(Registration::new(handler).subtree(children))
    }

    // Orders all handlers and creates the registry.
    pub fn build(self) -> Result<Registry, Error> {
        let order = self.sort()?;
        debug!(handlers = %order.iter().join(", "), "building handler registry");
        Ok(Registry::new(self.handlers, order, self.config))
    }

    fn add_vertex(&mut self, node_type: &NodeType) -> usize {
        if let Some(vertex) = self.vertex_ids.get(node_type) {
            return *vertex;
        }

        let vertex = self.vertices.len();
        self.vertices.push(node_type.clone());
        self.vertex_ids.insert(node_type.clone(), vertex);
        vertex
    }

    // Vertices standing for subtree children are replaced by the vertex of
    // the handler owning them.
    fn resolve(&self, vertex: usize) -> usize {
        let node_type = &self.vertices[vertex];
        match self.claimed.get(node_type) {
            Some(owner) if owner != node_type => self
                .vertex_ids
                .get(owner)
                .copied()
                .unwrap_or(vertex),
            _ => vertex,
        }
    }

    // Topological sort (Kahn's algorithm). Among the vertices ready at any
    // point, handlers go by registration order and relation-only vertices
    // after them by first appearance.
    fn sort(&self) -> Result<Vec<NodeType>, Error> {
        let count = self.vertices.len();

        let mut priority: Vec<usize> =
            (0..count).map(|vertex| self.registered.len() + vertex).collect();
        for (position, node_type) in self.registered.iter().enumerate() {
            if let Some(vertex) = self.vertex_ids.get(node_type) {
                priority[*vertex] = position;
            }
        }

        let mut successors = vec![BTreeSet::new(); count];
        let mut in_degree = vec![0usize; count];
        for (from, to) in &self.edges {
            let (from, to) = (self.resolve(*from), self.resolve(*to));
            if successors[from].insert(to) {
                in_degree[to] += 1;
            }
        }

        let mut ready: BTreeSet<(usize, usize)> = (0..count)
            .filter(|vertex| in_degree[*vertex] == 0)
            .map(|vertex| (priority[vertex], vertex))
            .collect();
        let mut sorted = Vec::with_capacity(count);
        while let Some((_, vertex)) = ready.pop_first() {
            sorted.push(vertex);
            for next in &successors[vertex] {
                in_degree[*next] -= 1;
                if in_degree[*next] == 0 {
                    ready.insert((priority[*next], *next));
                }
            }
        }

        if sorted.len() < count {
            let cycle = self.cycle_members(&successors, &in_degree);
            return Err(Error::OrderingCycle(
                cycle
                    .into_iter()
                    .sorted_by_key(|vertex| priority[*vertex])
                    .map(|vertex| self.vertices[vertex].clone())
                    .collect(),
            ));
        }

        Ok(sorted
            .into_iter()
            .map(|vertex| &self.vertices[vertex])
            .filter(|node_type| self.handlers.contains_key(*node_type))
            .cloned()
            .collect())
    }

    // Narrows the vertices left unsorted down to the ones on a cycle, by
    // repeatedly discarding those without successors among the remaining.
    fn cycle_members(
        &self,
        successors: &[BTreeSet<usize>],
        in_degree: &[usize],
    ) -> BTreeSet<usize> {
        let mut remaining: BTreeSet<usize> = (0..in_degree.len())
            .filter(|vertex| in_degree[*vertex] > 0)
            .collect();
        loop {
            let sinks: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|vertex| {
                    successors[*vertex]
                        .iter()
                        .all(|next| !remaining.contains(next))
                })
                .collect();
            if sinks.is_empty() {
                return remaining;
            }
            for vertex in sinks {
                remaining.remove(&vertex);
            }
        }
    }
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RegistryBuilder({:?})", self.registered)
    }
}
