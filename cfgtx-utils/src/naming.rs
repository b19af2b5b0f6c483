//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use itertools::Itertools;
use tracing::debug;

/// Bidirectional mapping between model names and backend indexes.
///
/// Every operation locks the table for its own duration. Handlers performing
/// a multi-step sequence (e.g. allocate an index, then program the backend
/// with it) must hold the guard returned by [`NamingContext::lock`] for the
/// whole sequence.
#[derive(Debug)]
pub struct NamingContext {
    table: Mutex<NamingTable>,
}

#[derive(Debug)]
pub struct NamingTable {
    // Prefix of the names made up for indexes learned without one.
    prefix: String,
    mappings: BTreeMap<String, u32>,
}

// Exclusive access to a naming table.
#[derive(Debug)]
pub struct NamingGuard<'a>(MutexGuard<'a, NamingTable>);

/// One-to-many mapping from parent names to indexed children (e.g.
/// sub-interfaces of an interface, rules of an access list).
///
/// Child indexes are scoped to their parent and never go below the start
/// index given at creation.
#[derive(Debug)]
pub struct MultiNamingContext {
    table: Mutex<MultiNamingTable>,
}

#[derive(Debug)]
pub struct MultiNamingTable {
    start_index: u32,
    // Parent name -> child name -> child index.
    mappings: BTreeMap<String, BTreeMap<String, u32>>,
}

// Exclusive access to a multi naming table.
#[derive(Debug)]
pub struct MultiNamingGuard<'a>(MutexGuard<'a, MultiNamingTable>);

#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    NameNotFound(String),
    AmbiguousIndex(u32, Vec<String>),
    IndexExhausted,
    IndexBelowStart(u32, u32),
    ParentNotFound(String),
    ChildNotFound(String, u32),
}

// ===== impl NamingContext =====

impl NamingContext {
    pub fn new(prefix: &str) -> NamingContext {
        NamingContext {
            table: Mutex::new(NamingTable {
                prefix: prefix.to_owned(),
                mappings: Default::default(),
            }),
        }
    }

    pub fn lock(&self) -> NamingGuard<'_> {
        NamingGuard(self.table.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get_name(&self, index: u32) -> Result<String, Error> {
        self.lock().get_name(index)
    }

    pub fn get_name_if_present(
        &self,
        index: u32,
    ) -> Result<Option<String>, Error> {
        self.lock().get_name_if_present(index)
    }

    pub fn contains_name(&self, index: u32) -> bool {
        self.lock().contains_name(index)
    }

    pub fn add_name(&self, index: u32, name: &str) {
        self.lock().add_name(index, name)
    }

    pub fn add_name_next(&self, name: &str) -> Result<u32, Error> {
        self.lock().add_name_next(name)
    }

    pub fn remove_name(&self, name: &str) -> Option<u32> {
        self.lock().remove_name(name)
    }

    pub fn get_index(&self, name: &str) -> Result<u32, Error> {
        self.lock().get_index(name)
    }

    pub fn contains_index(&self, name: &str) -> bool {
        self.lock().contains_index(name)
    }
}

// ===== impl NamingTable =====

impl NamingTable {
    /// Returns the name mapped to the given index, mapping an artificial
    /// name when there's none.
    pub fn get_name(&mut self, index: u32) -> Result<String, Error> {
        if let Some(name) = self.get_name_if_present(index)? {
            return Ok(name);
        }

        let name = format!("{}{}", self.prefix, index);
        debug!(%index, %name, "mapping artificial name");
        self.add_name(index, &name);
        Ok(name)
    }

    pub fn get_name_if_present(
        &self,
        index: u32,
    ) -> Result<Option<String>, Error> {
        let names = self
            .mappings
            .iter()
            .filter(|(_, mapped)| **mapped == index)
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        match names.as_slice() {
            [] => Ok(None),
            [name] => Ok(Some((*name).clone())),
            _ => Err(Error::AmbiguousIndex(
                index,
                names.into_iter().cloned().collect(),
            )),
        }
    }

    pub fn contains_name(&self, index: u32) -> bool {
        self.mappings.values().any(|mapped| *mapped == index)
    }

    // Maps a name to an index, replacing any previous mapping of that name.
    pub fn add_name(&mut self, index: u32, name: &str) {
        self.mappings.insert(name.to_owned(), index);
    }

    // Maps a name to the next available index and returns it.
    pub fn add_name_next(&mut self, name: &str) -> Result<u32, Error> {
        let index = self.next_index()?;
        self.add_name(index, name);
        Ok(index)
    }

    pub fn remove_name(&mut self, name: &str) -> Option<u32> {
        self.mappings.remove(name)
    }

    pub fn get_index(&self, name: &str) -> Result<u32, Error> {
        self.mappings
            .get(name)
            .copied()
            .ok_or_else(|| Error::NameNotFound(name.to_owned()))
    }

    pub fn contains_index(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    // One past the highest mapped index, starting at zero.
    pub fn next_index(&self) -> Result<u32, Error> {
        match self.mappings.values().max() {
            Some(index) => index.checked_add(1).ok_or(Error::IndexExhausted),
            None => Ok(0),
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

// ===== impl NamingGuard =====

impl Deref for NamingGuard<'_> {
    type Target = NamingTable;

    fn deref(&self) -> &NamingTable {
        &self.0
    }
}

impl DerefMut for NamingGuard<'_> {
    fn deref_mut(&mut self) -> &mut NamingTable {
        &mut self.0
    }
}

// ===== impl MultiNamingContext =====

impl MultiNamingContext {
    pub fn new(start_index: u32) -> MultiNamingContext {
        MultiNamingContext {
            table: Mutex::new(MultiNamingTable {
                start_index,
                mappings: Default::default(),
            }),
        }
    }

    pub fn lock(&self) -> MultiNamingGuard<'_> {
        MultiNamingGuard(
            self.table.lock().unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn add_child(
        &self,
        parent: &str,
        index: u32,
        child: &str,
    ) -> Result<(), Error> {
        self.lock().add_child(parent, index, child)
    }

    pub fn add_child_next(
        &self,
        parent: &str,
        child: &str,
    ) -> Result<u32, Error> {
        self.lock().add_child_next(parent, child)
    }

    pub fn get_child_name(
        &self,
        parent: &str,
        index: u32,
    ) -> Result<String, Error> {
        self.lock().get_child_name(parent, index)
    }

    pub fn get_child_index(
        &self,
        parent: &str,
        child: &str,
    ) -> Result<u32, Error> {
        self.lock().get_child_index(parent, child)
    }

    pub fn remove_child(&self, parent: &str, child: &str) -> Option<u32> {
        self.lock().remove_child(parent, child)
    }
}

// ===== impl MultiNamingTable =====

impl MultiNamingTable {
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    // Maps a child of the given parent to an index, replacing any previous
    // mapping of that child. Other children of the parent are kept.
    pub fn add_child(
        &mut self,
        parent: &str,
        index: u32,
        child: &str,
    ) -> Result<(), Error> {
        if index < self.start_index {
            return Err(Error::IndexBelowStart(index, self.start_index));
        }

        self.mappings
            .entry(parent.to_owned())
            .or_default()
            .insert(child.to_owned(), index);
        Ok(())
    }

    // Maps a child to the next index available under its parent and returns
    // it.
    pub fn add_child_next(
        &mut self,
        parent: &str,
        child: &str,
    ) -> Result<u32, Error> {
        let index = self.next_child_index(parent)?;
        self.add_child(parent, index, child)?;
        Ok(index)
    }

    pub fn get_child_name(
        &self,
        parent: &str,
        index: u32,
    ) -> Result<String, Error> {
        let children = self.children(parent)?;
        let names = children
            .iter()
            .filter(|(_, mapped)| **mapped == index)
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        match names.as_slice() {
            [] => Err(Error::ChildNotFound(parent.to_owned(), index)),
            [name] => Ok((*name).clone()),
            _ => Err(Error::AmbiguousIndex(
                index,
                names.into_iter().cloned().collect(),
            )),
        }
    }

    pub fn get_child_index(
        &self,
        parent: &str,
        child: &str,
    ) -> Result<u32, Error> {
        self.children(parent)?
            .get(child)
            .copied()
            .ok_or_else(|| Error::NameNotFound(child.to_owned()))
    }

    // Removes a child mapping. Unknown parents and children are ignored.
    pub fn remove_child(&mut self, parent: &str, child: &str) -> Option<u32> {
        let children = self.mappings.get_mut(parent)?;
        let index = children.remove(child);
        if children.is_empty() {
            self.mappings.remove(parent);
        }
        index
    }

    // One past the highest child index of the parent, or the start index
    // when it has no children.
    pub fn next_child_index(&self, parent: &str) -> Result<u32, Error> {
        match self
            .mappings
            .get(parent)
            .and_then(|children| children.values().max())
        {
            Some(index) => index.checked_add(1).ok_or(Error::IndexExhausted),
            None => Ok(self.start_index),
        }
    }

    fn children(&self, parent: &str) -> Result<&BTreeMap<String, u32>, Error> {
        self.mappings
            .get(parent)
            .ok_or_else(|| Error::ParentNotFound(parent.to_owned()))
    }
}

// ===== impl MultiNamingGuard =====

impl Deref for MultiNamingGuard<'_> {
    type Target = MultiNamingTable;

    fn deref(&self) -> &MultiNamingTable {
        &self.0
    }
}

impl DerefMut for MultiNamingGuard<'_> {
    fn deref_mut(&mut self) -> &mut MultiNamingTable {
        &mut self.0
    }
}

// ===== impl Error =====

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NameNotFound(name) => {
                write!(f, "no mapping stored for name: {name}")
            }
            Error::AmbiguousIndex(index, names) => {
                write!(
                    f,
                    "multiple mappings defined with index {}: {}",
                    index,
                    names.iter().join(", ")
                )
            }
            Error::IndexExhausted => {
                write!(f, "no index left to allocate")
            }
            Error::IndexBelowStart(index, start) => {
                write!(f, "index {index} is lower than start index {start}")
            }
            Error::ParentNotFound(parent) => {
                write!(f, "no mapping stored for parent: {parent}")
            }
            Error::ChildNotFound(parent, index) => {
                write!(f, "no child of {parent} mapped to index {index}")
            }
        }
    }
}

impl std::error::Error for Error {}

// ===== unit tests =====
