//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

// Schema-level path (no keys), e.g. "/interfaces/interface".
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct NodeType(Vec<String>);

// Instance-level path, e.g. "/interfaces/interface[name='eth0']".
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct InstanceId(Vec<PathArg>);

// Single segment of an instance path.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct PathArg {
    pub name: String,
    pub keys: Vec<(String, String)>,
}

// Instance path parse errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParsePathError {
    MissingLeadingSlash,
    EmptySegment,
    UnterminatedKey,
    MalformedKey(String),
}

// ===== impl NodeType =====

impl NodeType {
    // Creates a node type from a slash-separated schema path. Empty segments
    // are ignored.
    pub fn new(path: &str) -> NodeType {
        NodeType(
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn from_segments<I, S>(segments: I) -> NodeType
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeType(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn child(&self, name: &str) -> NodeType {
        let mut segments = self.0.clone();
        segments.push(name.to_owned());
        NodeType(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    // Returns true if `other` lies strictly below this node type.
    pub fn is_ancestor_of(&self, other: &NodeType) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for NodeType {
    fn from(path: &str) -> NodeType {
        NodeType::new(path)
    }
}

// ===== impl InstanceId =====

impl InstanceId {
    pub fn new() -> InstanceId {
        InstanceId(Vec::new())
    }

    #[must_use]
    pub fn child(mut self, name: &str) -> InstanceId {
        self.0.push(PathArg {
            name: name.to_owned(),
            keys: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn keyed_child<I, K, V>(mut self, name: &str, keys: I) -> InstanceId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(PathArg {
            name: name.to_owned(),
            keys: keys
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        });
        self
    }

    pub fn path_args(&self) -> &[PathArg] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    // Returns the wildcarded node type of this instance.
    pub fn node_type(&self) -> NodeType {
        NodeType(self.0.iter().map(|arg| arg.name.clone()).collect())
    }

    // Truncates this identifier to the depth of the given node type, keeping
    // the keys of the retained segments.
    //
    // Returns `None` if the node type isn't an inclusive ancestor of this
    // identifier's own node type.
    pub fn cut(&self, node_type: &NodeType) -> Option<InstanceId> {
        let depth = node_type.depth();
        if depth > self.0.len() {
            return None;
        }
        if !self.0[..depth]
            .iter()
            .zip(node_type.segments())
            .all(|(arg, segment)| arg.name == *segment)
        {
            return None;
        }

        Some(InstanceId(self.0[..depth].to_vec()))
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for arg in &self.0 {
            write!(f, "/{arg}")?;
        }
        Ok(())
    }
}

impl FromStr for InstanceId {
    type Err = ParsePathError;

    // Accepts paths in the form "/a/b[k1='v1'][k2=v2]/c". Key values can be
    // quoted with single or double quotes, or left bare.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(mut rest) = s.strip_prefix('/') else {
            return Err(ParsePathError::MissingLeadingSlash);
        };

        let mut args = vec![];
        while !rest.is_empty() {
            let name_end =
                rest.find(['/', '[']).unwrap_or(rest.len());
            let name = &rest[..name_end];
            if name.is_empty() {
                return Err(ParsePathError::EmptySegment);
            }
            rest = &rest[name_end..];

            let mut keys = vec![];
            while let Some(predicate) = rest.strip_prefix('[') {
                let (key, value, remaining) = parse_key(predicate)?;
                keys.push((key, value));
                rest = remaining;
            }
            args.push(PathArg {
                name: name.to_owned(),
                keys,
            });

            match rest.strip_prefix('/') {
                Some(remaining) if remaining.is_empty() => {
                    return Err(ParsePathError::EmptySegment);
                }
                Some(remaining) => rest = remaining,
                None if rest.is_empty() => (),
                None => {
                    return Err(ParsePathError::MalformedKey(rest.to_owned()));
                }
            }
        }

        Ok(InstanceId(args))
    }
}

impl From<NodeType> for InstanceId {
    fn from(node_type: NodeType) -> InstanceId {
        InstanceId(
            node_type
                .0
                .into_iter()
                .map(|name| PathArg { name, keys: vec![] })
                .collect(),
        )
    }
}

// ===== impl PathArg =====

impl PathArg {
    pub fn key(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Display for PathArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.keys.is_empty() {
            let keys = self
                .keys
                .iter()
                .map(|(key, value)| {
                    // Values holding a single quote can't be single-quoted.
                    let quote = if value.contains('\'') { '"' } else { '\'' };
                    format!("[{key}={quote}{value}{quote}]")
                })
                .join("");
            write!(f, "{keys}")?;
        }
        Ok(())
    }
}

// ===== impl ParsePathError =====

impl std::fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsePathError::MissingLeadingSlash => {
                write!(f, "path must start with '/'")
            }
            ParsePathError::EmptySegment => {
                write!(f, "path contains an empty segment")
            }
            ParsePathError::UnterminatedKey => {
                write!(f, "unterminated key predicate")
            }
            ParsePathError::MalformedKey(predicate) => {
                write!(f, "malformed key predicate: {predicate}")
            }
        }
    }
}

impl std::error::Error for ParsePathError {}

// ===== helper functions =====

// Parses one "key=value]" predicate (the opening bracket is already consumed)
// and returns the remaining input.
fn parse_key(input: &str) -> Result<(String, String, &str), ParsePathError> {
    let Some((key, value_start)) = input.split_once('=') else {
        return Err(ParsePathError::UnterminatedKey);
    };
    let key = key.trim();
    if key.is_empty() || key.contains(']') {
        return Err(ParsePathError::MalformedKey(input.to_owned()));
    }

    let (value, remaining) = match value_start.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let quoted = &value_start[1..];
            let end = quoted
                .find(quote)
                .ok_or(ParsePathError::UnterminatedKey)?;
            let remaining = quoted[end + 1..]
                .strip_prefix(']')
                .ok_or(ParsePathError::UnterminatedKey)?;
            (&quoted[..end], remaining)
        }
        _ => {
            let end =
                value_start.find(']').ok_or(ParsePathError::UnterminatedKey)?;
            (&value_start[..end], &value_start[end + 1..])
        }
    };

    Ok((key.to_owned(), value.to_owned(), remaining))
}

// ===== unit tests =====
