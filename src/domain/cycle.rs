//! Cycle detection for a single attach operation.
//!
//! Attaching a candidate subtree below a parent closes a cycle exactly when a
//! name of the candidate already occurs on the chain from the tree root down
//! to the parent. The reported path starts at the earliest such ancestor,
//! runs through the parent and ends at the conflicting node of the candidate.

use std::fmt;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{Subtree, Tree};

/// Names along an offending cycle, rendered as `A-B-A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(Vec<String>);

impl CyclePath {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// The trivial cycle of an item containing itself.
    pub fn self_reference(name: &str) -> Self {
        Self(vec![name.to_string(), name.to_string()])
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("-"))
    }
}

/// Finds the cycle created by hanging `candidate` below the last element of `chain`.
///
/// `chain` lists the names from the tree root down to the intended parent.
pub fn find_cycle(chain: &[&str], candidate: &Subtree) -> Option<CyclePath> {
    let parent = chain.last()?;
    if candidate.root().name() == *parent {
        return Some(CyclePath::self_reference(parent));
    }

    chain.iter().enumerate().find_map(|(depth, ancestor)| {
        let position = candidate.position_of(ancestor)?;
        let mut path: Vec<String> = chain[depth..].iter().map(|s| s.to_string()).collect();
        path.extend(candidate.path_to(position));
        Some(CyclePath(path))
    })
}

/// Cycle checker bound to one tree.
pub struct CycleChecker<'a> {
    tree: &'a Tree,
}

impl<'a> CycleChecker<'a> {
    pub fn new(tree: &'a Tree) -> Self {
        Self { tree }
    }

    /// Names from the root down to `idx`, both inclusive.
    pub fn chain(&self, idx: Index) -> Vec<&'a str> {
        let tree = self.tree;
        let mut chain: Vec<&str> = tree
            .ancestors(idx)
            .into_iter()
            .rev()
            .filter_map(|i| tree.get(i))
            .map(|n| n.name())
            .collect();
        if let Some(node) = tree.get(idx) {
            chain.push(node.name());
        }
        chain
    }

    /// Returns the offending path if attaching `candidate` below `parent` closes a cycle.
    ///
    /// An unknown `parent` yields no cycle; resolving nodes is the caller's job.
    #[instrument(level = "trace", skip(self, candidate), fields(tree = self.tree.id(), candidate = candidate.root().name()))]
    pub fn check(&self, parent: Index, candidate: &Subtree) -> Option<CyclePath> {
        let chain = self.chain(parent);
        let cycle = find_cycle(&chain, candidate);
        if let Some(path) = &cycle {
            debug!("cycle detected: {}", path);
        }
        cycle
    }
}
