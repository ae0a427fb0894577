//! Name-keyed index over node occurrences in the forest.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;

/// Location of one node: the tree it lives in and its arena index there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub tree: String,
    pub node: Index,
}

impl NodeRef {
    pub fn new(tree: impl Into<String>, node: Index) -> Self {
        Self {
            tree: tree.into(),
            node,
        }
    }

    fn sort_key(&self) -> (&str, usize, u64) {
        let (slot, generation) = self.node.into_raw_parts();
        (self.tree.as_str(), slot, generation)
    }
}

/// Occurrences grouped by item name.
#[derive(Debug, Default)]
pub struct NodeIndex {
    by_name: HashMap<String, HashSet<NodeRef>>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, node: NodeRef) {
        self.by_name.entry(name.to_string()).or_default().insert(node);
    }

    pub fn remove(&mut self, name: &str, node: &NodeRef) -> bool {
        let Some(nodes) = self.by_name.get_mut(name) else {
            return false;
        };
        let removed = nodes.remove(node);
        if nodes.is_empty() {
            self.by_name.remove(name);
        }
        removed
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains(&self, name: &str, node: &NodeRef) -> bool {
        self.by_name.get(name).is_some_and(|n| n.contains(node))
    }

    /// All occurrences of `name`, in a stable order.
    pub fn occurrences(&self, name: &str) -> Vec<NodeRef> {
        let mut nodes: Vec<NodeRef> = self
            .by_name
            .get(name)
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default();
        nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        nodes
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Total number of indexed occurrences.
    pub fn len(&self) -> usize {
        self.by_name.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
