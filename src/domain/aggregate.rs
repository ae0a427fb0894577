//! Quantity roll-up over a subtree.

use std::collections::HashMap;
use std::fmt;

use generational_arena::Index;
use itertools::Itertools;
use tracing::instrument;

use crate::domain::arena::{Node, Tree};

/// Which descendants take part in a roll-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescendantFilter {
    /// Components only
    Leaves,
    /// Sub-assemblies only
    Internal,
    All,
}

impl DescendantFilter {
    fn accepts(self, node: &Node) -> bool {
        match self {
            Self::Leaves => node.is_leaf(),
            Self::Internal => !node.is_leaf(),
            Self::All => true,
        }
    }
}

/// A name with its total quantity, rendered as `name:quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub quantity: u64,
}

impl Entry {
    pub fn new(name: impl Into<String>, quantity: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.quantity)
    }
}

/// Sums effective quantities of all descendants below a query root.
///
/// The effective quantity of a descendant is its own quantity times the
/// quantities of every node strictly between it and the query root. Every
/// occurrence of a name contributes to one entry. Products saturate at
/// `u64::MAX` instead of wrapping.
pub struct DescendantAggregator<'a> {
    tree: &'a Tree,
    filter: DescendantFilter,
}

impl<'a> DescendantAggregator<'a> {
    pub fn new(tree: &'a Tree, filter: DescendantFilter) -> Self {
        Self { tree, filter }
    }

    /// Entries ordered by quantity descending, then by name.
    #[instrument(level = "debug", skip(self), fields(tree = self.tree.id(), filter = ?self.filter))]
    pub fn aggregate(&self, root: Index) -> Vec<Entry> {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        let mut stack: Vec<(Index, u64)> = self
            .tree
            .get(root)
            .map(|n| n.children.iter().map(|&c| (c, 1)).collect())
            .unwrap_or_default();

        while let Some((idx, multiplier)) = stack.pop() {
            let Some(node) = self.tree.get(idx) else {
                continue;
            };
            let effective = multiplier.saturating_mul(u64::from(node.quantity()));
            if self.filter.accepts(node) {
                let total = totals.entry(node.name()).or_insert(0);
                *total = total.saturating_add(effective);
            }
            stack.extend(node.children.iter().map(|&c| (c, effective)));
        }

        totals
            .into_iter()
            .map(|(name, quantity)| Entry::new(name, quantity))
            .sorted_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)))
            .collect()
    }
}
