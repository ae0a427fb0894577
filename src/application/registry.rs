//! Forest registry
//!
//! Owns every standalone tree and two indices: embedded assemblies (non-leaf,
//! non-root nodes) and parts (leaf nodes). Each operation runs all of its
//! checks before touching the forest, so a rule violation leaves the forest
//! exactly as it was.
//!
//! All occurrences of an assembly share the same structure: additions and
//! removals are applied to every occurrence at once, and reusing an assembly
//! or part under a new parent attaches a deep copy.

use std::collections::{BTreeMap, HashSet};

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::error::Inconsistency;
use crate::application::index::{NodeIndex, NodeRef};
use crate::application::request::{Outcome, Request};
use crate::domain::{
    CyclePath, DescendantAggregator, DescendantFilter, Entry, Item, Node, RuleResult,
    RuleViolation, Subtree, Tree, TreeNodeConvert, MAX_QUANTITY,
};

/// Subtree about to be attached, plus the standalone tree it swallows.
#[derive(Debug)]
struct Candidate {
    subtree: Subtree,
    absorbs: Option<String>,
}

/// The BOM forest.
#[derive(Debug)]
pub struct Registry {
    /// Standalone trees keyed by root name
    trees: BTreeMap<String, Tree>,
    /// Embedded non-leaf nodes
    assemblies: NodeIndex,
    /// Leaf nodes
    parts: NodeIndex,
    max_quantity: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_max_quantity(MAX_QUANTITY)
    }

    /// Registry with a lower quantity ceiling; values above [`MAX_QUANTITY`] are clamped.
    pub fn with_max_quantity(max_quantity: u32) -> Self {
        Self {
            trees: BTreeMap::new(),
            assemblies: NodeIndex::new(),
            parts: NodeIndex::new(),
            max_quantity: max_quantity.min(MAX_QUANTITY),
        }
    }

    pub fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    /// Runs a request and renders its outcome.
    pub fn execute(&mut self, request: Request) -> RuleResult<String> {
        self.run(request).map(|outcome| outcome.to_string())
    }

    #[instrument(level = "debug", skip(self, request), fields(op = %request.operation()))]
    pub fn run(&mut self, request: Request) -> RuleResult<Outcome> {
        let mutation = request.operation().is_mutation();
        let result = match request {
            Request::AddAssembly { name, children } => {
                self.add_assembly(&name, &children).map(|_| Outcome::Ok)
            }
            Request::AddPart { assembly, item } => {
                self.add_part(&assembly, &item).map(|_| Outcome::Ok)
            }
            Request::RemovePart { assembly, item } => {
                self.remove_part(&assembly, &item).map(|_| Outcome::Ok)
            }
            Request::RemoveAssembly { name } => self.remove_assembly(&name).map(|_| Outcome::Ok),
            Request::PrintAssembly { name } => self.print_assembly(&name),
            Request::GetAssemblies { name } => self.get_assemblies(&name),
            Request::GetComponents { name } => self.get_components(&name),
            Request::ShowTree { name } => self.render_tree(&name).map(Outcome::Rendered),
        };
        match &result {
            Err(violation) => debug!("rule violation: {}", violation),
            Ok(_) if mutation => debug!("forest now holds {} tree(s)", self.trees.len()),
            Ok(_) => {}
        }
        result
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Creates an assembly, or promotes every occurrence of an existing part.
    #[instrument(level = "debug", skip(self))]
    pub fn add_assembly(&mut self, name: &str, children: &[Item]) -> RuleResult<()> {
        if self.is_assembly(name) {
            return Err(RuleViolation::AssemblyExists(name.to_string()));
        }
        if children.is_empty() {
            return Err(RuleViolation::EmptyAssembly(name.to_string()));
        }
        let mut seen = HashSet::new();
        for child in children {
            if !seen.insert(child.name()) {
                return Err(RuleViolation::DuplicateInRequest(child.name().to_string()));
            }
            if child.name() == name {
                return Err(RuleViolation::Cycle(CyclePath::self_reference(name)));
            }
            self.check_quantity(child)?;
        }

        let candidates: Vec<Candidate> = children.iter().map(|c| self.candidate(c)).collect();

        if self.parts.contains_name(name) {
            let targets = self.parts.occurrences(name);
            debug!("promoting {} occurrence(s) of part {}", targets.len(), name);
            self.check_cycles(&targets, &candidates)?;
            for target in &targets {
                self.attach_all(target, &candidates);
            }
        } else {
            let tree = Tree::new(Item::single(name));
            let root = tree.root();
            for candidate in &candidates {
                tree.check_attach(root, &candidate.subtree)
                    .map_err(RuleViolation::Cycle)?;
            }
            self.trees.insert(name.to_string(), tree);
            self.attach_all(&NodeRef::new(name, root), &candidates);
        }

        self.absorb(&candidates);
        Ok(())
    }

    /// Adds `item` to every occurrence of `assembly`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_part(&mut self, assembly: &str, item: &Item) -> RuleResult<()> {
        let targets = self.resolve_assembly(assembly)?;
        if item.quantity == 0 {
            return Err(RuleViolation::ZeroQuantity {
                name: item.name().to_string(),
            });
        }

        let already_child = self
            .tree_of(&targets[0])
            .and_then(|tree| tree.child_named(targets[0].node, item.name()))
            .is_some();
        if already_child {
            return self.increase_quantity(&targets, item);
        }

        self.check_quantity(item)?;
        let candidates = [self.candidate(item)];
        self.check_cycles(&targets, &candidates)?;
        for target in &targets {
            self.attach_all(target, &candidates);
        }
        self.absorb(&candidates);
        Ok(())
    }

    /// Removes `item.quantity` units of `item` from every occurrence of `assembly`.
    ///
    /// A child whose quantity drops to zero is detached. An embedded assembly
    /// left without children becomes a part; a standalone tree left without
    /// children is deleted.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_part(&mut self, assembly: &str, item: &Item) -> RuleResult<()> {
        let targets = self.resolve_assembly(assembly)?;
        if item.quantity == 0 {
            return Err(RuleViolation::ZeroQuantity {
                name: item.name().to_string(),
            });
        }

        let not_contained = || RuleViolation::NotContained {
            assembly: assembly.to_string(),
            name: item.name().to_string(),
        };
        let first = &targets[0];
        let tree = self.tree_of(first).ok_or_else(not_contained)?;
        let child = tree
            .child_named(first.node, item.name())
            .and_then(|idx| tree.get(idx).map(|node| (idx, node)));
        let (child_idx, child) = child.ok_or_else(not_contained)?;
        if child.quantity() < item.quantity {
            return Err(RuleViolation::InsufficientQuantity {
                assembly: assembly.to_string(),
                name: item.name().to_string(),
                quantity: item.quantity,
            });
        }
        let vanishes = child.quantity() == item.quantity;
        let orphan = if vanishes && !child.is_leaf() {
            tree.snapshot(child_idx)
        } else {
            None
        };

        for target in &targets {
            let Some(child) = self
                .tree_of(target)
                .and_then(|tree| tree.child_named(target.node, item.name()))
            else {
                continue;
            };

            if !vanishes {
                if let Some(tree) = self.trees.get_mut(&target.tree) {
                    let remaining = tree
                        .get(child)
                        .map_or(0, |n| n.quantity().saturating_sub(item.quantity));
                    tree.set_quantity(child, remaining);
                }
                continue;
            }

            self.unindex_subtree(&target.tree, child);
            let Some(tree) = self.trees.get_mut(&target.tree) else {
                continue;
            };
            tree.detach(child);
            let emptied = tree.get(target.node).is_some_and(Node::is_leaf);
            if emptied && tree.root() == target.node {
                debug!("last child of {} removed, deleting tree", target.tree);
                self.remove_tree(&target.tree);
            } else {
                self.reclassify(target);
            }
        }

        self.preserve_orphans(orphan.into_iter().collect());
        Ok(())
    }

    /// Dissolves an assembly.
    ///
    /// Embedded occurrences lose their children and become parts. A
    /// standalone tree is deleted. Sub-assemblies that no longer occur
    /// anywhere survive as standalone trees with quantity 1.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_assembly(&mut self, name: &str) -> RuleResult<()> {
        let embedded = self.assemblies.occurrences(name);
        let (targets, is_tree) = if !embedded.is_empty() {
            (embedded, false)
        } else if let Some(tree) = self.trees.get(name) {
            (vec![NodeRef::new(name, tree.root())], true)
        } else {
            return Err(RuleViolation::NoSuchAssembly(name.to_string()));
        };

        let orphans = self.sub_assemblies(&targets[0]);

        if is_tree {
            self.remove_tree(name);
        } else {
            for target in &targets {
                let children = self
                    .node(target)
                    .map(|n| n.children.clone())
                    .unwrap_or_default();
                for child in children {
                    self.unindex_subtree(&target.tree, child);
                }
                if let Some(tree) = self.trees.get_mut(&target.tree) {
                    tree.delete_children(target.node);
                }
                self.reclassify(target);
            }
        }

        self.preserve_orphans(orphans);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// `COMPONENT` for a part, otherwise the direct children sorted by name.
    #[instrument(level = "debug", skip(self))]
    pub fn print_assembly(&self, name: &str) -> RuleResult<Outcome> {
        if self.parts.contains_name(name) {
            return Ok(Outcome::Component);
        }
        let (tree, idx) = self
            .locate_assembly(name)
            .map_err(|_| RuleViolation::NotFound(name.to_string()))?;
        let entries: Vec<Entry> = tree
            .get(idx)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|&c| tree.get(c))
                    .map(|child| Entry::new(child.name(), u64::from(child.quantity())))
                    .sorted_by(|a, b| a.name.cmp(&b.name))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Outcome::Listing(entries))
    }

    /// Sub-assemblies with effective quantities, or `EMPTY` if every child is a part.
    #[instrument(level = "debug", skip(self))]
    pub fn get_assemblies(&self, name: &str) -> RuleResult<Outcome> {
        let (tree, idx) = self.locate_assembly(name)?;
        let only_parts = tree.get(idx).is_some_and(|node| {
            node.children
                .iter()
                .all(|&c| tree.get(c).map_or(true, Node::is_leaf))
        });
        if only_parts {
            return Ok(Outcome::Empty);
        }
        let entries = DescendantAggregator::new(tree, DescendantFilter::Internal).aggregate(idx);
        Ok(Outcome::Listing(entries))
    }

    /// Components with effective quantities.
    #[instrument(level = "debug", skip(self))]
    pub fn get_components(&self, name: &str) -> RuleResult<Outcome> {
        let (tree, idx) = self.locate_assembly(name)?;
        let entries = DescendantAggregator::new(tree, DescendantFilter::Leaves).aggregate(idx);
        Ok(Outcome::Listing(entries))
    }

    /// Full structure below `name` as an indented tree.
    #[instrument(level = "debug", skip(self))]
    pub fn render_tree(&self, name: &str) -> RuleResult<String> {
        let located = self.locate_assembly(name).ok().or_else(|| {
            let part = self.parts.occurrences(name).into_iter().next()?;
            Some((self.tree_of(&part)?, part.node))
        });
        let (tree, idx) = located.ok_or_else(|| RuleViolation::NotFound(name.to_string()))?;
        Ok(tree.to_tree_string(idx).to_string())
    }

    /// Names of all standalone trees, sorted.
    pub fn tree_names(&self) -> Vec<&str> {
        self.trees.keys().map(String::as_str).collect()
    }

    pub fn tree(&self, name: &str) -> Option<&Tree> {
        self.trees.get(name)
    }

    pub fn node(&self, at: &NodeRef) -> Option<&Node> {
        self.tree_of(at)?.get(at.node)
    }

    pub fn is_assembly(&self, name: &str) -> bool {
        self.trees.contains_key(name) || self.assemblies.contains_name(name)
    }

    pub fn is_part(&self, name: &str) -> bool {
        self.parts.contains_name(name)
    }

    /// Every node carrying `name`: tree root, embedded assemblies and parts.
    pub fn occurrences(&self, name: &str) -> Vec<NodeRef> {
        let mut found = Vec::new();
        if let Some(tree) = self.trees.get(name) {
            found.push(NodeRef::new(name, tree.root()));
        }
        found.extend(self.assemblies.occurrences(name));
        found.extend(self.parts.occurrences(name));
        found
    }

    /// Verifies the forest invariants: every node is classified exactly
    /// once, carries its tree's id, has uniquely named children and is not
    /// its own ancestor. Each name holds a single role.
    pub fn check_consistency(&self) -> Result<(), Inconsistency> {
        let mut classified = 0;
        for (id, tree) in &self.trees {
            if tree.id() != id {
                return Err(Inconsistency::MisplacedTree {
                    key: id.clone(),
                    id: tree.id().to_string(),
                });
            }
            if self.assemblies.contains_name(id) || self.parts.contains_name(id) {
                return Err(Inconsistency::ConflictingRoles { name: id.clone() });
            }
            for (idx, node) in tree.iter() {
                let at = NodeRef::new(id.as_str(), idx);
                if node.tree_id != *id {
                    return Err(Inconsistency::ForeignNode {
                        name: node.name().to_string(),
                        tree_id: node.tree_id.clone(),
                        tree: id.clone(),
                    });
                }
                if tree.ancestors(idx).len() >= tree.len() {
                    return Err(Inconsistency::SelfAncestor {
                        name: node.name().to_string(),
                        tree: id.clone(),
                    });
                }
                let mut names = HashSet::new();
                for &child in &node.children {
                    if let Some(child) = tree.get(child) {
                        if !names.insert(child.name()) {
                            return Err(Inconsistency::DuplicateChild {
                                parent: node.name().to_string(),
                                name: child.name().to_string(),
                            });
                        }
                    }
                }

                let in_parts = self.parts.contains(node.name(), &at);
                let in_assemblies = self.assemblies.contains(node.name(), &at);
                let expected = if idx == tree.root() {
                    !in_parts && !in_assemblies
                } else if node.is_leaf() {
                    in_parts && !in_assemblies
                } else {
                    in_assemblies && !in_parts
                };
                if !expected {
                    return Err(Inconsistency::Misclassified {
                        name: node.name().to_string(),
                        tree: id.clone(),
                    });
                }
                if idx != tree.root() {
                    classified += 1;
                }
            }
        }
        if let Some(name) = self.parts.names().find(|&n| self.assemblies.contains_name(n)) {
            return Err(Inconsistency::ConflictingRoles {
                name: name.to_string(),
            });
        }
        let indexed = self.parts.len() + self.assemblies.len();
        if indexed != classified {
            return Err(Inconsistency::IndexSize {
                indexed,
                nodes: classified,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn tree_of(&self, at: &NodeRef) -> Option<&Tree> {
        self.trees.get(&at.tree)
    }

    /// All occurrences of an assembly; a standalone tree has exactly one.
    fn resolve_assembly(&self, name: &str) -> RuleResult<Vec<NodeRef>> {
        let targets = match self.trees.get(name) {
            Some(tree) => vec![NodeRef::new(name, tree.root())],
            None => self.assemblies.occurrences(name),
        };
        if targets.is_empty() || targets.iter().any(|t| self.node(t).is_none()) {
            return Err(RuleViolation::NoSuchAssembly(name.to_string()));
        }
        Ok(targets)
    }

    fn locate_assembly(&self, name: &str) -> RuleResult<(&Tree, Index)> {
        let target = self
            .resolve_assembly(name)?
            .into_iter()
            .next()
            .ok_or_else(|| RuleViolation::NoSuchAssembly(name.to_string()))?;
        let tree = self
            .tree_of(&target)
            .ok_or_else(|| RuleViolation::NoSuchAssembly(name.to_string()))?;
        Ok((tree, target.node))
    }

    fn check_quantity(&self, item: &Item) -> RuleResult<()> {
        if item.quantity == 0 {
            return Err(RuleViolation::ZeroQuantity {
                name: item.name().to_string(),
            });
        }
        if item.quantity > self.max_quantity {
            return Err(RuleViolation::QuantityExceeded {
                max: self.max_quantity,
            });
        }
        Ok(())
    }

    /// What attaching `item` means: a copy of an existing tree or assembly,
    /// or a plain part.
    fn candidate(&self, item: &Item) -> Candidate {
        if let Some(subtree) = self
            .trees
            .get(item.name())
            .and_then(|tree| tree.snapshot(tree.root()))
        {
            return Candidate {
                subtree: subtree.with_quantity(item.quantity),
                absorbs: Some(item.name().to_string()),
            };
        }
        let existing = self
            .assemblies
            .occurrences(item.name())
            .first()
            .and_then(|at| self.tree_of(at)?.snapshot(at.node));
        Candidate {
            subtree: existing
                .map(|subtree| subtree.with_quantity(item.quantity))
                .unwrap_or_else(|| Subtree::leaf(item.clone())),
            absorbs: None,
        }
    }

    fn check_cycles(&self, targets: &[NodeRef], candidates: &[Candidate]) -> RuleResult<()> {
        for target in targets {
            let Some(tree) = self.tree_of(target) else {
                continue;
            };
            for candidate in candidates {
                tree.check_attach(target.node, &candidate.subtree)
                    .map_err(RuleViolation::Cycle)?;
            }
        }
        Ok(())
    }

    fn increase_quantity(&mut self, targets: &[NodeRef], item: &Item) -> RuleResult<()> {
        let mut updates = Vec::with_capacity(targets.len());
        for target in targets {
            let Some(tree) = self.tree_of(target) else {
                continue;
            };
            let Some(child) = tree.child_named(target.node, item.name()) else {
                continue;
            };
            let current = tree.get(child).map_or(0, Node::quantity);
            let total = current.saturating_add(item.quantity);
            if total > self.max_quantity {
                return Err(RuleViolation::QuantityExceeded {
                    max: self.max_quantity,
                });
            }
            updates.push((target.tree.clone(), child, total));
        }
        for (tree_id, child, total) in updates {
            if let Some(tree) = self.trees.get_mut(&tree_id) {
                tree.set_quantity(child, total);
            }
        }
        Ok(())
    }

    /// Attaches a fresh copy of every candidate below `target`.
    fn attach_all(&mut self, target: &NodeRef, candidates: &[Candidate]) {
        let Some(tree) = self.trees.get_mut(&target.tree) else {
            return;
        };
        let attached: Vec<Index> = candidates
            .iter()
            .filter_map(|c| tree.attach(target.node, &c.subtree))
            .collect();
        for idx in attached {
            self.index_subtree(&target.tree, idx);
        }
        self.reclassify(target);
    }

    /// Deletes standalone trees that were copied into another tree.
    fn absorb(&mut self, candidates: &[Candidate]) {
        for name in candidates.iter().filter_map(|c| c.absorbs.as_deref()) {
            debug!("tree {} absorbed", name);
            self.remove_tree(name);
        }
    }

    fn remove_tree(&mut self, name: &str) -> Option<Tree> {
        let root = self.trees.get(name)?.root();
        self.unindex_subtree(name, root);
        self.trees.remove(name)
    }

    /// Copies of the non-leaf children of `at`.
    fn sub_assemblies(&self, at: &NodeRef) -> Vec<Subtree> {
        let Some(tree) = self.tree_of(at) else {
            return Vec::new();
        };
        tree.get(at.node)
            .map(|node| {
                node.children
                    .iter()
                    .filter(|&&c| tree.get(c).is_some_and(|n| !n.is_leaf()))
                    .filter_map(|&c| tree.snapshot(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Turns assemblies that vanished from the forest into standalone trees.
    ///
    /// An orphan embedded in another orphan stays embedded there and never
    /// becomes a tree of its own.
    fn preserve_orphans(&mut self, orphans: Vec<Subtree>) {
        let mut seen = HashSet::new();
        let survivors: Vec<&Subtree> = orphans
            .iter()
            .filter(|orphan| {
                let name = orphan.root().name();
                !orphans
                    .iter()
                    .any(|other| other.position_of(name).is_some_and(|p| p > 0))
            })
            .filter(|orphan| seen.insert(orphan.root().name()))
            .collect();

        for orphan in survivors {
            let name = orphan.root().name().to_string();
            if self.is_assembly(&name) || self.is_part(&name) || self.trees.contains_key(&name) {
                continue;
            }
            let tree = Tree::from_subtree(&orphan.clone().with_quantity(1));
            let root = tree.root();
            self.trees.insert(name.clone(), tree);
            self.index_subtree(&name, root);
            debug!("assembly {} kept as standalone tree", name);
        }
    }

    /// Indexes every non-root node below and including `idx`.
    fn index_subtree(&mut self, tree_id: &str, idx: Index) {
        for (name, node, leaf) in self.subtree_entries(tree_id, idx) {
            let at = NodeRef::new(tree_id, node);
            if leaf {
                self.parts.insert(&name, at);
            } else {
                self.assemblies.insert(&name, at);
            }
        }
    }

    fn unindex_subtree(&mut self, tree_id: &str, idx: Index) {
        for (name, node, _) in self.subtree_entries(tree_id, idx) {
            let at = NodeRef::new(tree_id, node);
            self.parts.remove(&name, &at);
            self.assemblies.remove(&name, &at);
        }
    }

    fn subtree_entries(&self, tree_id: &str, idx: Index) -> Vec<(String, Index, bool)> {
        let Some(tree) = self.trees.get(tree_id) else {
            return Vec::new();
        };
        let root = tree.root();
        tree.iter_from(idx)
            .filter(|(i, _)| *i != root)
            .map(|(i, node)| (node.name().to_string(), i, node.is_leaf()))
            .collect()
    }

    /// Re-files a single node after its children changed.
    fn reclassify(&mut self, at: &NodeRef) {
        let Some(tree) = self.tree_of(at) else {
            return;
        };
        let is_root = tree.root() == at.node;
        let Some(node) = tree.get(at.node) else {
            return;
        };
        let name = node.name().to_string();
        let leaf = node.is_leaf();

        self.parts.remove(&name, at);
        self.assemblies.remove(&name, at);
        if is_root {
            return;
        }
        if leaf {
            self.parts.insert(&name, at.clone());
        } else {
            self.assemblies.insert(&name, at.clone());
        }
    }
}
