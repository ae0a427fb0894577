use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::cycle::{CycleChecker, CyclePath};
use crate::domain::item::Item;

/// Tree node in the arena-based BOM structure.
#[derive(Debug, Clone)]
pub struct Node {
    /// Name and occurrence quantity
    pub item: Item,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
    /// Name of the root of the tree this node lives in
    pub tree_id: String,
}

impl Node {
    pub fn name(&self) -> &str {
        self.item.name()
    }

    pub fn quantity(&self) -> u32 {
        self.item.quantity
    }

    /// Components are leaves, assemblies are not.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// One entry of a [`Subtree`]; `parent` is a position inside the same subtree.
#[derive(Debug, Clone)]
pub struct SubtreeNode {
    pub item: Item,
    pub parent: Option<usize>,
}

/// Detached, owned copy of a subtree in pre-order.
///
/// Position 0 is the subtree root and every node appears after its parent.
/// A subtree never shares anything with the tree it was taken from, so
/// attaching it anywhere always produces fresh nodes.
#[derive(Debug, Clone)]
pub struct Subtree {
    nodes: Vec<SubtreeNode>,
}

impl Subtree {
    pub fn leaf(item: Item) -> Self {
        Self {
            nodes: vec![SubtreeNode { item, parent: None }],
        }
    }

    pub fn root(&self) -> &Item {
        &self.nodes[0].item
    }

    /// Rewrites the quantity of the subtree root for a new occurrence.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.nodes[0].item.quantity = quantity;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SubtreeNode] {
        &self.nodes
    }

    /// Position of the first node (pre-order) carrying `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.item.name() == name)
    }

    /// Names from the subtree root down to `position`, both inclusive.
    pub fn path_to(&self, position: usize) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(position);
        while let Some(pos) = current {
            let Some(node) = self.nodes.get(pos) else {
                break;
            };
            path.push(node.item.name().to_string());
            current = node.parent;
        }
        path.reverse();
        path
    }
}

/// A single BOM tree backed by a generational arena.
///
/// The tree owns every node; parent links are plain indices and never keep a
/// node alive. The tree id is the name of the root item.
#[derive(Debug)]
pub struct Tree {
    /// Arena storage for all tree nodes
    arena: Arena<Node>,
    /// Index of the root node
    root: Index,
}

impl Tree {
    pub fn new(item: Item) -> Self {
        let mut arena = Arena::new();
        let tree_id = item.name().to_string();
        let root = arena.insert(Node {
            item,
            parent: None,
            children: Vec::new(),
            tree_id,
        });
        Self { arena, root }
    }

    /// Builds a standalone tree whose root is the subtree root.
    #[instrument(level = "trace")]
    pub fn from_subtree(subtree: &Subtree) -> Self {
        let mut tree = Self::new(subtree.root().clone());
        let root = tree.root;
        tree.insert_below(root, subtree);
        tree
    }

    /// Name of the root, which identifies the tree.
    pub fn id(&self) -> &str {
        self.arena
            .get(self.root)
            .map(|n| n.tree_id.as_str())
            .unwrap_or_default()
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, idx: Index) -> Option<&Node> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn set_quantity(&mut self, idx: Index, quantity: u32) -> bool {
        match self.arena.get_mut(idx) {
            Some(node) => {
                node.item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Direct child of `parent` named `name`.
    pub fn child_named(&self, parent: Index, name: &str) -> Option<Index> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).is_some_and(|n| n.name() == name))
    }

    /// Ancestors of `idx`, immediate parent first and root last.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut ancestors = Vec::new();
        let mut current = self.get(idx).and_then(|n| n.parent);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.get(parent).and_then(|n| n.parent);
        }
        ancestors
    }

    /// Every node named `name`, in pre-order.
    pub fn find_all(&self, name: &str) -> Vec<Index> {
        self.iter()
            .filter(|(_, node)| node.name() == name)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Deep copy of the subtree rooted at `idx`.
    #[instrument(level = "trace", skip(self))]
    pub fn snapshot(&self, idx: Index) -> Option<Subtree> {
        self.get(idx)?;
        let mut nodes = Vec::new();
        let mut stack = vec![(idx, None)];

        while let Some((current, parent)) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            let position = nodes.len();
            nodes.push(SubtreeNode {
                item: node.item.clone(),
                parent,
            });
            // Push children in reverse order for left-to-right traversal
            for &child in node.children.iter().rev() {
                stack.push((child, Some(position)));
            }
        }

        Some(Subtree { nodes })
    }

    /// Decides whether attaching `candidate` below `parent` keeps the tree acyclic.
    pub fn check_attach(&self, parent: Index, candidate: &Subtree) -> Result<(), CyclePath> {
        match CycleChecker::new(self).check(parent, candidate) {
            Some(path) => Err(path),
            None => Ok(()),
        }
    }

    /// Attaches a fresh copy of `subtree` as the last child of `parent`.
    ///
    /// Every inserted node is stamped with this tree's id. Returns the index
    /// of the new subtree root, or None if `parent` is not in this tree.
    #[instrument(level = "trace", skip(self, subtree), fields(root = subtree.root().name()))]
    pub fn attach(&mut self, parent: Index, subtree: &Subtree) -> Option<Index> {
        self.get(parent)?;
        let first = self.insert_child(parent, subtree.root().clone());
        self.insert_below(first, subtree);
        Some(first)
    }

    /// Removes the subtree rooted at `idx` and hands back its copy.
    ///
    /// The root cannot be detached; delete the whole tree instead.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) -> Option<Subtree> {
        if idx == self.root {
            return None;
        }
        let subtree = self.snapshot(idx)?;
        let doomed: Vec<Index> = self.iter_from(idx).map(|(i, _)| i).collect();

        if let Some(parent) = self.get(idx).and_then(|n| n.parent) {
            if let Some(parent_node) = self.arena.get_mut(parent) {
                parent_node.children.retain(|&c| c != idx);
            }
        }
        for i in doomed {
            self.arena.remove(i);
        }
        Some(subtree)
    }

    /// Detaches every child of `idx`, turning it into a leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn delete_children(&mut self, idx: Index) -> Vec<Subtree> {
        let children = self
            .get(idx)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        children
            .into_iter()
            .filter_map(|child| self.detach(child))
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order iteration over the subtree rooted at `idx`.
    pub fn iter_from(&self, idx: Index) -> TreeIterator {
        TreeIterator::new(self, idx)
    }

    fn insert_child(&mut self, parent: Index, item: Item) -> Index {
        let tree_id = self.id().to_string();
        let idx = self.arena.insert(Node {
            item,
            parent: Some(parent),
            children: Vec::new(),
            tree_id,
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(idx);
        }
        idx
    }

    /// Inserts everything below the subtree root, whose copy already lives at `anchor`.
    fn insert_below(&mut self, anchor: Index, subtree: &Subtree) {
        let mut placed = vec![anchor];
        for entry in subtree.nodes().iter().skip(1) {
            let parent = entry.parent.and_then(|p| placed.get(p)).copied();
            let idx = match parent {
                Some(parent) => self.insert_child(parent, entry.item.clone()),
                None => anchor,
            };
            placed.push(idx);
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a Tree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a Tree, start: Index) -> Self {
        let mut stack = Vec::new();
        if tree.get(start).is_some() {
            stack.push(start);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.tree.arena.get(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}
