use generational_arena::Index;
use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::arena::Tree;

/// Conversion into a printable `termtree` for display.
pub trait TreeNodeConvert {
    fn to_tree_string(&self, start: Index) -> TermTree<String>;
}

impl TreeNodeConvert for Tree {
    /// Labels are `name:quantity`; the start node shows its name only.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, start: Index) -> TermTree<String> {
        let Some(subtree) = self.snapshot(start) else {
            return TermTree::new("Empty tree".to_string());
        };
        let nodes = subtree.nodes();

        // Pre-order puts every child after its parent, so building in reverse
        // finishes all children before their parent takes them.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (pos, node) in nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                children[parent].push(pos);
            }
        }
        let mut built: Vec<Option<TermTree<String>>> = (0..nodes.len()).map(|_| None).collect();
        for pos in (0..nodes.len()).rev() {
            let label = if pos == 0 {
                nodes[pos].item.name().to_string()
            } else {
                nodes[pos].item.to_string()
            };
            let mut term = TermTree::new(label);
            for &child in &children[pos] {
                if let Some(child_tree) = built[child].take() {
                    term.push(child_tree);
                }
            }
            built[pos] = Some(term);
        }

        built
            .first_mut()
            .and_then(Option::take)
            .unwrap_or_else(|| TermTree::new("Empty tree".to_string()))
    }
}
