//! Domain layer: the BOM forest data model and its algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aggregate;
pub mod arena;
pub mod cycle;
pub mod error;
pub mod item;
pub mod tree_traits;

pub use aggregate::{DescendantAggregator, DescendantFilter, Entry};
pub use arena::{Node, Subtree, SubtreeNode, Tree, TreeIterator};
pub use cycle::{find_cycle, CycleChecker, CyclePath};
pub use error::{RuleResult, RuleViolation};
pub use item::{Item, MAX_QUANTITY};
pub use tree_traits::TreeNodeConvert;
