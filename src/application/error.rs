//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::RuleViolation;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Rule(#[from] RuleViolation),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Broken forest invariant found by [`Registry::check_consistency`].
///
/// [`Registry::check_consistency`]: crate::application::Registry::check_consistency
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("tree {id} is keyed as {key}")]
    MisplacedTree { key: String, id: String },

    #[error("{name} carries tree id {tree_id} inside {tree}")]
    ForeignNode {
        name: String,
        tree_id: String,
        tree: String,
    },

    #[error("{name} is its own ancestor in {tree}")]
    SelfAncestor { name: String, tree: String },

    #[error("{parent} has duplicate child {name}")]
    DuplicateChild { parent: String, name: String },

    #[error("{name} in {tree} is misclassified")]
    Misclassified { name: String, tree: String },

    #[error("{indexed} indexed nodes but {nodes} in trees")]
    IndexSize { indexed: usize, nodes: usize },

    #[error("{name} has more than one role in the forest")]
    ConflictingRoles { name: String },
}
