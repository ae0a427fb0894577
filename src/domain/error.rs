//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::cycle::CyclePath;

/// Rule violations are recoverable business-rule failures.
/// A failed operation leaves the forest exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("an assembly of this name already exists")]
    AssemblyExists(String),

    #[error("no BOM exists in the system for the specified name: {0}.")]
    NoSuchAssembly(String),

    #[error("no BOM or component exists in the system for the specified name: {0}.")]
    NotFound(String),

    #[error("this addition would cause a cycle: {0}")]
    Cycle(CyclePath),

    #[error("the amount of a part/assembly cannot exceed {max}.")]
    QuantityExceeded { max: u32 },

    #[error("the amount of a part/assembly must be at least 1: {name}")]
    ZeroQuantity { name: String },

    #[error("an item may only be listed once per request: {0}")]
    DuplicateInRequest(String),

    #[error("an assembly must consist of at least one item: {0}")]
    EmptyAssembly(String),

    #[error("{assembly} doesn't contain {name}.")]
    NotContained { assembly: String, name: String },

    #[error("{assembly} doesn't contain {name} in the specified amount: {quantity}.")]
    InsufficientQuantity {
        assembly: String,
        name: String,
        quantity: u32,
    },
}

/// Result type for forest operations.
pub type RuleResult<T> = Result<T, RuleViolation>;
