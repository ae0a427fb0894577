//! Application layer: the forest registry and its request model
//!
//! This layer orchestrates domain logic; it performs no I/O.

pub mod error;
pub mod index;
pub mod registry;
pub mod request;

pub use error::{ApplicationError, ApplicationResult, Inconsistency};
pub use index::{NodeIndex, NodeRef};
pub use registry::Registry;
pub use request::{Operation, Outcome, Request};
