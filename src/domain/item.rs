//! Items: what a node describes and how many of it there are.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Largest quantity a single occurrence may carry.
pub const MAX_QUANTITY: u32 = 1000;

/// Name and quantity of one occurrence of a part or assembly.
///
/// Identity is the name alone: two items with different quantities but the
/// same name compare equal. The quantity belongs to the occurrence.
#[derive(Debug, Clone, Eq)]
pub struct Item {
    name: String,
    pub quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    /// A freshly introduced item, which exists exactly once.
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same name, different quantity.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self::new(self.name.clone(), quantity)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.quantity)
    }
}
