//! Validated requests against the forest and their outcomes.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::domain::{Entry, Item};

/// The operations the forest understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddAssembly,
    AddPart,
    RemovePart,
    RemoveAssembly,
    PrintAssembly,
    GetAssemblies,
    GetComponents,
    ShowTree,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::AddAssembly,
        Operation::AddPart,
        Operation::RemovePart,
        Operation::RemoveAssembly,
        Operation::PrintAssembly,
        Operation::GetAssemblies,
        Operation::GetComponents,
        Operation::ShowTree,
    ];

    /// Command word used by the line-oriented shell.
    pub fn command(self) -> &'static str {
        match self {
            Operation::AddAssembly => "addAssembly",
            Operation::AddPart => "addPart",
            Operation::RemovePart => "removePart",
            Operation::RemoveAssembly => "removeAssembly",
            Operation::PrintAssembly => "printAssembly",
            Operation::GetAssemblies => "getAssemblies",
            Operation::GetComponents => "getComponents",
            Operation::ShowTree => "showTree",
        }
    }

    /// Whether the operation changes the forest.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::AddAssembly
                | Operation::AddPart
                | Operation::RemovePart
                | Operation::RemoveAssembly
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.command() == s)
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

/// An already validated request with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AddAssembly { name: String, children: Vec<Item> },
    AddPart { assembly: String, item: Item },
    RemovePart { assembly: String, item: Item },
    RemoveAssembly { name: String },
    PrintAssembly { name: String },
    GetAssemblies { name: String },
    GetComponents { name: String },
    ShowTree { name: String },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::AddAssembly { .. } => Operation::AddAssembly,
            Request::AddPart { .. } => Operation::AddPart,
            Request::RemovePart { .. } => Operation::RemovePart,
            Request::RemoveAssembly { .. } => Operation::RemoveAssembly,
            Request::PrintAssembly { .. } => Operation::PrintAssembly,
            Request::GetAssemblies { .. } => Operation::GetAssemblies,
            Request::GetComponents { .. } => Operation::GetComponents,
            Request::ShowTree { .. } => Operation::ShowTree,
        }
    }
}

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A mutation went through
    Ok,
    /// The queried name is a leaf
    Component,
    /// The queried assembly has no sub-assemblies
    Empty,
    Listing(Vec<Entry>),
    Rendered(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => f.write_str("OK"),
            Outcome::Component => f.write_str("COMPONENT"),
            Outcome::Empty => f.write_str("EMPTY"),
            Outcome::Listing(entries) => write!(f, "{}", entries.iter().join(";")),
            Outcome::Rendered(text) => f.write_str(text.trim_end()),
        }
    }
}
