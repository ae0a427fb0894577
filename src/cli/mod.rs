//! CLI layer: argument parsing, the command shell and dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;
pub mod parser;
pub mod session;

pub use args::{Cli, Commands, ConfigCommands};
pub use error::{CliError, CliResult, IoResultExt};
pub use parser::{Command, CommandParser};
pub use session::{Session, SessionReport};
