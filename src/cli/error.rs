//! CLI-level errors (wraps application errors)

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::RuleViolation;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// A command line did not match the grammar
    #[error("{0}")]
    InvalidInput(String),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid command pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{failed} of {total} command(s) failed")]
    Session { failed: usize, total: usize },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<RuleViolation> for CliError {
    fn from(e: RuleViolation) -> Self {
        CliError::Application(e.into())
    }
}

impl CliError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput(_) | CliError::Session { .. } => crate::exitcode::DATAERR,
            CliError::Io { .. } => crate::exitcode::IOERR,
            CliError::Pattern(_) => crate::exitcode::SOFTWARE,
            CliError::Application(e) => match e {
                ApplicationError::Rule(_) => crate::exitcode::DATAERR,
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
            },
        }
    }
}

/// Extension trait for converting `io::Result` to `CliResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// File::open(&path).with_path_context("open command file", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> CliResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> CliResult<T> {
        self.map_err(|e| CliError::io(format!("{}: {}", action, path.display()), e))
    }
}
