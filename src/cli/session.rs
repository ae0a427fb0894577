//! Line-oriented command session over a single forest

use std::io::{BufRead, Write};

use tracing::{debug, info, instrument};

use crate::application::Registry;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::parser::{Command, CommandParser};
use crate::config::Settings;

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Commands read, quit excluded
    pub total: usize,
    pub failed: usize,
    /// Whether the session ended through the quit command
    pub quit: bool,
}

/// Parser plus the forest it drives. Errors never end a session.
#[derive(Debug)]
pub struct Session {
    registry: Registry,
    parser: CommandParser,
}

impl Session {
    pub fn new(settings: &Settings) -> CliResult<Self> {
        Ok(Self {
            registry: Registry::with_max_quantity(settings.max_quantity),
            parser: CommandParser::new(settings.quit_command.clone())?,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs one line. `None` means the quit command was given.
    #[instrument(level = "debug", skip(self))]
    pub fn handle_line(&mut self, line: &str) -> CliResult<Option<String>> {
        match self.parser.parse(line)? {
            Command::Quit => Ok(None),
            Command::Execute(request) => Ok(Some(self.registry.execute(request)?)),
        }
    }

    /// Reads commands until end of input or quit.
    ///
    /// Results go to `out`, failures to `err` as `Error, <message>`.
    /// Blank lines are skipped.
    pub fn run<R, W, E>(&mut self, input: R, out: &mut W, err: &mut E) -> CliResult<SessionReport>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        let mut report = SessionReport::default();
        for line in input.lines() {
            let line = line.map_err(|e| CliError::io("read command", e))?;
            if line.trim().is_empty() {
                continue;
            }
            match self.handle_line(&line) {
                Ok(None) => {
                    report.quit = true;
                    break;
                }
                Ok(Some(result)) => {
                    report.total += 1;
                    output::result(out, &result).map_err(|e| CliError::io("write result", e))?;
                }
                Err(e) => {
                    report.total += 1;
                    report.failed += 1;
                    debug!("command failed: {}", e);
                    output::error(err, &e).map_err(|e| CliError::io("write error", e))?;
                }
            }
        }
        out.flush().map_err(|e| CliError::io("flush output", e))?;
        info!(
            "session finished: {} command(s), {} failed",
            report.total, report.failed
        );
        Ok(report)
    }
}
