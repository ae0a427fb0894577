//! Command dispatch for the `bomforest` binary

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult, IoResultExt};
use crate::cli::output;
use crate::cli::session::Session;
use crate::config::{global_config_path, Settings};

pub fn execute_command(cli: &Cli, settings: &Settings) -> CliResult<()> {
    match &cli.command {
        None => run_commands(None, false, settings),
        Some(Commands::Run { file, strict }) => run_commands(file.as_deref(), *strict, settings),
        Some(Commands::Config { command }) => config_command(command, settings),
        Some(Commands::Completion { shell }) => {
            print_completions(*shell);
            Ok(())
        }
    }
}

#[instrument(skip(settings))]
fn run_commands(file: Option<&Path>, strict: bool, settings: &Settings) -> CliResult<()> {
    let mut session = Session::new(settings)?;
    let stdout = io::stdout();
    let stderr = io::stderr();

    let report = match file {
        Some(path) => {
            let input = File::open(path).with_path_context("open command file", path)?;
            session.run(BufReader::new(input), &mut stdout.lock(), &mut stderr.lock())?
        }
        None => session.run(io::stdin().lock(), &mut stdout.lock(), &mut stderr.lock())?,
    };
    debug!("report: {:?}", report);

    if strict && report.failed > 0 {
        return Err(CliError::Session {
            failed: report.failed,
            total: report.total,
        });
    }
    Ok(())
}

#[instrument(skip(settings))]
fn config_command(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
