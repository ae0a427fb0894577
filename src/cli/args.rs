//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Bill-of-materials forest: build assemblies from parts and query their composition
#[derive(Parser, Debug)]
#[command(name = "bomforest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read BOM commands line by line (default, stdin without FILE)
    Run {
        /// File with one command per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Exit with a failure code if any command failed
        #[arg(long)]
        strict: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show global config file location
    Path,
    /// Print a commented config template
    Template,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_repeated_debug_flag_when_parsing_then_counts_verbosity() {
        let cli = Cli::parse_from(["bomforest", "-ddd", "run", "bom.txt", "--strict"]);
        assert_eq!(cli.debug, 3);
        match cli.command {
            Some(Commands::Run { file, strict }) => {
                assert_eq!(file, Some(PathBuf::from("bom.txt")));
                assert!(strict);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
