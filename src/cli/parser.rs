//! Line grammar of the interactive shell
//!
//! ```text
//! addAssembly A=2:B;3:C
//! addPart A+2:B
//! removePart A-2:B
//! removeAssembly A | printAssembly A | getAssemblies A | getComponents A | showTree A
//! quit
//! ```

use regex::Regex;
use tracing::{instrument, trace};

use crate::application::{Operation, Request};
use crate::cli::error::{CliError, CliResult};
use crate::domain::Item;

const NAME: &str = "[A-Za-z]+";
const AMOUNT: &str = "[0-9]{1,4}";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Execute(Request),
}

/// Validates shell lines and turns them into requests.
#[derive(Debug)]
pub struct CommandParser {
    quit_command: String,
    name: Regex,
    add_assembly: Regex,
    add_part: Regex,
    remove_part: Regex,
}

impl CommandParser {
    pub fn new(quit_command: impl Into<String>) -> CliResult<Self> {
        let child = format!("{AMOUNT}:{NAME}");
        Ok(Self {
            quit_command: quit_command.into(),
            name: Regex::new(&format!("^{NAME}$"))?,
            add_assembly: Regex::new(&format!("^({NAME})=({child}(?:;{child})*)$"))?,
            add_part: Regex::new(&format!(r"^({NAME})\+({AMOUNT}):({NAME})$"))?,
            remove_part: Regex::new(&format!("^({NAME})-({AMOUNT}):({NAME})$"))?,
        })
    }

    pub fn quit_command(&self) -> &str {
        &self.quit_command
    }

    #[instrument(level = "trace", skip(self))]
    pub fn parse(&self, line: &str) -> CliResult<Command> {
        if line == self.quit_command {
            return Ok(Command::Quit);
        }
        let (word, argument) = line
            .split_once(' ')
            .ok_or_else(|| wrong_format(line))?;
        let operation: Operation = word.parse().map_err(CliError::InvalidInput)?;
        trace!("operation {} with argument {:?}", operation, argument);

        let request = match operation {
            Operation::AddAssembly => self.parse_add_assembly(argument)?,
            Operation::AddPart => {
                let (assembly, item) = self.parse_change(&self.add_part, argument)?;
                Request::AddPart { assembly, item }
            }
            Operation::RemovePart => {
                let (assembly, item) = self.parse_change(&self.remove_part, argument)?;
                Request::RemovePart { assembly, item }
            }
            Operation::RemoveAssembly => Request::RemoveAssembly {
                name: self.parse_name(argument)?,
            },
            Operation::PrintAssembly => Request::PrintAssembly {
                name: self.parse_name(argument)?,
            },
            Operation::GetAssemblies => Request::GetAssemblies {
                name: self.parse_name(argument)?,
            },
            Operation::GetComponents => Request::GetComponents {
                name: self.parse_name(argument)?,
            },
            Operation::ShowTree => Request::ShowTree {
                name: self.parse_name(argument)?,
            },
        };
        Ok(Command::Execute(request))
    }

    fn parse_name(&self, argument: &str) -> CliResult<String> {
        if self.name.is_match(argument) {
            Ok(argument.to_string())
        } else {
            Err(wrong_format(argument))
        }
    }

    fn parse_add_assembly(&self, argument: &str) -> CliResult<Request> {
        let captures = self
            .add_assembly
            .captures(argument)
            .ok_or_else(|| wrong_format(argument))?;
        let children = captures[2]
            .split(';')
            .map(|child| -> CliResult<Item> {
                let (amount, name) = child.split_once(':').ok_or_else(|| wrong_format(child))?;
                Ok(Item::new(name, parse_amount(amount)?))
            })
            .collect::<CliResult<Vec<_>>>()?;
        Ok(Request::AddAssembly {
            name: captures[1].to_string(),
            children,
        })
    }

    fn parse_change(&self, pattern: &Regex, argument: &str) -> CliResult<(String, Item)> {
        let captures = pattern
            .captures(argument)
            .ok_or_else(|| wrong_format(argument))?;
        let item = Item::new(&captures[3], parse_amount(&captures[2])?);
        Ok((captures[1].to_string(), item))
    }
}

fn parse_amount(amount: &str) -> CliResult<u32> {
    amount
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("not an amount: {amount}")))
}

fn wrong_format(input: &str) -> CliError {
    CliError::InvalidInput(format!("wrong input format: {input}"))
}
