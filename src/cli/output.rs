//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically; the `color`
//! setting can switch colors off on top of that.

use std::fmt::Display;
use std::io::{self, Write};

use colored::Colorize;

/// Write a command result (no color, one result per line)
pub fn result(out: &mut impl Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(out, "{}", msg)
}

/// Write a failed command as `Error, <message>` (red)
pub fn error(err: &mut impl Write, msg: &(impl Display + ?Sized)) -> io::Result<()> {
    writeln!(err, "{}", format!("Error, {}", msg).red())
}

/// Print fatal error (red bold "error:" prefix) to stderr
pub fn fatal(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print plain output (no color, for data such as config dumps)
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
