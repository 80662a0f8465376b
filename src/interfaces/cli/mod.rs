//! CLI interface module
//!
//! A line-oriented REPL over the link registry. Parsing is pure
//! ([`parse_command`]), execution writes to any `io::Write`, so both are
//! testable without a terminal.

pub mod notifier;
pub mod parser;
pub mod render;
pub mod repl;
pub mod session;

use std::fmt;

use crate::errors::QuotalinkError;

pub use notifier::{ConsoleNotifier, SharedWriter};
pub use parser::{Command, parse_command};
pub use repl::run_repl;
pub use session::{Flow, Session};

#[derive(Debug)]
pub enum CliError {
    ParseError(String),
    CommandError(String),
    IoError(String),
    Service(QuotalinkError),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
            CliError::IoError(msg) => format!("I/O error: {}", msg),
            CliError::Service(err) => err.format_simple(),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
            CliError::IoError(msg) => format!("{} {}", "I/O error:".red().bold(), msg.white()),
            CliError::Service(err) => err.format_colored(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<QuotalinkError> for CliError {
    fn from(err: QuotalinkError) -> Self {
        CliError::Service(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError(err.to_string())
    }
}
