//! CLI module for envtiers
//!
//! - Argument parsing with clap
//! - Argument validation
//! - Command execution

pub mod executor;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{Cli, Commands, LogFormatArg, OutputFormat};

use crate::logger::init_logger;

/// Initialize the global logger from the CLI flags
pub fn init_logger_from_cli(cli: &Cli) -> anyhow::Result<()> {
    init_logger(cli.logger_config())
}
