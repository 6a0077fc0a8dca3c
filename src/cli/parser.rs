//! CLI argument parsing with clap
//!
//! Defines the `envtiers` command line: global logging and options flags plus
//! the `show` and `check` subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::validation;
use crate::logger::{LogFormat, LoggerConfig};

/// Resolve layered, mode-aware settings
#[derive(Parser, Debug)]
#[command(name = "envtiers")]
#[command(about = "Resolve layered, mode-aware settings")]
#[command(long_about = "
envtiers resolves the settings of a package from up to four tiers:
env, env_local, env_<mode> and env_<mode>_local. Later tiers override
earlier ones key by key. The mode comes from the MODE setting of the
local tier, falling back to the base tier.

EXAMPLES:
    # Print the resolved settings with sensitive values masked
    envtiers show ./deploy settings

    # Force a mode instead of reading MODE
    envtiers show ./deploy settings --mode prod

    # Print KEY=value lines with real values
    envtiers show ./deploy settings --format env --unmasked

    # Report which tiers were applied, without printing values
    envtiers check ./deploy settings

    # Use a different naming convention
    envtiers --options ./envtiers.toml show ./deploy settings
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Loader options file path
    ///
    /// A TOML file overriding the naming convention (prefix, ext, sep,
    /// local_name, mode_setting_name and the attribute patterns).
    /// ENVTIERS_* environment variables take priority over the file.
    ///
    /// Example: --options /etc/envtiers.toml
    #[arg(long, value_name = "FILE", global = true, value_parser = validation::validate_options_file_path)]
    pub options: Option<PathBuf>,

    /// Enable verbose logging
    ///
    /// Logs each resolution stage at debug level. Cannot be used with --quiet.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormatArg::Full)]
    pub log_format: LogFormatArg,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the resolved settings of a package
    Show {
        /// Directory the package is resolved against
        #[arg(value_parser = validation::validate_root_dir)]
        root: PathBuf,

        /// Package holding the settings sources, relative to the root
        #[arg(value_parser = validation::validate_package)]
        package: String,

        /// Force a mode instead of reading it from the sources
        #[arg(short, long, value_parser = validation::validate_mode)]
        mode: Option<String>,

        /// Print sensitive values instead of their masks
        #[arg(long)]
        unmasked: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Report the mode and applied tiers of a package without printing values
    Check {
        /// Directory the package is resolved against
        #[arg(value_parser = validation::validate_root_dir)]
        root: PathBuf,

        /// Package holding the settings sources, relative to the root
        #[arg(value_parser = validation::validate_package)]
        package: String,

        /// Force a mode instead of reading it from the sources
        #[arg(short, long, value_parser = validation::validate_mode)]
        mode: Option<String>,
    },
}

/// Output format for `show`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON object
    Json,
    /// One KEY=value line per setting
    Env,
}

/// Log format for CLI
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Full,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Full => LogFormat::Full,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Log level implied by --verbose and --quiet
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Logger configuration built from the global flags
    pub fn logger_config(&self) -> LoggerConfig {
        let mut config = LoggerConfig::default();
        config
            .with_level(self.log_level())
            .with_format(self.log_format.into());
        config
    }
}
