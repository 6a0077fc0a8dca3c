//! Loader options
//!
//! The naming convention and attribute patterns used during discovery. All
//! fields have defaults; [`OptionsLoader`] layers an optional TOML file and
//! `ENVTIERS_*` environment variables on top of them.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};

/// Environment variable prefix for option overrides
const ENV_PREFIX: &str = "ENVTIERS";

// ============================================================================
// Default value functions
// ============================================================================

fn default_prefix() -> String {
    "env".to_string()
}

fn default_ext() -> String {
    ".toml".to_string()
}

fn default_sep() -> String {
    "_".to_string()
}

fn default_builtin_pattern() -> String {
    r"^__(.+)__$".to_string()
}

fn default_attribute_pattern() -> String {
    r"^[A-Z_0-9]+$".to_string()
}

fn default_mode_setting_name() -> String {
    "MODE".to_string()
}

fn default_local_name() -> String {
    "local".to_string()
}

/// Naming convention for settings sources.
///
/// Source names follow `<prefix>[<sep><mode>][<sep><local_name>]`, stored in
/// files named `<source name><ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Prefix every settings source name starts with
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// File extension of settings sources, including the dot
    #[serde(default = "default_ext")]
    pub ext: String,

    /// Separator between name components
    #[serde(default = "default_sep")]
    pub sep: String,

    /// Attributes matching this are always skipped
    #[serde(default = "default_builtin_pattern")]
    pub builtin_pattern: String,

    /// Only attributes matching this are kept
    #[serde(default = "default_attribute_pattern")]
    pub attribute_pattern: String,

    /// Attribute holding the mode
    #[serde(default = "default_mode_setting_name")]
    pub mode_setting_name: String,

    /// Suffix marking a local override
    #[serde(default = "default_local_name")]
    pub local_name: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            ext: default_ext(),
            sep: default_sep(),
            builtin_pattern: default_builtin_pattern(),
            attribute_pattern: default_attribute_pattern(),
            mode_setting_name: default_mode_setting_name(),
            local_name: default_local_name(),
        }
    }
}

impl LoaderOptions {
    /// Name of the base tier, e.g. `env`
    pub fn base_source_name(&self) -> String {
        self.prefix.clone()
    }

    /// Name of the mode-agnostic local tier, e.g. `env_local`
    pub fn local_source_name(&self) -> String {
        [self.prefix.as_str(), self.local_name.as_str()].join(&self.sep)
    }

    /// Name of a mode tier, e.g. `env_dev`
    pub fn mode_source_name(&self, mode: &str) -> String {
        [self.prefix.as_str(), mode].join(&self.sep)
    }

    /// Name of a mode-local tier, e.g. `env_dev_local`
    pub fn mode_local_source_name(&self, mode: &str) -> String {
        [self.prefix.as_str(), mode, self.local_name.as_str()].join(&self.sep)
    }

    /// Compile the patterns into a [`SourceFilter`].
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Pattern`] if either pattern is not a valid regex,
    /// or [`EnvError::InvalidArgument`] if the prefix or separator is empty.
    pub fn compile(&self) -> Result<SourceFilter> {
        if self.prefix.is_empty() {
            return Err(EnvError::invalid_argument("prefix must not be empty"));
        }
        if self.sep.is_empty() {
            return Err(EnvError::invalid_argument("separator must not be empty"));
        }
        Ok(SourceFilter {
            prefix: self.prefix.clone(),
            ext: self.ext.clone(),
            builtin: compile_pattern(&self.builtin_pattern)?,
            attribute: compile_pattern(&self.attribute_pattern)?,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| EnvError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compiled discovery rules handed to a source provider.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    prefix: String,
    ext: String,
    builtin: Regex,
    attribute: Regex,
}

impl SourceFilter {
    /// Source name for `file_name` if it matches `<prefix>*<ext>`
    pub fn source_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let name = file_name.strip_suffix(self.ext.as_str())?;
        name.starts_with(self.prefix.as_str()).then_some(name)
    }

    /// Whether an attribute name is exported (and not reserved)
    pub fn accepts_attribute(&self, name: &str) -> bool {
        !matches_at_start(&self.builtin, name) && matches_at_start(&self.attribute, name)
    }

    pub fn ext(&self) -> &str {
        &self.ext
    }
}

/// Patterns are anchored at the start of the name only, like a prefix match
fn matches_at_start(pattern: &Regex, name: &str) -> bool {
    pattern.find(name).is_some_and(|m| m.start() == 0)
}

/// Reads [`LoaderOptions`] from an optional file and the environment.
///
/// Priority (lowest to highest):
/// 1. Built-in defaults
/// 2. The options file, if one was given
/// 3. `ENVTIERS_*` environment variables (e.g. `ENVTIERS_PREFIX=settings`)
#[derive(Debug, Default)]
pub struct OptionsLoader {
    file: Option<PathBuf>,
}

impl OptionsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also read options from a TOML file, which must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<LoaderOptions> {
        let mut builder = Config::builder();

        if let Some(ref path) = self.file {
            builder = Self::add_file_source(builder, path)?;
        }

        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .ignore_empty(true),
        );

        let options: LoaderOptions = builder.build()?.try_deserialize()?;
        tracing::debug!(?options, "Loader options resolved");
        Ok(options)
    }

    fn add_file_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: &Path,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        if !path.is_file() {
            return Err(EnvError::invalid_argument(format!(
                "Options file not found: {}",
                path.display()
            )));
        }
        Ok(builder.add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(true)))
    }
}
