//! Settings resolution engine
//!
//! Resolution runs as a fixed pipeline over one package:
//!
//! 1. Discover sources named `<prefix>*` through a [`SourceProvider`]
//! 2. Determine the mode (`env_local.MODE`, then `env.MODE`)
//! 3. Drop sources that belong to other modes
//! 4. Compute the load order
//! 5. Merge the tiers into one [`Settings`]
//!
//! # Load order (lowest to highest priority)
//! 1. `env` - Base settings
//! 2. `env_local` - Local overrides, any mode
//! 3. `env_{mode}` - Mode settings
//! 4. `env_{mode}_local` - Local overrides for the mode

pub mod options;
pub mod search_path;
pub mod source;


use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{EnvError, Result};
use crate::settings::Settings;

pub use options::{LoaderOptions, OptionsLoader, SourceFilter};
pub use search_path::{SearchPath, UsePath};
pub use source::{
    Attributes, FileSourceProvider, MemorySourceProvider, SourceFormat, SourceProvider,
};

/// Source name to exported attributes, in discovery order
pub type SourceTable = IndexMap<String, Attributes>;

/// Everything a resolution pass decided, alongside its result.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Names of all discovered sources
    pub discovered: Vec<String>,
    /// Active mode, if any source defined one
    pub mode: Option<String>,
    /// Tier names in merge order
    pub load_order: Vec<String>,
    /// Tiers from the load order that actually contributed
    pub applied: Vec<String>,
    pub settings: Settings,
}

/// Resolves layered settings for packages under a root directory.
#[derive(Debug)]
pub struct Loader<P = FileSourceProvider> {
    root: PathBuf,
    options: LoaderOptions,
    filter: SourceFilter,
    provider: P,
}

impl Loader<FileSourceProvider> {
    /// Create a file-backed loader with default options
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(root, LoaderOptions::default())
    }

    /// Create a file-backed loader with custom options
    ///
    /// # Errors
    ///
    /// Returns an error if the option patterns do not compile.
    pub fn with_options(root: impl Into<PathBuf>, options: LoaderOptions) -> Result<Self> {
        Self::with_provider(root, options, FileSourceProvider::new())
    }
}

impl<P: SourceProvider> Loader<P> {
    pub fn with_provider(root: impl Into<PathBuf>, options: LoaderOptions, provider: P) -> Result<Self> {
        let filter = options.compile()?;
        Ok(Self {
            root: root.into(),
            options,
            filter,
            provider,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve the settings for `package`.
    ///
    /// # Errors
    ///
    /// Fails only if a source cannot be read or parsed. Missing tiers and an
    /// undefined mode are not errors.
    pub fn load(&self, package: &str) -> Result<Settings> {
        Ok(self.resolve(package)?.settings)
    }

    /// Resolve `package` with `mode` forced, ignoring any `MODE` attribute
    pub fn load_with_mode(&self, package: &str, mode: &str) -> Result<Settings> {
        Ok(self.resolve_with_mode(package, mode)?.settings)
    }

    /// Run the full pipeline and report each decision
    pub fn resolve(&self, package: &str) -> Result<Resolution> {
        let table = self.discover(package)?;
        let mode = self.resolve_mode(&table);
        Ok(self.finish(table, mode))
    }

    /// Like [`Loader::resolve`] with `mode` forced.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidArgument`] if `mode` is empty or contains
    /// the separator. Stage 3 matches a mode as one name component.
    pub fn resolve_with_mode(&self, package: &str, mode: &str) -> Result<Resolution> {
        self.check_mode(mode)?;
        let table = self.discover(package)?;
        Ok(self.finish(table, Some(mode.to_string())))
    }

    fn check_mode(&self, mode: &str) -> Result<()> {
        if mode.is_empty() {
            return Err(EnvError::invalid_argument("mode must not be empty"));
        }
        if mode.contains(self.options.sep.as_str()) {
            return Err(EnvError::invalid_argument(format!(
                "mode '{}' must not contain the separator '{}'",
                mode, self.options.sep
            )));
        }
        Ok(())
    }

    fn finish(&self, table: SourceTable, mode: Option<String>) -> Resolution {
        let discovered: Vec<String> = table.keys().cloned().collect();
        let filtered = self.filter_by_mode(mode.as_deref(), table);
        let load_order = self.load_order(mode.as_deref());
        let applied = load_order
            .iter()
            .filter(|name| filtered.contains_key(name.as_str()))
            .cloned()
            .collect();
        let settings = self.merge(&load_order, &filtered);

        tracing::info!(
            root = %self.root.display(),
            mode = mode.as_deref().unwrap_or("<none>"),
            keys = settings.len(),
            "Settings resolved"
        );

        Resolution {
            discovered,
            mode,
            load_order,
            applied,
            settings,
        }
    }

    /// Stage 1: build the source table for `package`
    pub fn discover(&self, package: &str) -> Result<SourceTable> {
        let table: SourceTable = self
            .provider
            .discover(&self.root, package, &self.filter)?
            .into_iter()
            .collect();
        tracing::debug!(
            package,
            sources = ?table.keys().collect::<Vec<_>>(),
            "Sources discovered"
        );
        Ok(table)
    }

    /// Stage 2: the local tier's mode wins over the base tier's
    pub fn resolve_mode(&self, table: &SourceTable) -> Option<String> {
        let mode = self
            .mode_of(table, &self.options.local_source_name())
            .or_else(|| self.mode_of(table, &self.options.base_source_name()));
        tracing::debug!(mode = ?mode, "Mode resolved");
        mode
    }

    fn mode_of(&self, table: &SourceTable, source: &str) -> Option<String> {
        let entry = table.get(source)?.get(&self.options.mode_setting_name)?;
        match entry.value() {
            Value::String(mode) if !mode.is_empty() => Some(mode.clone()),
            Value::String(_) => None,
            _ => {
                tracing::warn!(
                    source,
                    setting = %self.options.mode_setting_name,
                    "Ignoring non-string mode setting"
                );
                None
            }
        }
    }

    /// Stage 3: keep the base and local tiers plus sources naming `mode`
    pub fn filter_by_mode(&self, mode: Option<&str>, table: SourceTable) -> SourceTable {
        let Some(mode) = mode else {
            return table;
        };
        let base = self.options.base_source_name();
        let local = self.options.local_source_name();
        table
            .into_iter()
            .filter(|(name, _)| {
                let keep = name.split(self.options.sep.as_str()).any(|part| part == mode)
                    || *name == base
                    || *name == local;
                if !keep {
                    tracing::trace!(source = %name, mode, "Source excluded by mode");
                }
                keep
            })
            .collect()
    }

    /// Stage 4: tier names from lowest to highest priority
    pub fn load_order(&self, mode: Option<&str>) -> Vec<String> {
        let mut order = vec![
            self.options.base_source_name(),
            self.options.local_source_name(),
        ];
        if let Some(mode) = mode {
            order.push(self.options.mode_source_name(mode));
            order.push(self.options.mode_local_source_name(mode));
        }
        tracing::debug!(load_order = ?order, "Load order computed");
        order
    }

    /// Stage 5: overwrite key by key, following `order`
    pub fn merge(&self, order: &[String], table: &SourceTable) -> Settings {
        let mut settings = Settings::new();
        for name in order {
            let Some(attributes) = table.get(name.as_str()) else {
                tracing::trace!(source = %name, "Tier not present, skipping");
                continue;
            };
            settings.update(attributes.iter().map(|(key, entry)| (key.clone(), entry.clone())));
        }
        settings
    }
}
