//! envtiers
//!
//! Layered, mode-aware settings resolution. A package's settings come from up
//! to four tiers (`env`, `env_local`, `env_{mode}`, `env_{mode}_local`),
//! merged key by key into a [`Settings`] map. Values marked sensitive stay
//! masked wherever they are displayed.

pub mod cli;
pub mod error;
pub mod loader;
pub mod logger;
pub mod sensitive;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{EnvError, Result};
pub use loader::{
    FileSourceProvider, Loader, LoaderOptions, MemorySourceProvider, OptionsLoader, Resolution,
    SourceProvider,
};
pub use sensitive::{DEFAULT_MASK_WIDTH, Sensitive};
pub use settings::{Entry, Settings};

/// Resolve the settings of `package` under `root` with default options
pub fn load(root: impl Into<std::path::PathBuf>, package: &str) -> Result<Settings> {
    Loader::new(root)?.load(package)
}
