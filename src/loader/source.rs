//! Settings source providers
//!
//! A provider turns a `(root, package)` pair into named attribute maps. The
//! engine never sees files, only the `(name, attributes)` pairs.
//!
//! The file provider reads TOML or JSON sources. Every top-level key is an
//! attribute; a table of the form `{ sensitive = <value>, mask_width = <n> }`
//! marks the attribute as sensitive:
//!
//! ```toml
//! MODE = "dev"
//! DB_PASSWORD = { sensitive = "hunter2", mask_width = 6 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::{EnvError, Result};
use crate::loader::options::SourceFilter;
use crate::loader::search_path::SearchPath;
use crate::sensitive::Sensitive;
use crate::settings::Entry;

/// Exported attributes of one source, in file order
pub type Attributes = IndexMap<String, Entry>;

/// Key marking an inline table as a sensitive value
const SENSITIVE_KEY: &str = "sensitive";

/// Optional key overriding the mask width of a sensitive value
const MASK_WIDTH_KEY: &str = "mask_width";

/// Discovers settings sources for the loader.
///
/// Implementations must re-read their sources on every call and return only
/// attributes accepted by `filter`.
pub trait SourceProvider {
    fn discover(
        &self,
        root: &Path,
        package: &str,
        filter: &SourceFilter,
    ) -> Result<Vec<(String, Attributes)>>;
}

/// Source file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
}

impl SourceFormat {
    pub fn from_ext(ext: &str) -> Self {
        if ext.trim_start_matches('.').eq_ignore_ascii_case("json") {
            SourceFormat::Json
        } else {
            SourceFormat::Toml
        }
    }
}

/// Reads sources from `<root>/<package>/<prefix>*<ext>` files.
///
/// Holds no search state; every [`SourceProvider::discover`] call resolves
/// the package against its own root only, so one provider can serve
/// concurrent loaders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSourceProvider;

impl FileSourceProvider {
    pub fn new() -> Self {
        Self
    }

    fn source_files(dir: &Path, filter: &SourceFilter) -> Result<Vec<(String, PathBuf)>> {
        let read_dir = fs::read_dir(dir).map_err(|e| EnvError::io(dir, e))?;

        let mut files = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| EnvError::io(dir, e))?;
            let path = dir_entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if let Some(name) = filter.source_name(file_name) {
                files.push((name.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }
}

impl SourceProvider for FileSourceProvider {
    fn discover(
        &self,
        root: &Path,
        package: &str,
        filter: &SourceFilter,
    ) -> Result<Vec<(String, Attributes)>> {
        // Scoped to this call: no root outlives the discovery
        let search_path = SearchPath::new();
        let _guard = search_path.use_path(root);

        let Some(dir) = search_path.resolve(package) else {
            tracing::debug!(
                root = %root.display(),
                package,
                "Package directory not found, no sources discovered"
            );
            return Ok(Vec::new());
        };

        let format = SourceFormat::from_ext(filter.ext());
        let mut sources = Vec::new();
        for (name, path) in Self::source_files(&dir, filter)? {
            let content = fs::read_to_string(&path).map_err(|e| EnvError::io(&path, e))?;
            let attributes = parse_source(&name, &content, format, filter)?;
            tracing::debug!(
                source = %name,
                path = %path.display(),
                attributes = attributes.len(),
                "Discovered settings source"
            );
            sources.push((name, attributes));
        }
        Ok(sources)
    }
}

/// In-memory sources keyed by package name.
///
/// Useful for embedding settings in a binary and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySourceProvider {
    packages: IndexMap<String, Vec<(String, Attributes)>>,
}

impl MemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a source in `package`
    pub fn with_source<K, E>(
        mut self,
        package: &str,
        name: &str,
        attributes: impl IntoIterator<Item = (K, E)>,
    ) -> Self
    where
        K: Into<String>,
        E: Into<Entry>,
    {
        let attributes: Attributes = attributes
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let sources = self.packages.entry(package.to_string()).or_default();
        match sources.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = attributes,
            None => sources.push((name.to_string(), attributes)),
        }
        self
    }
}

impl SourceProvider for MemorySourceProvider {
    fn discover(
        &self,
        _root: &Path,
        package: &str,
        filter: &SourceFilter,
    ) -> Result<Vec<(String, Attributes)>> {
        let Some(sources) = self.packages.get(package) else {
            return Ok(Vec::new());
        };
        Ok(sources
            .iter()
            .filter(|(name, _)| {
                filter
                    .source_name(&format!("{}{}", name, filter.ext()))
                    .is_some()
            })
            .map(|(name, attributes)| {
                let exported = attributes
                    .iter()
                    .filter(|(key, _)| filter.accepts_attribute(key))
                    .map(|(key, entry)| (key.clone(), entry.clone()))
                    .collect();
                (name.clone(), exported)
            })
            .collect())
    }
}

/// Parse one source's text into its exported attributes.
///
/// # Errors
///
/// Returns [`EnvError::SourceLoad`] if the text does not parse or its top
/// level is not a table, and [`EnvError::InvalidArgument`] for a bad
/// `mask_width`.
pub fn parse_source(
    name: &str,
    content: &str,
    format: SourceFormat,
    filter: &SourceFilter,
) -> Result<Attributes> {
    let table = match format {
        SourceFormat::Toml => {
            let table: toml::Table = toml::from_str(content)
                .map_err(|e| EnvError::source_load(name, e.to_string()))?;
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect::<Map<String, Value>>()
        }
        SourceFormat::Json => match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(EnvError::source_load(
                    name,
                    "top level must be an object",
                ));
            }
            Err(e) => return Err(EnvError::source_load(name, e.to_string())),
        },
    };

    let mut attributes = Attributes::new();
    for (key, value) in table {
        if !filter.accepts_attribute(&key) {
            tracing::trace!(source = name, attribute = %key, "Skipping non-exported attribute");
            continue;
        }
        let entry = decode_entry(name, &key, value)?;
        attributes.insert(key, entry);
    }
    Ok(attributes)
}

/// Turn a raw value into an entry, honoring the sensitive marker table
fn decode_entry(source: &str, key: &str, value: Value) -> Result<Entry> {
    let Value::Object(mut table) = value else {
        return Ok(Entry::Plain(value));
    };
    let is_marker = table.contains_key(SENSITIVE_KEY)
        && table
            .keys()
            .all(|k| k == SENSITIVE_KEY || k == MASK_WIDTH_KEY);
    if !is_marker {
        return Ok(Entry::Plain(Value::Object(table)));
    }

    let inner = table.remove(SENSITIVE_KEY).unwrap_or(Value::Null);
    let sensitive = match table.remove(MASK_WIDTH_KEY) {
        None => Sensitive::new(inner),
        Some(width) => {
            let width = width
                .as_i64()
                .ok_or_else(|| {
                    EnvError::invalid_argument(format!(
                        "{}.{}: mask_width must be an integer",
                        source, key
                    ))
                })
                .and_then(|n| {
                    usize::try_from(n).map_err(|_| {
                        EnvError::invalid_argument(format!(
                            "{}.{}: mask_width must be greater than 0, got {}",
                            source, key, n
                        ))
                    })
                })?;
            Sensitive::with_mask_width(inner, width)?
        }
    };
    Ok(Entry::Sensitive(sensitive))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
