use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type for settings access and source resolution.
///
/// Expected absences during resolution (missing tiers, no mode, no local
/// override) are not errors; only malformed input and explicit lookups of
/// missing keys surface here.
#[derive(Error, Debug)]
pub enum EnvError {
    /// An argument was outside its accepted domain (e.g. a zero mask width)
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A settings key was looked up or deleted but is absent
    #[error("Key not found: \"{key}\"")]
    KeyNotFound { key: String },

    /// Attribute-style lookup failed under every accepted spelling
    #[error("\"{name}\" was not found in settings and is not a recognized attribute")]
    AttributeNotFound { name: String },

    /// A value could not be rendered as text for the process environment
    #[error("Cannot represent \"{key}\" as text: {reason}")]
    Serialization { key: String, reason: String },

    /// A discovered source could not be read or parsed
    #[error("Failed to load source '{source_name}': {reason}")]
    SourceLoad { source_name: String, reason: String },

    /// Filesystem failure while scanning for sources
    #[error("I/O error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A naming pattern in the loader options is not a valid regex
    #[error("Invalid pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Loader options could not be assembled from file and environment
    #[error("Options error: {0}")]
    Options(#[from] config::ConfigError),
}

impl EnvError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    pub fn attribute_not_found(name: impl Into<String>) -> Self {
        Self::AttributeNotFound { name: name.into() }
    }

    pub fn serialization(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Serialization {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn source_load(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceLoad {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for both plain key misses and failed attribute lookups
    pub fn is_key_not_found(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound { .. } | Self::AttributeNotFound { .. }
        )
    }
}

/// Type alias for Result with EnvError to simplify function signatures
pub type Result<T> = std::result::Result<T, EnvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_grouping() {
        assert!(EnvError::key_not_found("A").is_key_not_found());
        assert!(EnvError::attribute_not_found("a").is_key_not_found());
        assert!(!EnvError::invalid_argument("x").is_key_not_found());
    }

    #[test]
    fn test_attribute_not_found_message() {
        let err = EnvError::attribute_not_found("nonexistent");
        let msg = err.to_string();
        assert!(msg.contains("nonexistent"));
        assert!(msg.contains("not a recognized attribute"));
    }

    #[test]
    fn test_source_load_message() {
        let err = EnvError::source_load("env_dev", "expected a table");
        assert_eq!(
            err.to_string(),
            "Failed to load source 'env_dev': expected a table"
        );
    }
}
