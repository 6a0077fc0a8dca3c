//! CLI argument validation functions
//!
//! Checks that go beyond what clap can validate on its own.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Validate that the settings root exists and is a directory
pub fn validate_root_dir(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Settings root does not exist: '{}'", path_str));
    }

    if !path.is_dir() {
        return Err(format!("Settings root is not a directory: '{}'", path_str));
    }

    Ok(path)
}

/// Validate that an options file is accessible (exists and is readable)
pub fn validate_options_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Options file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Options path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read options file '{}': {}", path_str, e)),
    }
}

/// Validate a package name: a relative path below the root
pub fn validate_package(package_str: &str) -> Result<String, String> {
    let package = package_str.trim();

    if package.is_empty() {
        return Err("Package name cannot be empty".to_string());
    }

    let escapes_root = Path::new(package)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes_root {
        return Err(format!(
            "Package must be a relative path inside the root, got: '{}'",
            package_str
        ));
    }

    Ok(package.to_string())
}

/// Validate a mode name; it becomes part of a source name
pub fn validate_mode(mode_str: &str) -> Result<String, String> {
    if mode_str.is_empty() {
        return Err("Mode cannot be empty".to_string());
    }

    if mode_str.chars().any(char::is_whitespace) {
        return Err(format!("Mode cannot contain whitespace, got: '{}'", mode_str));
    }

    if mode_str.contains(['/', '\\']) {
        return Err(format!(
            "Mode cannot contain path separators, got: '{}'",
            mode_str
        ));
    }

    Ok(mode_str.to_string())
}
