//! Command executor for dispatching CLI commands
//!
//! Builds a [`Loader`] from the resolved options and renders the result of
//! the selected subcommand to a writer.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use super::parser::{Cli, Commands, OutputFormat};
use crate::loader::{Loader, LoaderOptions, OptionsLoader, Resolution};
use crate::settings::{Settings, env_text};

/// Execute the parsed command, writing its output to `out`
///
/// # Errors
/// Returns an error if the options cannot be loaded, a source fails to
/// parse, or the output cannot be written.
pub fn execute_command(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let options = load_options(cli)?;

    match &cli.command {
        Commands::Show {
            root,
            package,
            mode,
            unmasked,
            format,
        } => {
            let resolution = resolve(root, package, mode.as_deref(), options)?;
            let rendered = render(&resolution.settings, *unmasked, *format)?;
            writeln!(out, "{}", rendered)?;
        }
        Commands::Check {
            root,
            package,
            mode,
        } => {
            let resolution = resolve(root, package, mode.as_deref(), options)?;
            write!(out, "{}", summarize(&resolution))?;
        }
    }

    out.flush()?;
    Ok(())
}

fn load_options(cli: &Cli) -> anyhow::Result<LoaderOptions> {
    let mut loader = OptionsLoader::new();
    if let Some(ref path) = cli.options {
        loader = loader.with_file(path);
    }
    loader.load().context("Failed to load loader options")
}

fn resolve(
    root: &Path,
    package: &str,
    mode: Option<&str>,
    options: LoaderOptions,
) -> anyhow::Result<Resolution> {
    let loader = Loader::with_options(root, options)?;
    let resolution = match mode {
        Some(mode) => loader.resolve_with_mode(package, mode),
        None => loader.resolve(package),
    };
    resolution.with_context(|| format!("Failed to resolve settings for '{}'", package))
}

/// Render settings as JSON or `KEY=value` lines
pub fn render(settings: &Settings, unmasked: bool, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if unmasked => Ok(serde_json::to_string_pretty(settings)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&settings.masked())?),
        OutputFormat::Env => {
            let lines: Vec<String> = if unmasked {
                settings
                    .iter()
                    .map(|(key, value)| env_line(key, value))
                    .collect::<anyhow::Result<_>>()?
            } else {
                settings
                    .masked()
                    .iter()
                    .map(|(key, value)| env_line(key, value))
                    .collect::<anyhow::Result<_>>()?
            };
            Ok(lines.join("\n"))
        }
    }
}

// Composite values have no env text; print them as compact JSON
fn env_line(key: &str, value: &Value) -> anyhow::Result<String> {
    let text = match env_text(value) {
        Some(text) => text,
        None => serde_json::to_string(value)?,
    };
    Ok(format!("{}={}", key, text))
}

/// Human-readable report of a resolution, never including values
pub fn summarize(resolution: &Resolution) -> String {
    let mut report = String::new();
    let mode = resolution.mode.as_deref().unwrap_or("<none>");
    report.push_str(&format!("mode: {}\n", mode));
    report.push_str(&format!("discovered: {}\n", resolution.discovered.join(", ")));
    report.push_str("load order:\n");
    for tier in &resolution.load_order {
        let status = if resolution.applied.contains(tier) {
            "applied"
        } else {
            "missing"
        };
        report.push_str(&format!("  {} ({})\n", tier, status));
    }
    let sensitive = resolution
        .settings
        .entries()
        .filter(|(_, entry)| entry.is_sensitive())
        .count();
    report.push_str(&format!(
        "keys: {} ({} sensitive)\n",
        resolution.settings.len(),
        sensitive
    ));
    report
}
