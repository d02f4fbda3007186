//! `rexec config show|path`.

use crate::error::CliError;
use rexec_common::{ConfigPaths, LoadedConfig};
use std::io::Write;

pub fn show(loaded: &LoadedConfig) -> Result<i32, CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(render_show(loaded)?.as_bytes())?;
    Ok(0)
}

pub fn path(paths: &ConfigPaths) -> Result<i32, CliError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(render_paths(paths).as_bytes())?;
    Ok(0)
}

/// Merged configuration as TOML (password masked), then where each value came from.
fn render_show(loaded: &LoadedConfig) -> Result<String, CliError> {
    let mut text = toml::to_string_pretty(&loaded.config.redacted())
        .map_err(|e| CliError::Render(e.to_string()))?;

    if !loaded.files.is_empty() {
        text.push_str("\n# Files read:\n");
        for file in &loaded.files {
            text.push_str(&format!("#   {}\n", file.display()));
        }
    }
    if !loaded.sources.is_empty() {
        text.push_str("\n# Sources:\n");
        for (key, source) in &loaded.sources {
            text.push_str(&format!("#   {} = {}\n", key, source));
        }
    }
    Ok(text)
}

fn render_paths(paths: &ConfigPaths) -> String {
    let mut text = String::new();
    for (path, required) in paths.candidates() {
        let state = if path.is_file() { "found" } else { "not found" };
        let required = if required { ", required" } else { "" };
        text.push_str(&format!("{} ({}{})\n", path.display(), state, required));
    }
    if text.is_empty() {
        text.push_str("no configuration locations available\n");
    }
    text
}
