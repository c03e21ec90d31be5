use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quill_lang::Settings;

/// `<config_dir>/quill`
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("quill"))
}

pub fn default_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("settings.json"))
}

pub fn parse(text: &str) -> Result<Settings> {
    serde_json::from_str(text).context("invalid settings JSON")
}

/// An explicit path must exist. The default file is optional; without it
/// every setting keeps its default.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return read(path);
    }
    match default_file() {
        Some(path) if path.exists() => read(&path),
        _ => {
            log::debug!("no settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

fn read(path: &Path) -> Result<Settings> {
    log::debug!("loading settings from {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&text).with_context(|| format!("in {}", path.display()))
}
