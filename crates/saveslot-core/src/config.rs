//! Store configuration.
//!
//! Configuration is loaded from two sources, later overriding earlier:
//! 1. `saveslot.json` in a given directory (optional)
//! 2. Environment overrides: `SAVESLOT_ROOT`, `SAVESLOT_PRETTY`,
//!    `SAVESLOT_DURABLE`, `SAVESLOT_CACHE`

use crate::error::{ConfigError, CoreResult};
use saveslot_util::path::DEFAULT_SAVE_ROOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "saveslot.json";

/// Settings for a [`SlotRepository`](crate::SlotRepository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per slot. Relative paths are
    /// resolved against the process working directory.
    pub root: PathBuf,

    /// Write indented JSON.
    pub pretty: bool,

    /// fsync each temporary file before it is renamed into place.
    pub durable: bool,

    /// Memoize documents per repository instance.
    pub cache: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_SAVE_ROOT),
            pretty: true,
            durable: false,
            cache: true,
        }
    }
}

impl StoreConfig {
    /// Config rooted at `root` with every other setting at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `dir` (if given) and the process environment.
    ///
    /// Returns the config and the files it was read from.
    pub fn load(dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = StoreConfig::default();
        let mut sources = Vec::new();

        if let Some(dir) = dir {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                config = Self::load_file(&path)?;
                sources.push(path);
            }
        }

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok((config, sources))
    }

    /// Load configuration from a single file.
    pub fn load_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded store configuration");
        Ok(config)
    }

    /// Apply `SAVESLOT_*` overrides fetched through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<()> {
        if let Some(root) = lookup("SAVESLOT_ROOT").filter(|r| !r.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(value) = lookup("SAVESLOT_PRETTY") {
            self.pretty = parse_bool("SAVESLOT_PRETTY", &value)?;
        }
        if let Some(value) = lookup("SAVESLOT_DURABLE") {
            self.durable = parse_bool("SAVESLOT_DURABLE", &value)?;
        }
        if let Some(value) = lookup("SAVESLOT_CACHE") {
            self.cache = parse_bool("SAVESLOT_CACHE", &value)?;
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> CoreResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: value.to_string(),
        }
        .into()),
    }
}
