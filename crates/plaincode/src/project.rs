//! Per-project settings: `plaincode.json` and ignore files.

use anyhow::Context;
use plaincode_tracker::{parse_ignore_file, TrackerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = "plaincode.json";

/// Ignore files read from the project root, in order.
pub const IGNORE_FILES: [&str; 2] = [".gitignore", ".plaincodeignore"];

/// Settings loaded from the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub tracker: TrackerConfig,

    /// Extra ignore patterns, applied after the ignore files.
    pub ignore: Vec<String>,
}

impl ProjectConfig {
    /// Load `plaincode.json` from `root`. A missing file yields defaults.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No project config, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded project config");
        Ok(config)
    }

    /// Ignore patterns for the project: ignore files first, then `ignore`.
    pub fn patterns(&self, root: &Path) -> anyhow::Result<Vec<String>> {
        let mut patterns = Vec::new();
        for name in IGNORE_FILES {
            let path = root.join(name);
            match std::fs::read_to_string(&path) {
                Ok(text) => patterns.extend(parse_ignore_file(&text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
            }
        }
        patterns.extend(self.ignore.iter().cloned());
        Ok(patterns)
    }
}

/// Resolve the project root argument, defaulting to the current directory.
pub fn resolve_root(root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}
