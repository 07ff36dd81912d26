//! Tracker configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the state file, relative to the project root.
pub const DEFAULT_STATE_FILE: &str = ".plaincode/state.json";

/// Configuration for a tracking session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    /// State file path. Relative paths are resolved against the project root.
    pub state_file: PathBuf,

    /// Maximum number of files read concurrently during a scan.
    pub scan_workers: usize,

    /// Unchanged lines shown around each change in rendered reports.
    pub context_lines: usize,

    /// Whether the built-in ignore rules (`.git/`, `.DS_Store`) apply.
    pub default_ignores: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            scan_workers: 8,
            context_lines: 2,
            default_ignores: true,
        }
    }
}

impl TrackerConfig {
    /// Absolute location of the state file for a project root.
    pub fn state_path(&self, root: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            self.state_file.clone()
        } else {
            root.join(&self.state_file)
        }
    }

    /// The state file as a `/`-separated path inside the root, if it lives there.
    pub fn state_relative(&self, root: &Path) -> Option<String> {
        let state = self.state_path(root);
        plaincode_util::path::relative_to(&state, root)
            .and_then(|rel| plaincode_util::path::to_slash(&rel))
    }

    /// Worker count, never below one.
    pub fn workers(&self) -> usize {
        self.scan_workers.max(1)
    }
}
