//! Durable snapshot storage.
//!
//! The state lives in a single JSON file:
//! ```text
//! {
//!   "schemaVersion": 1,
//!   "revision": 3,
//!   "committedAt": "2026-10-18T09:12:44Z",
//!   "files": {
//!     "src/main.py": { "fingerprint": "<sha256 hex>", "size": 120, "content": "..." }
//!   }
//! }
//! ```
//! Commits write a sibling `.tmp` file and rename it over the state file, so
//! the previous state stays intact until the new one is complete.

use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::snapshot::Snapshot;

/// Version of the state file layout. Any other version is refused on load.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateFileRef<'a> {
    schema_version: u32,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
}

/// Loads and commits the snapshot for one project.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Location of the state file.
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the state file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the store a project uses under the given configuration.
    pub fn for_project(project_root: &Path, config: &TrackerConfig) -> Self {
        Self::new(config.state_path(project_root))
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the temporary file used while committing.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Load the last committed snapshot.
    ///
    /// Returns the empty snapshot when no state file exists. A state file
    /// that exists but cannot be fully trusted is an error: treating it as
    /// empty or partial would misreport changes.
    pub async fn load(&self) -> TrackerResult<Snapshot> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file, starting from empty snapshot");
                return Ok(Snapshot::empty());
            }
            Err(e) => return Err(TrackerError::Io(e)),
        };

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupt(format!("invalid JSON: {e}")))?;

        let version = match value.get("schemaVersion") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| self.corrupt("schemaVersion is not an integer"))?,
            None => return Err(self.corrupt("missing schemaVersion")),
        };
        if version != u64::from(SCHEMA_VERSION) {
            return Err(self.corrupt(format!(
                "unsupported schema version {version} (expected {SCHEMA_VERSION})"
            )));
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| self.corrupt(format!("invalid state: {e}")))?;

        if let Some(bad) = snapshot
            .paths()
            .find(|p| !plaincode_util::path::is_canonical(p))
        {
            return Err(self.corrupt(format!("non-canonical path {bad:?}")));
        }

        debug!(
            path = %self.path.display(),
            revision = snapshot.revision,
            files = snapshot.len(),
            "Loaded snapshot"
        );

        Ok(snapshot)
    }

    /// Persist a snapshot, replacing the current state atomically.
    pub async fn commit(&self, snapshot: &Snapshot) -> TrackerResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&StateFileRef {
            schema_version: SCHEMA_VERSION,
            snapshot,
        })?;

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, content.as_bytes()).await {
            remove_quietly(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            remove_quietly(&temp_path).await;
            return Err(e.into());
        }

        info!(
            path = %self.path.display(),
            revision = snapshot.revision,
            files = snapshot.len(),
            "Committed snapshot"
        );

        Ok(())
    }

    /// Remove the persisted state. The next load returns the empty snapshot.
    pub async fn reset(&self) -> TrackerResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed state file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrackerError::Io(e)),
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> TrackerError {
        TrackerError::corrupt(&self.path, reason)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary state file");
        }
    }
}
