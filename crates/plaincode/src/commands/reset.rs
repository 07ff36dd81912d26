//! `plaincode reset`: forget the tracked state.

use anyhow::Context;
use plaincode_tracker::SnapshotStore;
use std::io::Write;
use std::path::Path;

use crate::project::ProjectConfig;

/// Remove the state file so the next diff starts a new baseline.
pub async fn handle_reset(root: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let project = ProjectConfig::load(root)?;
    let store = SnapshotStore::for_project(root, &project.tracker);

    store
        .reset()
        .await
        .with_context(|| format!("Failed to remove {}", store.path().display()))?;

    writeln!(out, "Reset tracking state for {}", root.display())?;
    Ok(())
}
