//! One tracking run over a project.
//!
//! A [`Session`] loads the last committed snapshot, scans the tree, diffs the
//! two and holds the resulting report. The caller then either commits, which
//! makes the scanned state the new baseline, or discards, which leaves the
//! persisted state untouched so the same changes are reported again next
//! time.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::diff::DiffEngine;
use crate::error::{TrackerError, TrackerResult};
use crate::ignore::IgnoreMatcher;
use crate::report::ChangeReport;
use crate::scan::TreeScanner;
use crate::snapshot::{Snapshot, TrackedFile};
use crate::store::SnapshotStore;
use plaincode_util::TimingGuard;

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Rules compiled, nothing read yet.
    Created,
    /// Report computed, waiting for commit or discard.
    Scanned,
    Committed,
    Discarded,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Scanned => "scanned",
            SessionState::Committed => "committed",
            SessionState::Discarded => "discarded",
        }
    }

    /// Whether the session has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Discarded)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single load, scan, diff and commit-or-discard cycle.
#[derive(Debug)]
pub struct Session {
    config: TrackerConfig,
    scanner: TreeScanner,
    store: SnapshotStore,
    state: SessionState,
    before: Option<Snapshot>,
    report: Option<ChangeReport>,
    pending: Option<Snapshot>,
}

impl Session {
    /// Prepare a session for the project at `root`.
    ///
    /// Fails if a pattern does not compile or the root is not a directory.
    pub fn new<I, S>(
        root: impl Into<PathBuf>,
        patterns: I,
        config: TrackerConfig,
    ) -> TrackerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.into();
        let state_relative = config.state_relative(&root);
        let matcher = IgnoreMatcher::for_project(
            patterns,
            config.default_ignores,
            state_relative.as_deref(),
        )?;
        let store = SnapshotStore::for_project(&root, &config);
        let scanner = TreeScanner::new(root, matcher)?;

        debug!(
            root = %scanner.root().display(),
            state_file = %store.path().display(),
            rules = scanner.matcher().rules().len(),
            "Created session"
        );

        Ok(Self {
            config,
            scanner,
            store,
            state: SessionState::Created,
            before: None,
            report: None,
            pending: None,
        })
    }

    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The snapshot the report compares against, once scanned.
    pub fn before(&self) -> Option<&Snapshot> {
        self.before.as_ref()
    }

    /// The computed report, once scanned.
    pub fn report(&self) -> Option<&ChangeReport> {
        self.report.as_ref()
    }

    /// The snapshot a commit would persist.
    pub fn pending(&self) -> Option<&Snapshot> {
        self.pending.as_ref()
    }

    /// Load, scan and diff.
    ///
    /// A state file that cannot be trusted aborts the session. Files that
    /// cannot be read are reported as warnings and keep their previous
    /// state. On error the session stays `Created`.
    pub async fn begin(&mut self) -> TrackerResult<&ChangeReport> {
        self.expect_state("begin", SessionState::Created)?;
        let _timing = TimingGuard::session(self.root().display().to_string());

        let before = self.store.load().await?;
        let output = self.scanner.scan_concurrent(self.config.workers()).await;

        let engine = DiffEngine::new(&before).preserve(output.unreadable());
        let records = engine.run(&output.files);

        let mut pending = Snapshot {
            revision: before.revision + 1,
            committed_at: None,
            files: output
                .files
                .iter()
                .map(|file| (file.path.clone(), TrackedFile::from_bytes(&file.content)))
                .collect(),
        };
        for (path, tracked) in &before.files {
            if !pending.contains(path) && engine.is_preserved(path) {
                pending.insert(path.clone(), tracked.clone());
            }
        }

        let report = ChangeReport::new(before.revision, records, output.warnings);
        info!(
            root = %self.root().display(),
            base_revision = before.revision,
            tracked = pending.len(),
            warnings = report.warnings.len(),
            summary = %report.summary(),
            "Scanned project"
        );

        self.before = Some(before);
        self.pending = Some(pending);
        self.state = SessionState::Scanned;
        Ok(self.report.insert(report))
    }

    /// Persist the scanned state and return its revision.
    ///
    /// If writing fails the session stays `Scanned`, so the caller may retry
    /// or discard.
    pub async fn commit(&mut self) -> TrackerResult<u64> {
        self.expect_state("commit", SessionState::Scanned)?;
        let Some(mut pending) = self.pending.take() else {
            return Err(TrackerError::invalid_state("commit", self.state));
        };

        pending.committed_at = Some(Utc::now());
        if let Err(e) = self.store.commit(&pending).await {
            warn!(root = %self.root().display(), error = %e, "Commit failed");
            self.pending = Some(pending);
            return Err(e);
        }

        let revision = pending.revision;
        info!(root = %self.root().display(), revision, "Session committed");
        self.state = SessionState::Committed;
        Ok(revision)
    }

    /// Drop the scanned state without writing anything.
    pub fn discard(&mut self) -> TrackerResult<()> {
        self.expect_state("discard", SessionState::Scanned)?;
        self.pending = None;
        self.state = SessionState::Discarded;
        debug!(root = %self.root().display(), "Discarded session");
        Ok(())
    }

    fn expect_state(&self, operation: &'static str, expected: SessionState) -> TrackerResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TrackerError::invalid_state(operation, self.state))
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Scanned {
            warn!(
                root = %self.root().display(),
                "Session dropped before commit, discarding scanned changes"
            );
        }
    }
}
