//! Project state tracking for plaincode.
//!
//! This crate records the last known state of every tracked file in a
//! project and reports what changed since then:
//! - Gitignore-style rules decide which files are tracked
//! - Files are fingerprinted with SHA-256 and text content is cached
//! - Modified text files get a replayable line edit script
//! - The new state is persisted atomically, and only when the caller commits
//!
//! # Example
//!
//! ```no_run
//! use plaincode_tracker::{Session, TrackerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrackerConfig::default();
//! let mut session = Session::new("/project/root", ["*.log", "target/"], config)?;
//!
//! let report = session.begin().await?;
//! println!("{}", report.render(2));
//!
//! // Only advance the baseline once the changes have been handled.
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod diff;
mod error;
mod hash;
mod ignore;
mod lcs;
mod report;
mod scan;
mod session;
mod snapshot;
mod store;
mod text;

pub use config::{TrackerConfig, DEFAULT_STATE_FILE};
pub use diff::{
    apply_edits, diff, edit_script, ChangeKind, ChangeRecord, DiffEngine, EditKind, EditOp,
    LineRange,
};
pub use error::{PatternError, ReplayError, TrackerError, TrackerResult};
pub use hash::{fingerprint, Fingerprint};
pub use ignore::{parse_ignore_file, IgnoreMatcher, IgnoreRule, RuleOrigin, DEFAULT_IGNORES};
pub use report::ChangeReport;
pub use scan::{ScanIter, ScanOutput, ScanWarning, ScanWarningKind, ScannedFile, TreeScanner};
pub use session::{Session, SessionState};
pub use snapshot::{Snapshot, TrackedFile};
pub use store::{SnapshotStore, SCHEMA_VERSION};
pub use text::is_binary;
