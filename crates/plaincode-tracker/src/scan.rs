//! Project tree scanning.
//!
//! [`TreeScanner::scan`] is a lazy iterator: nothing is read until it is
//! advanced and each call starts a fresh walk. Directories are visited
//! depth-first with siblings sorted by name, so two scans of an unchanged
//! tree yield the same sequence.
//!
//! Symbolic links are never followed into directories. A link that resolves
//! to a regular file is tracked by the content it points at.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{TrackerError, TrackerResult};
use crate::ignore::IgnoreMatcher;
use plaincode_util::path::{relative_to, to_slash};
use plaincode_util::TimingGuard;

/// A tracked file and its current bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Project-relative, `/`-separated path.
    pub path: String,
    pub content: Vec<u8>,
}

impl ScannedFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Why a path could not be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScanWarningKind {
    PermissionDenied,
    /// The entry disappeared between listing and reading.
    Vanished,
    Other,
}

/// A path that was skipped during a scan. The rest of the scan continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// Project-relative path of the file or directory.
    pub path: String,
    pub kind: ScanWarningKind,
    pub message: String,
}

impl ScanWarning {
    fn from_io(path: impl Into<String>, error: &std::io::Error) -> Self {
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => ScanWarningKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ScanWarningKind::Vanished,
            _ => ScanWarningKind::Other,
        };
        Self {
            path: path.into(),
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Everything a completed scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Readable files in walk order.
    pub files: Vec<ScannedFile>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutput {
    /// Paths (files or directories) that could not be read.
    pub fn unreadable(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(|w| w.path.as_str())
    }
}

/// A file found by the walk, not yet read.
struct WalkedFile {
    relative: String,
    absolute: PathBuf,
}

type WalkIter<'a> = Box<dyn Iterator<Item = Result<WalkedFile, ScanWarning>> + 'a>;

/// Lazy scan over a project tree. Created by [`TreeScanner::scan`].
pub struct ScanIter<'a> {
    walk: WalkIter<'a>,
}

impl Iterator for ScanIter<'_> {
    type Item = Result<ScannedFile, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        let walked = match self.walk.next()? {
            Ok(walked) => walked,
            Err(warning) => return Some(Err(warning)),
        };

        Some(match std::fs::read(&walked.absolute) {
            Ok(content) => Ok(ScannedFile {
                path: walked.relative,
                content,
            }),
            Err(e) => Err(ScanWarning::from_io(walked.relative, &e)),
        })
    }
}

/// Walks a project root and yields the files that are not ignored.
#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: PathBuf,
    matcher: IgnoreMatcher,
}

impl TreeScanner {
    /// Create a scanner for `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>, matcher: IgnoreMatcher) -> TrackerResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(TrackerError::RootNotFound(root));
        }
        Ok(Self { root, matcher })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn matcher(&self) -> &IgnoreMatcher {
        &self.matcher
    }

    /// Start a fresh lazy scan.
    pub fn scan(&self) -> ScanIter<'_> {
        ScanIter { walk: self.walk() }
    }

    /// Tracked paths in walk order, without reading contents.
    pub fn paths(&self) -> impl Iterator<Item = Result<String, ScanWarning>> + '_ {
        self.walk().map(|item| item.map(|walked| walked.relative))
    }

    /// Scan the tree, reading up to `workers` files at once.
    ///
    /// Files come back in walk order regardless of which read finishes first.
    pub async fn scan_concurrent(&self, workers: usize) -> ScanOutput {
        let _timing = TimingGuard::scan(self.root.display().to_string());

        let mut output = ScanOutput::default();
        let mut walked = Vec::new();
        for item in self.walk() {
            match item {
                Ok(file) => walked.push(file),
                Err(warning) => output.warnings.push(warning),
            }
        }

        let reads: Vec<(String, std::io::Result<Vec<u8>>)> = stream::iter(walked)
            .map(|file| async move {
                let result = fs::read(&file.absolute).await;
                (file.relative, result)
            })
            .buffered(workers.max(1))
            .collect()
            .await;

        for (path, result) in reads {
            match result {
                Ok(content) => output.files.push(ScannedFile { path, content }),
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping unreadable file");
                    output.warnings.push(ScanWarning::from_io(path, &e));
                }
            }
        }

        debug!(
            root = %self.root.display(),
            files = output.files.len(),
            warnings = output.warnings.len(),
            "Scan complete"
        );

        output
    }

    fn walk(&self) -> WalkIter<'_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
            .into_iter()
            .filter_entry(move |entry| !self.is_ignored(entry));

        Box::new(walker.filter_map(move |entry| match entry {
            Ok(entry) => self.classify(&entry),
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| self.relative(p))
                    .unwrap_or_else(|| ".".to_string());
                let warning = match e.io_error() {
                    Some(io) => ScanWarning::from_io(path, io),
                    None => ScanWarning {
                        path,
                        kind: ScanWarningKind::Other,
                        message: e.to_string(),
                    },
                };
                warn!(path = %warning.path, error = %warning.message, "Skipping unreadable entry");
                Some(Err(warning))
            }
        }))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        relative_to(path, &self.root).and_then(|rel| to_slash(&rel))
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        match self.relative(entry.path()) {
            Some(rel) => self.matcher.matches_path(&rel, entry.file_type().is_dir()),
            None => false,
        }
    }

    fn classify(&self, entry: &DirEntry) -> Option<Result<WalkedFile, ScanWarning>> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }

        let Some(relative) = self.relative(entry.path()) else {
            return Some(Err(ScanWarning {
                path: entry.path().to_string_lossy().into_owned(),
                kind: ScanWarningKind::Other,
                message: "path is not valid UTF-8".to_string(),
            }));
        };

        if file_type.is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    debug!(path = %relative, "Not following symlink to directory");
                    return None;
                }
                Err(e) => {
                    debug!(path = %relative, error = %e, "Skipping dangling symlink");
                    return None;
                }
            }
        } else if !file_type.is_file() {
            return None;
        }

        Some(Ok(WalkedFile {
            relative,
            absolute: entry.path().to_path_buf(),
        }))
    }
}
