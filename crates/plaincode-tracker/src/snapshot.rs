//! Snapshot data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::{fingerprint, Fingerprint};
use crate::text;

/// Last committed state of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// SHA-256 of the file's bytes.
    pub fingerprint: Fingerprint,

    /// Size in bytes.
    pub size: u64,

    /// Committed content, kept for text files so the next session can
    /// produce line diffs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl TrackedFile {
    /// Build the tracked state for a file's bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            fingerprint: fingerprint(bytes),
            size: bytes.len() as u64,
            content: text::as_text(bytes).map(str::to_string),
        }
    }

    /// Whether the committed content was binary (or never cached).
    pub fn is_binary(&self) -> bool {
        self.content.is_none()
    }
}

/// The durable record of every tracked file at one revision.
///
/// Paths are project-relative and `/`-separated. Revision 0 is the empty
/// snapshot that exists before the first commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Incremented on every commit.
    pub revision: u64,

    /// When this revision was committed.
    pub committed_at: Option<DateTime<Utc>>,

    /// Tracked files keyed by relative path.
    pub files: BTreeMap<String, TrackedFile>,
}

impl Snapshot {
    /// The snapshot of a project that has never been committed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a tracked file.
    pub fn get(&self, path: &str) -> Option<&TrackedFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Tracked paths in snapshot order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Record a file's state, replacing any previous entry for the path.
    pub fn insert(&mut self, path: impl Into<String>, file: TrackedFile) {
        self.files.insert(path.into(), file);
    }

    /// Whether this is the never-committed baseline.
    pub fn is_baseline(&self) -> bool {
        self.revision == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_file_caches_text_content() {
        let file = TrackedFile::from_bytes(b"hello");
        assert_eq!(file.size, 5);
        assert_eq!(file.content.as_deref(), Some("hello"));
        assert_eq!(file.fingerprint, fingerprint(b"hello"));
        assert!(!file.is_binary());
    }

    #[test]
    fn tracked_file_skips_binary_content() {
        let file = TrackedFile::from_bytes(&[0, 1, 2, 3]);
        assert_eq!(file.size, 4);
        assert!(file.content.is_none());
        assert!(file.is_binary());
    }

    #[test]
    fn empty_snapshot_is_baseline() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_baseline());
        assert!(snapshot.is_empty());
        assert!(snapshot.committed_at.is_none());
    }

    #[test]
    fn paths_iterate_in_sorted_order() {
        let mut snapshot = Snapshot::empty();
        snapshot.insert("b.txt", TrackedFile::from_bytes(b"b"));
        snapshot.insert("a.txt", TrackedFile::from_bytes(b"a"));
        snapshot.insert("a.txt", TrackedFile::from_bytes(b"a2"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.paths().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
        assert_eq!(snapshot.get("a.txt").unwrap().content.as_deref(), Some("a2"));
        assert!(snapshot.contains("b.txt"));
        assert!(!snapshot.contains("c.txt"));
    }

    #[test]
    fn tracked_file_serializes_without_absent_content() {
        let file = TrackedFile::from_bytes(&[0xff]);
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["size"], 1);
    }
}
