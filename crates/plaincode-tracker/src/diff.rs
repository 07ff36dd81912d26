//! Change classification and line edit scripts.
//!
//! A [`ChangeRecord`] is produced for every scanned path and for every path
//! that disappeared since the previous snapshot. Modified text files carry an
//! edit script that [`apply_edits`] can replay against the prior content to
//! get the new content back byte for byte.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::error::ReplayError;
use crate::hash::fingerprint;
use crate::lcs::{align, Hunk};
use crate::scan::ScannedFile;
use crate::snapshot::{Snapshot, TrackedFile};
use crate::text::{as_text, is_binary, split_lines};

/// How a path changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    Unchanged,
}

impl ChangeKind {
    /// Single-character marker used in change lists.
    pub fn marker(&self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Modified => '~',
            ChangeKind::Removed => '-',
            ChangeKind::Unchanged => ' ',
        }
    }
}

/// What an [`EditOp`] does to its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Retain,
}

/// A 0-based, half-open range of line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// An empty range positioned at `at`.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One step of a line edit script.
///
/// `lines` holds the affected lines with their terminators: the retained or
/// deleted old lines, or the inserted new lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOp {
    pub op: EditKind,
    pub old_range: LineRange,
    pub new_range: LineRange,
    pub lines: Vec<String>,
}

impl EditOp {
    fn new(op: EditKind, old_range: LineRange, new_range: LineRange, lines: &[&str]) -> Self {
        Self {
            op,
            old_range,
            new_range,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// The classified difference for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    /// Either side is binary. Binary records never carry edits.
    pub binary: bool,
    pub edits: Vec<EditOp>,
}

impl ChangeRecord {
    /// Anything other than [`ChangeKind::Unchanged`].
    pub fn is_change(&self) -> bool {
        self.kind != ChangeKind::Unchanged
    }

    pub fn inserted_lines(&self) -> usize {
        self.count_lines(EditKind::Insert)
    }

    pub fn deleted_lines(&self) -> usize {
        self.count_lines(EditKind::Delete)
    }

    fn count_lines(&self, kind: EditKind) -> usize {
        self.edits
            .iter()
            .filter(|e| e.op == kind)
            .map(|e| e.lines.len())
            .sum()
    }
}

/// Compute the edit script that turns `old` into `new`.
///
/// Every run of changes between two retained runs becomes one delete op
/// followed by one insert op. Identical inputs yield a single retain op (or
/// nothing if both are empty).
pub fn edit_script(old: &str, new: &str) -> Vec<EditOp> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);

    let mut ops = Vec::new();
    for hunk in align(&old_lines, &new_lines) {
        match hunk {
            Hunk::Equal {
                old_start,
                new_start,
                len,
            } => ops.push(EditOp::new(
                EditKind::Retain,
                LineRange::new(old_start, len),
                LineRange::new(new_start, len),
                &old_lines[old_start..old_start + len],
            )),
            Hunk::Replace {
                old_start,
                old_len,
                new_start,
                new_len,
            } => {
                if old_len > 0 {
                    ops.push(EditOp::new(
                        EditKind::Delete,
                        LineRange::new(old_start, old_len),
                        LineRange::empty(new_start),
                        &old_lines[old_start..old_start + old_len],
                    ));
                }
                if new_len > 0 {
                    ops.push(EditOp::new(
                        EditKind::Insert,
                        LineRange::empty(old_start + old_len),
                        LineRange::new(new_start, new_len),
                        &new_lines[new_start..new_start + new_len],
                    ));
                }
            }
        }
    }
    ops
}

/// Replay an edit script against the content it was computed from.
///
/// Retained and deleted lines are checked against `prior`, and the script
/// must account for every prior line.
pub fn apply_edits(prior: &str, ops: &[EditOp]) -> Result<String, ReplayError> {
    let prior_lines = split_lines(prior);
    let mut output = String::with_capacity(prior.len());
    let mut cursor = 0;

    for (index, op) in ops.iter().enumerate() {
        if op.old_range.start != cursor {
            return Err(ReplayError::OutOfOrder {
                index,
                expected: cursor,
                found: op.old_range.start,
            });
        }

        let span = match op.op {
            EditKind::Insert => op.new_range.len(),
            EditKind::Retain | EditKind::Delete => op.old_range.len(),
        };
        if span != op.lines.len() {
            return Err(ReplayError::LengthMismatch {
                index,
                span,
                lines: op.lines.len(),
            });
        }

        if op.op == EditKind::Insert {
            op.lines.iter().for_each(|line| output.push_str(line));
            continue;
        }

        if op.old_range.end > prior_lines.len() {
            return Err(ReplayError::OutOfBounds {
                index,
                end: op.old_range.end,
                len: prior_lines.len(),
            });
        }

        for (offset, line) in op.lines.iter().enumerate() {
            let at = op.old_range.start + offset;
            if prior_lines[at] != line.as_str() {
                return Err(ReplayError::Mismatch { line: at });
            }
            if op.op == EditKind::Retain {
                output.push_str(line);
            }
        }
        cursor = op.old_range.end;
    }

    if cursor != prior_lines.len() {
        return Err(ReplayError::Incomplete {
            consumed: cursor,
            total: prior_lines.len(),
        });
    }

    Ok(output)
}

/// Compares a scanned tree against a snapshot.
#[derive(Debug, Clone)]
pub struct DiffEngine<'a> {
    before: &'a Snapshot,
    preserved: Vec<String>,
}

impl<'a> DiffEngine<'a> {
    pub fn new(before: &'a Snapshot) -> Self {
        Self {
            before,
            preserved: Vec::new(),
        }
    }

    /// Treat these paths, and everything beneath them, as still present even
    /// though they were not scanned. Used for files and directories that
    /// could not be read.
    pub fn preserve<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Whether `path` is covered by a preserved path.
    pub fn is_preserved(&self, path: &str) -> bool {
        self.preserved.iter().any(|p| {
            p == "."
                || path == p
                || (path.starts_with(p.as_str()) && path[p.len()..].starts_with('/'))
        })
    }

    /// Classify every path in `after` (in order), then every tracked path
    /// that is gone.
    pub fn run(&self, after: &[ScannedFile]) -> Vec<ChangeRecord> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(after.len());
        let mut records = Vec::with_capacity(after.len());

        for file in after {
            if !seen.insert(file.path.as_str()) {
                warn!(path = %file.path, "Ignoring duplicate scanned path");
                continue;
            }
            let record = self.classify(file);
            trace!(
                path = %record.path,
                kind = ?record.kind,
                inserted = record.inserted_lines(),
                deleted = record.deleted_lines(),
                "Classified"
            );
            records.push(record);
        }

        for (path, tracked) in &self.before.files {
            if seen.contains(path.as_str()) {
                continue;
            }
            if self.is_preserved(path) {
                debug!(path = %path, "Keeping unreadable path");
                continue;
            }
            records.push(removed(path, tracked));
        }

        debug!(
            revision = self.before.revision,
            records = records.len(),
            changed = records.iter().filter(|r| r.is_change()).count(),
            "Diff complete"
        );

        records
    }

    fn classify(&self, file: &ScannedFile) -> ChangeRecord {
        let Some(tracked) = self.before.get(&file.path) else {
            return added(file);
        };

        if tracked.fingerprint == fingerprint(&file.content) {
            return ChangeRecord {
                path: file.path.clone(),
                kind: ChangeKind::Unchanged,
                binary: is_binary(&file.content),
                edits: Vec::new(),
            };
        }

        let (binary, edits) = match (tracked.content.as_deref(), as_text(&file.content)) {
            (Some(old), Some(new)) => (false, edit_script(old, new)),
            _ => (true, Vec::new()),
        };

        ChangeRecord {
            path: file.path.clone(),
            kind: ChangeKind::Modified,
            binary,
            edits,
        }
    }
}

/// Diff a scanned tree against a snapshot with nothing preserved.
pub fn diff(before: &Snapshot, after: &[ScannedFile]) -> Vec<ChangeRecord> {
    DiffEngine::new(before).run(after)
}

fn added(file: &ScannedFile) -> ChangeRecord {
    let text = as_text(&file.content);
    let edits = match text {
        Some(text) if !text.is_empty() => {
            let lines = split_lines(text);
            vec![EditOp::new(
                EditKind::Insert,
                LineRange::empty(0),
                LineRange::new(0, lines.len()),
                &lines,
            )]
        }
        _ => Vec::new(),
    };

    ChangeRecord {
        path: file.path.clone(),
        kind: ChangeKind::Added,
        binary: text.is_none(),
        edits,
    }
}

fn removed(path: &str, tracked: &TrackedFile) -> ChangeRecord {
    let edits = match tracked.content.as_deref() {
        Some(text) if !text.is_empty() => {
            let lines = split_lines(text);
            vec![EditOp::new(
                EditKind::Delete,
                LineRange::new(0, lines.len()),
                LineRange::empty(0),
                &lines,
            )]
        }
        _ => Vec::new(),
    };

    ChangeRecord {
        path: path.to_string(),
        kind: ChangeKind::Removed,
        binary: tracked.is_binary(),
        edits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use similar::{capture_diff_slices, Algorithm, DiffOp};

    fn snapshot(files: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        snapshot.revision = 1;
        for (path, content) in files {
            snapshot.insert(*path, TrackedFile::from_bytes(content.as_bytes()));
        }
        snapshot
    }

    fn scanned(files: &[(&str, &str)]) -> Vec<ScannedFile> {
        files
            .iter()
            .map(|(path, content)| ScannedFile::new(*path, content.as_bytes()))
            .collect()
    }

    fn replays(old: &str, new: &str) {
        let ops = edit_script(old, new);
        assert_eq!(apply_edits(old, &ops).unwrap(), new, "{old:?} -> {new:?}");
    }

    #[test]
    fn added_file_on_empty_snapshot() {
        let records = diff(&Snapshot::empty(), &scanned(&[("a.txt", "hello")]));

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.path, "a.txt");
        assert_eq!(record.kind, ChangeKind::Added);
        assert!(!record.binary);
        assert_eq!(apply_edits("", &record.edits).unwrap(), "hello");
    }

    #[test]
    fn modified_file_replays_to_new_content() {
        let before = snapshot(&[("a.txt", "hello")]);
        let records = diff(&before, &scanned(&[("a.txt", "hello world")]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Modified);
        assert_eq!(
            apply_edits("hello", &records[0].edits).unwrap(),
            "hello world"
        );
        assert_eq!(records[0].inserted_lines(), 1);
        assert_eq!(records[0].deleted_lines(), 1);
    }

    #[test]
    fn removed_file_is_reported_after_scanned_paths() {
        let before = snapshot(&[("a.txt", "a\n"), ("b.txt", "b1\nb2\n")]);
        let records = diff(&before, &scanned(&[("a.txt", "a\n")]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "a.txt");
        assert_eq!(records[0].kind, ChangeKind::Unchanged);
        assert!(records[0].edits.is_empty());

        assert_eq!(records[1].path, "b.txt");
        assert_eq!(records[1].kind, ChangeKind::Removed);
        assert_eq!(records[1].deleted_lines(), 2);
        assert_eq!(apply_edits("b1\nb2\n", &records[1].edits).unwrap(), "");
    }

    #[test]
    fn order_follows_scan_then_snapshot() {
        let before = snapshot(&[("gone2", "x"), ("gone1", "y"), ("keep", "k")]);
        let records = diff(&before, &scanned(&[("zeta", "z"), ("keep", "k"), ("alpha", "a")]));
        let order: Vec<(&str, ChangeKind)> =
            records.iter().map(|r| (r.path.as_str(), r.kind)).collect();

        assert_eq!(
            order,
            vec![
                ("zeta", ChangeKind::Added),
                ("keep", ChangeKind::Unchanged),
                ("alpha", ChangeKind::Added),
                ("gone1", ChangeKind::Removed),
                ("gone2", ChangeKind::Removed),
            ]
        );
    }

    #[test]
    fn preserved_paths_are_not_removed() {
        let before = snapshot(&[("locked.txt", "x"), ("private/a", "a"), ("privateer", "p")]);
        let records = DiffEngine::new(&before)
            .preserve(["locked.txt", "private"])
            .run(&[]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "privateer");
        assert_eq!(records[0].kind, ChangeKind::Removed);
    }

    #[test]
    fn binary_content_has_no_edits() {
        let mut before = Snapshot::empty();
        before.insert("img.png", TrackedFile::from_bytes(&[0x89, b'P', 0, 1]));
        before.insert("data", TrackedFile::from_bytes(b"was text\n"));

        let after = vec![
            ScannedFile::new("img.png", vec![0x89, b'P', 0, 2]),
            ScannedFile::new("data", vec![0, 0, 0]),
            ScannedFile::new("new.bin", vec![0xff, 0xfe]),
        ];
        let records = diff(&before, &after);

        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(record.binary, "{} should be binary", record.path);
            assert!(record.edits.is_empty());
        }
        assert_eq!(records[0].kind, ChangeKind::Modified);
        assert_eq!(records[1].kind, ChangeKind::Modified);
        assert_eq!(records[2].kind, ChangeKind::Added);
    }

    #[test]
    fn empty_files_carry_no_edits() {
        let before = snapshot(&[("empty-then-full", "")]);
        let records = diff(
            &before,
            &scanned(&[("empty-then-full", "line\n"), ("new-empty", "")]),
        );

        assert_eq!(records[0].kind, ChangeKind::Modified);
        assert_eq!(apply_edits("", &records[0].edits).unwrap(), "line\n");
        assert_eq!(records[1].kind, ChangeKind::Added);
        assert!(records[1].edits.is_empty());
    }

    #[test]
    fn edit_script_groups_changes_between_retains() {
        let ops = edit_script("a\nb\nc\nd\n", "a\nx\ny\nd\n");
        let kinds: Vec<EditKind> = ops.iter().map(|o| o.op).collect();
        assert_eq!(
            kinds,
            vec![
                EditKind::Retain,
                EditKind::Delete,
                EditKind::Insert,
                EditKind::Retain
            ]
        );
        assert_eq!(ops[1].old_range, LineRange { start: 1, end: 3 });
        assert_eq!(ops[1].lines, vec!["b\n", "c\n"]);
        assert_eq!(ops[2].new_range, LineRange { start: 1, end: 3 });
        assert_eq!(ops[2].old_range, LineRange::empty(3));
        assert_eq!(ops[3].old_range, LineRange { start: 3, end: 4 });
    }

    #[test]
    fn replay_round_trips() {
        replays("", "");
        replays("a\n", "a\n");
        replays("one\ntwo\nthree\n", "one\n2\nthree\nfour\n");
        replays("no newline", "no newline\n");
        replays("trailing\n", "trailing");
        replays("x\r\ny\r\n", "x\r\nY\r\ny\r\n");
        replays("mixed\r\nendings\n", "mixed\nendings\r\n");
        replays("a\nb\nc\n", "");
        replays("", "fresh\nfile");
        replays("a\na\na\n", "a\nb\na\n");
    }

    fn random_text(rng: &mut StdRng) -> String {
        const PIECES: [&str; 8] = ["a\n", "b\n", "c\n", "a\n", "d\r\n", "\n", "e", "\r\n"];
        let len = rng.gen_range(0..24);
        (0..len).map(|_| PIECES[rng.gen_range(0..PIECES.len())]).collect()
    }

    #[test]
    fn random_edits_replay_exactly_and_keep_the_most_lines() {
        let mut rng = StdRng::seed_from_u64(0x0005_eed1);

        for _ in 0..3000 {
            let old = random_text(&mut rng);
            let new = random_text(&mut rng);
            replays(&old, &new);

            let retained: usize = edit_script(&old, &new)
                .iter()
                .filter(|op| op.op == EditKind::Retain)
                .map(|op| op.lines.len())
                .sum();
            let common: usize = capture_diff_slices(
                Algorithm::Myers,
                &split_lines(&old),
                &split_lines(&new),
            )
            .iter()
            .map(|op| match op {
                DiffOp::Equal { len, .. } => *len,
                _ => 0,
            })
            .sum();
            assert_eq!(retained, common, "{old:?} -> {new:?}");
        }
    }

    #[test]
    fn oversized_files_replay_exactly() {
        let old: String = (0..5000).map(|i| format!("line {i}\n")).collect();
        let new: String = (0..5000)
            .map(|i| {
                if i % 3 == 0 {
                    format!("edit {i}\n")
                } else {
                    format!("line {i}\n")
                }
            })
            .collect();
        replays(&old, &new);
    }

    #[test]
    fn crlf_lines_keep_their_terminators() {
        let ops = edit_script("a\r\nb\r\n", "a\r\nc\r\n");
        assert_eq!(ops[0].lines, vec!["a\r\n"]);
        assert_eq!(ops[1].lines, vec!["b\r\n"]);
        assert_eq!(ops[2].lines, vec!["c\r\n"]);
    }

    #[test]
    fn diff_is_deterministic() {
        let before = snapshot(&[("f", "1\n2\n3\n4\n"), ("g", "g\n")]);
        let after = scanned(&[("f", "4\n3\n2\n1\n"), ("h", "h\n")]);
        assert_eq!(diff(&before, &after), diff(&before, &after));
    }

    #[test]
    fn apply_edits_rejects_mismatched_content() {
        let ops = edit_script("a\nb\n", "a\nc\n");
        assert_eq!(
            apply_edits("z\nb\n", &ops),
            Err(ReplayError::Mismatch { line: 0 })
        );
    }

    #[test]
    fn apply_edits_rejects_incomplete_script() {
        let ops = edit_script("a\n", "a\n");
        assert_eq!(
            apply_edits("a\nb\n", &ops),
            Err(ReplayError::Incomplete {
                consumed: 1,
                total: 2
            })
        );
    }

    #[test]
    fn apply_edits_rejects_out_of_bounds() {
        let ops = edit_script("a\nb\n", "a\nb\n");
        assert_eq!(
            apply_edits("a\n", &ops),
            Err(ReplayError::OutOfBounds {
                index: 0,
                end: 2,
                len: 1
            })
        );
    }

    #[test]
    fn apply_edits_rejects_gaps() {
        let mut ops = edit_script("a\nb\nc\n", "a\nB\nc\n");
        ops.remove(0);
        assert_eq!(
            apply_edits("a\nb\nc\n", &ops),
            Err(ReplayError::OutOfOrder {
                index: 0,
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn apply_edits_rejects_wrong_line_count() {
        let mut ops = edit_script("", "x\ny\n");
        ops[0].lines.pop();
        assert_eq!(
            apply_edits("", &ops),
            Err(ReplayError::LengthMismatch {
                index: 0,
                span: 2,
                lines: 1
            })
        );
    }

    #[test]
    fn records_serialize_in_export_shape() {
        let records = diff(&Snapshot::empty(), &scanned(&[("a.txt", "hi\n")]));
        let json = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(json["path"], "a.txt");
        assert_eq!(json["kind"], "added");
        assert_eq!(json["binary"], false);
        assert_eq!(json["edits"][0]["op"], "insert");
        assert_eq!(json["edits"][0]["oldRange"]["start"], 0);
        assert_eq!(json["edits"][0]["newRange"]["end"], 1);
        assert_eq!(json["edits"][0]["lines"][0], "hi\n");
    }
}
