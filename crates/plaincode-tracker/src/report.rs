//! Change reports and their text rendering.

use std::borrow::Cow;

use serde::Serialize;

use crate::diff::{edit_script, ChangeKind, ChangeRecord, EditKind, EditOp};
use crate::error::TrackerResult;
use crate::scan::ScanWarning;

/// Width of the rule printed under each file header.
const RULE_WIDTH: usize = 70;

/// The outcome of comparing a project tree against its last committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    /// Revision the tree was compared against. 0 on the first run.
    pub base_revision: u64,
    /// One record per scanned or removed path.
    pub records: Vec<ChangeRecord>,
    /// Paths that could not be read.
    pub warnings: Vec<ScanWarning>,
}

impl ChangeReport {
    pub fn new(
        base_revision: u64,
        records: Vec<ChangeRecord>,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            base_revision,
            records,
            warnings,
        }
    }

    /// Whether this compares against the empty, never-committed state.
    pub fn is_baseline(&self) -> bool {
        self.base_revision == 0
    }

    pub fn has_changes(&self) -> bool {
        self.records.iter().any(ChangeRecord::is_change)
    }

    /// Records other than unchanged ones.
    pub fn changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(|r| r.is_change())
    }

    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Look up the record for a path.
    pub fn get(&self, path: &str) -> Option<&ChangeRecord> {
        self.records.iter().find(|r| r.path == path)
    }

    /// One-line summary such as `2 added, 1 modified, 0 removed`.
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} modified, {} removed",
            self.count(ChangeKind::Added),
            self.count(ChangeKind::Modified),
            self.count(ChangeKind::Removed)
        )
    }

    /// Pretty-printed JSON export.
    pub fn to_json(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as text: a change list followed by per-file hunks
    /// with `context_lines` of surrounding context.
    pub fn render(&self, context_lines: usize) -> String {
        let mut out = Vec::new();

        if self.is_baseline() {
            out.push(format!(
                "First run - establishing baseline ({} files)",
                self.records.len()
            ));
        } else if !self.has_changes() {
            out.push("No changes".to_string());
        } else {
            self.render_changes(context_lines, &mut out);
        }

        if !self.warnings.is_empty() {
            out.push(String::new());
            out.push(format!("Skipped {} unreadable path(s):", self.warnings.len()));
            for warning in &self.warnings {
                out.push(format!("  ! {}", warning));
            }
        }

        out.join("\n")
    }

    fn render_changes(&self, context_lines: usize, out: &mut Vec<String>) {
        out.push("Changes:".to_string());
        for kind in [ChangeKind::Added, ChangeKind::Removed, ChangeKind::Modified] {
            for record in self.of_kind(kind) {
                out.push(format!("{} {}", kind.marker(), record.path));
            }
        }

        let added: Vec<&ChangeRecord> = self.of_kind(ChangeKind::Added).collect();
        if !added.is_empty() {
            out.push(String::new());
            out.push("NEW FILES:".to_string());
            out.extend(added.iter().map(|r| format!("  + {}", r.path)));
        }

        let removed: Vec<&ChangeRecord> = self.of_kind(ChangeKind::Removed).collect();
        if !removed.is_empty() {
            out.push(String::new());
            out.push("DELETED FILES:".to_string());
            out.extend(removed.iter().map(|r| format!("  - {}", r.path)));
        }

        let modified: Vec<&ChangeRecord> = self.of_kind(ChangeKind::Modified).collect();
        if !modified.is_empty() {
            out.push(String::new());
            out.push("Modified files:".to_string());
            for record in modified {
                out.push(String::new());
                out.push(format!("File: {}", record.path));
                out.push("-".repeat(RULE_WIDTH));
                render_hunks(record, context_lines, out);
            }
        }
    }
}

/// One displayable line of an edit script.
struct Row<'a> {
    marker: char,
    number: usize,
    text: &'a str,
}

impl Row<'_> {
    fn is_change(&self) -> bool {
        self.marker != ' '
    }
}

fn render_hunks(record: &ChangeRecord, context_lines: usize, out: &mut Vec<String>) {
    if record.binary {
        out.push("  (binary content differs)".to_string());
        return;
    }

    let edits = json_edits(record).map_or(Cow::Borrowed(record.edits.as_slice()), Cow::Owned);

    let rows: Vec<Row<'_>> = edits
        .iter()
        .flat_map(|op| {
            let (marker, first) = match op.op {
                EditKind::Retain => (' ', op.old_range.start),
                EditKind::Delete => ('-', op.old_range.start),
                EditKind::Insert => ('+', op.new_range.start),
            };
            op.lines.iter().enumerate().map(move |(i, line)| Row {
                marker,
                number: first + i + 1,
                text: line.trim_end_matches(['\n', '\r']),
            })
        })
        .collect();

    if !rows.iter().any(Row::is_change) {
        out.push("  (No textual differences found)".to_string());
        return;
    }

    let visible = visible_rows(&rows, context_lines);

    out.push("```diff".to_string());
    let mut shown_any = false;
    let mut gap = false;
    for (row, show) in rows.iter().zip(&visible) {
        if !show {
            gap = true;
            continue;
        }
        if gap && shown_any {
            out.push("...".to_string());
        }
        gap = false;
        shown_any = true;

        out.push(format!("{} {:4}  {}", row.marker, row.number, row.text));
    }
    out.push("```".to_string());
}

/// Edits between the pretty-printed forms of a JSON document, so a change in
/// formatting or key order alone shows no difference. `None` unless the path
/// looks like JSON and both sides parse.
fn json_edits(record: &ChangeRecord) -> Option<Vec<EditOp>> {
    let path = record.path.to_ascii_lowercase();
    if !(path.ends_with(".json") || path.ends_with(".ipynb")) {
        return None;
    }

    let (old, new) = sides(&record.edits);
    Some(edit_script(&pretty_json(&old)?, &pretty_json(&new)?))
}

/// Rebuild the prior and current text from an edit script.
fn sides(edits: &[EditOp]) -> (String, String) {
    let (mut old, mut new) = (String::new(), String::new());
    for op in edits {
        for line in &op.lines {
            match op.op {
                EditKind::Retain => {
                    old.push_str(line);
                    new.push_str(line);
                }
                EditKind::Delete => old.push_str(line),
                EditKind::Insert => new.push_str(line),
            }
        }
    }
    (old, new)
}

fn pretty_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let mut pretty = serde_json::to_string_pretty(&value).ok()?;
    pretty.push('\n');
    Some(pretty)
}

/// Changed rows plus up to `context` rows around each. A single hidden row
/// between two shown ones is shown as well, since eliding it saves nothing.
fn visible_rows(rows: &[Row<'_>], context: usize) -> Vec<bool> {
    let mut visible = vec![false; rows.len()];
    for (index, _) in rows.iter().enumerate().filter(|(_, r)| r.is_change()) {
        let start = index.saturating_sub(context);
        let end = (index + context + 1).min(rows.len());
        visible[start..end].iter_mut().for_each(|v| *v = true);
    }

    for index in 1..rows.len().saturating_sub(1) {
        if !visible[index] && visible[index - 1] && visible[index + 1] {
            visible[index] = true;
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::scan::{ScanWarningKind, ScannedFile};
    use crate::snapshot::{Snapshot, TrackedFile};

    fn snapshot(files: &[(&str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        snapshot.revision = 3;
        for (path, content) in files {
            snapshot.insert(*path, TrackedFile::from_bytes(content.as_bytes()));
        }
        snapshot
    }

    fn report(before: &Snapshot, after: &[(&str, &str)]) -> ChangeReport {
        let scanned: Vec<ScannedFile> = after
            .iter()
            .map(|(p, c)| ScannedFile::new(*p, c.as_bytes()))
            .collect();
        ChangeReport::new(before.revision, diff(before, &scanned), Vec::new())
    }

    #[test]
    fn baseline_report() {
        let report = report(&Snapshot::empty(), &[("a.txt", "a")]);
        assert!(report.is_baseline());
        assert_eq!(
            report.render(2),
            "First run - establishing baseline (1 files)"
        );
    }

    #[test]
    fn no_changes_report() {
        let before = snapshot(&[("a.txt", "a")]);
        let report = report(&before, &[("a.txt", "a")]);
        assert!(!report.has_changes());
        assert_eq!(report.render(2), "No changes");
        assert_eq!(report.summary(), "0 added, 0 modified, 0 removed");
    }

    #[test]
    fn renders_change_list_and_hunks() {
        let before = snapshot(&[
            ("gone.txt", "bye\n"),
            ("main.py", "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9\n"),
        ]);
        let report = report(
            &before,
            &[
                ("main.py", "l1\nL2\nl3\nl4\nl5\nl6\nl7\nl8\nl9\nl10\n"),
                ("new.txt", "hi\n"),
            ],
        );

        let expected = "\
Changes:
+ new.txt
- gone.txt
~ main.py

NEW FILES:
  + new.txt

DELETED FILES:
  - gone.txt

Modified files:

File: main.py
----------------------------------------------------------------------
```diff
     1  l1
-    2  l2
+    2  L2
     3  l3
     4  l4
...
     8  l8
     9  l9
+   10  l10
```";
        assert_eq!(report.render(2), expected);
        assert_eq!(report.summary(), "1 added, 1 modified, 1 removed");
    }

    #[test]
    fn single_hidden_line_is_not_elided() {
        let before = snapshot(&[("f", "a\nb\nc\nd\ne\nf\ng\n")]);
        let report = report(&before, &[("f", "A\nb\nc\nd\ne\nf\nG\n")]);
        let rendered = report.render(2);
        assert!(!rendered.contains("..."));
        assert!(rendered.contains("     4  d"));
    }

    #[test]
    fn zero_context_shows_only_changes() {
        let before = snapshot(&[("f", "a\nb\nc\n")]);
        let report = report(&before, &[("f", "a\nB\nc\n")]);
        let rendered = report.render(0);
        assert!(rendered.contains("-    2  b\n+    2  B"));
        assert!(!rendered.contains("     1  a"));
    }

    #[test]
    fn reformatted_json_shows_no_textual_differences() {
        let before = snapshot(&[("config.json", "{\"b\": 1, \"a\": 2}\n")]);
        let after = "{\n  \"a\": 2,\n  \"b\": 1\n}\n";
        let report = report(&before, &[("config.json", after)]);

        let record = report.get("config.json").unwrap();
        assert_eq!(record.kind, ChangeKind::Modified);
        assert!(!record.edits.is_empty());

        let rendered = report.render(2);
        let expected = format!(
            "File: config.json\n{}\n  (No textual differences found)",
            "-".repeat(RULE_WIDTH)
        );
        assert!(rendered.contains(&expected), "{rendered}");
        assert!(!rendered.contains("```diff"), "{rendered}");
    }

    #[test]
    fn json_values_are_diffed_pretty_printed() {
        let before = snapshot(&[("data.ipynb", "{\"a\":1,\"b\":2}")]);
        let report = report(&before, &[("data.ipynb", "{\"a\":1,\"b\":3}")]);

        let rendered = report.render(0);
        assert!(rendered.contains("-    3    \"b\": 2\n+    3    \"b\": 3"), "{rendered}");
        assert!(!rendered.contains("{\"a\":1"), "{rendered}");
    }

    #[test]
    fn invalid_json_is_diffed_as_written() {
        let before = snapshot(&[("broken.json", "{\n")]);
        let report = report(&before, &[("broken.json", "{\nx\n")]);
        assert!(report.render(2).contains("+    2  x"));
    }

    #[test]
    fn binary_changes_are_summarized() {
        let mut before = Snapshot::empty();
        before.revision = 1;
        before.insert("img", TrackedFile::from_bytes(&[0, 1]));
        let scanned = vec![ScannedFile::new("img", vec![0, 2])];
        let report = ChangeReport::new(1, diff(&before, &scanned), Vec::new());

        assert!(report.render(2).contains("  (binary content differs)"));
    }

    #[test]
    fn warnings_are_listed() {
        let warning = ScanWarning {
            path: "secret.txt".to_string(),
            kind: ScanWarningKind::PermissionDenied,
            message: "Permission denied (os error 13)".to_string(),
        };
        let report = ChangeReport::new(2, Vec::new(), vec![warning]);

        assert_eq!(
            report.render(2),
            "No changes\n\nSkipped 1 unreadable path(s):\n  ! secret.txt: Permission denied (os error 13)"
        );
    }

    #[test]
    fn json_export_shape() {
        let report = report(&Snapshot::empty(), &[("a.txt", "x\n")]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["baseRevision"], 0);
        assert_eq!(json["records"][0]["kind"], "added");
        assert_eq!(json["warnings"], serde_json::json!([]));
    }
}
