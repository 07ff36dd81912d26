//! Longest-common-subsequence line alignment.
//!
//! Common leading lines are retained first, then the rest is aligned with a
//! suffix LCS table walked front to back. When deleting the current old line
//! and inserting the current new line are equally good, the insert wins so the
//! old line stays available for a later match. This makes the alignment
//! prefer matching the earliest old line among equal-cost scripts.
//!
//! Common trailing lines are only split off when the table would otherwise be
//! too large. Retaining them up front pairs new lines with the *last* equal
//! old lines, which can break the earliest-match preference.

use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Above this many table cells the quadratic table is skipped in favour of
/// Myers' algorithm, which still yields a minimal script.
const MAX_TABLE_CELLS: usize = 16 * 1024 * 1024;

/// A contiguous piece of an alignment, in line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hunk {
    /// `len` lines shared by both sides.
    Equal {
        old_start: usize,
        new_start: usize,
        len: usize,
    },
    /// `old_len` old lines replaced by `new_len` new lines. Either length may
    /// be zero, never both.
    Replace {
        old_start: usize,
        old_len: usize,
        new_start: usize,
        new_len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Delete,
    Insert,
}

/// Align two line sequences.
///
/// Hunks cover both inputs completely and in order. Two `Replace` hunks are
/// never adjacent.
pub(crate) fn align<T: AsRef<str>>(old: &[T], new: &[T]) -> Vec<Hunk> {
    let old: Vec<&str> = old.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = new.iter().map(AsRef::as_ref).collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);

    let mut builder = HunkBuilder::default();
    builder.push_run(Step::Keep, prefix);

    if table_cells(old_rest, new_rest) <= MAX_TABLE_CELLS {
        for step in table_steps(old_rest, new_rest) {
            builder.push(step);
        }
        return builder.finish();
    }

    let suffix = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    if table_cells(old_mid, new_mid) <= MAX_TABLE_CELLS {
        for step in table_steps(old_mid, new_mid) {
            builder.push(step);
        }
    } else {
        for op in capture_diff_slices(Algorithm::Myers, old_mid, new_mid) {
            match op {
                DiffOp::Equal { len, .. } => builder.push_run(Step::Keep, len),
                DiffOp::Delete { old_len, .. } => builder.push_run(Step::Delete, old_len),
                DiffOp::Insert { new_len, .. } => builder.push_run(Step::Insert, new_len),
                DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    builder.push_run(Step::Delete, old_len);
                    builder.push_run(Step::Insert, new_len);
                }
            }
        }
    }

    builder.push_run(Step::Keep, suffix);
    builder.finish()
}

fn table_cells(old: &[&str], new: &[&str]) -> usize {
    (old.len() + 1).saturating_mul(new.len() + 1)
}

/// Number of lines the two sequences share in an optimal alignment.
#[cfg(test)]
pub(crate) fn common_len(hunks: &[Hunk]) -> usize {
    hunks
        .iter()
        .map(|h| match h {
            Hunk::Equal { len, .. } => *len,
            Hunk::Replace { .. } => 0,
        })
        .sum()
}

fn table_steps(old: &[&str], new: &[&str]) -> Vec<Step> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;

    // lcs[i * width + j] = LCS length of old[i..] and new[j..].
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if old[i] == new[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            steps.push(Step::Keep);
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] > lcs[i * width + j + 1] {
            steps.push(Step::Delete);
            i += 1;
        } else {
            steps.push(Step::Insert);
            j += 1;
        }
    }
    steps.extend(std::iter::repeat(Step::Delete).take(n - i));
    steps.extend(std::iter::repeat(Step::Insert).take(m - j));
    steps
}

/// Folds single steps into hunks, merging every change between two kept
/// runs into one `Replace`.
#[derive(Default)]
struct HunkBuilder {
    hunks: Vec<Hunk>,
    old_pos: usize,
    new_pos: usize,
}

impl HunkBuilder {
    fn push(&mut self, step: Step) {
        self.push_run(step, 1);
    }

    fn push_run(&mut self, step: Step, count: usize) {
        if count == 0 {
            return;
        }

        let (old_len, new_len) = match step {
            Step::Keep => (count, count),
            Step::Delete => (count, 0),
            Step::Insert => (0, count),
        };

        match (step, self.hunks.last_mut()) {
            (Step::Keep, Some(Hunk::Equal { len, .. })) => *len += count,
            (Step::Keep, _) => self.hunks.push(Hunk::Equal {
                old_start: self.old_pos,
                new_start: self.new_pos,
                len: count,
            }),
            (
                _,
                Some(Hunk::Replace {
                    old_len: run_old,
                    new_len: run_new,
                    ..
                }),
            ) => {
                *run_old += old_len;
                *run_new += new_len;
            }
            _ => self.hunks.push(Hunk::Replace {
                old_start: self.old_pos,
                old_len,
                new_start: self.new_pos,
                new_len,
            }),
        }

        self.old_pos += old_len;
        self.new_pos += new_len;
    }

    fn finish(self) -> Vec<Hunk> {
        self.hunks
    }
}
