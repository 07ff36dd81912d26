//! Gitignore-style path exclusion.
//!
//! Rules are evaluated in declaration order and the last matching rule wins.
//! A rule written with a leading `!` re-includes a path, but never one whose
//! ancestor directory is excluded: once a directory is out, its subtree is
//! out.
//!
//! Pattern forms:
//! - `*.log`: no inner `/`, matches a single path component at any depth
//! - `docs/*.md`, `/build`: contains or starts with `/`, anchored to the root
//! - `target/`: trailing `/`, matches directories only
//! - `!keep.log`: re-include
//!
//! `*` never crosses a `/`; `**` spans any number of directories.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::PatternError;

/// Rules applied before caller patterns, so callers may negate them.
pub const DEFAULT_IGNORES: [&str; 2] = [".git/", ".DS_Store"];

/// Where a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    /// Built-in defaults such as `.git/`.
    Default,
    /// Patterns supplied by the caller, usually read from an ignore file.
    Project,
    /// Rules protecting the tracker's own files; always evaluated last.
    Guard,
}

/// A single ignore rule as written, with its parsed flags.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    raw: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    origin: RuleOrigin,
}

impl IgnoreRule {
    fn parse(raw: &str, index: usize, origin: RuleOrigin) -> Result<Self, PatternError> {
        let mut body = raw.trim_end();

        let negated = match body.strip_prefix('!') {
            Some(rest) => {
                body = rest;
                true
            }
            None => false,
        };

        // `\!` and `\#` stand for a literal leading character.
        if let Some(rest) = body.strip_prefix('\\') {
            if rest.starts_with('!') || rest.starts_with('#') {
                body = rest;
            }
        }

        let dir_only = body.ends_with('/');
        if dir_only {
            body = &body[..body.len() - 1];
        }

        let anchored = body.contains('/');
        if let Some(rest) = body.strip_prefix('/') {
            body = rest;
        }

        if body.is_empty() {
            return Err(PatternError::Empty { index });
        }

        // globset reads `***` as two stars; git treats it as a typo.
        if body.contains("***") {
            return Err(PatternError::Invalid {
                pattern: raw.to_string(),
                reason: "`***` is not a valid wildcard".to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            negated,
            dir_only,
            anchored,
            origin,
        })
    }

    /// The pattern as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn origin(&self) -> RuleOrigin {
        self.origin
    }

    /// Whether this rule re-includes instead of excluding.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_dir_only(&self) -> bool {
        self.dir_only
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    fn invalid(&self, err: ignore::Error) -> PatternError {
        PatternError::Invalid {
            pattern: self.raw.clone(),
            reason: err.to_string(),
        }
    }
}

/// Ordered set of ignore rules compiled into one gitignore matcher.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
    gitignore: Gitignore,
}

impl Default for IgnoreMatcher {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            gitignore: Gitignore::empty(),
        }
    }
}

impl IgnoreMatcher {
    /// Compile caller patterns, in order, with no built-in rules.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::default().extend(RuleOrigin::Project, patterns)
    }

    /// Append rules of the given origin after the existing ones.
    ///
    /// Lines starting with `#` are comments and add no rule. Indices in a
    /// returned [`PatternError::Empty`] count from the start of `patterns`.
    pub fn extend<I, S>(mut self, origin: RuleOrigin, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (index, pattern) in patterns.into_iter().enumerate() {
            let pattern = pattern.as_ref();
            if pattern.starts_with('#') {
                continue;
            }
            self.rules.push(IgnoreRule::parse(pattern, index, origin)?);
        }
        self.gitignore = compile(&self.rules)?;
        Ok(self)
    }

    /// Build the full rule set for a project.
    ///
    /// Order: defaults (when enabled), caller patterns, then guards for the
    /// state file at `state_relative` so the store never tracks itself.
    pub fn for_project<I, S>(
        patterns: I,
        default_ignores: bool,
        state_relative: Option<&str>,
    ) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let defaults: &[&str] = if default_ignores { &DEFAULT_IGNORES } else { &[] };

        Self::default()
            .extend(RuleOrigin::Default, defaults)?
            .extend(RuleOrigin::Project, patterns)?
            .extend(
                RuleOrigin::Guard,
                state_relative.map(guard_patterns).unwrap_or_default(),
            )
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a file at `path` is excluded from tracking.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_path(path, false)
    }

    /// Whether `path` is excluded, treating it as a directory when `is_dir`.
    ///
    /// `path` is project-relative and `/`-separated. An excluded ancestor
    /// directory excludes the path even if a later `!` rule matches it.
    pub fn matches_path(&self, path: &str, is_dir: bool) -> bool {
        let path = path.trim_start_matches("./").trim_end_matches('/');
        if path.is_empty() || self.rules.is_empty() {
            return false;
        }

        // `Gitignore::matched_path_or_any_parents` lets a whitelist on the
        // path itself win over an ignored parent, so walk ancestors first.
        for (idx, _) in path.match_indices('/') {
            if self.gitignore.matched(&path[..idx], true).is_ignore() {
                return true;
            }
        }

        self.gitignore.matched(path, is_dir).is_ignore()
    }
}

fn compile(rules: &[IgnoreRule]) -> Result<Gitignore, PatternError> {
    let mut builder = GitignoreBuilder::new(Path::new(""));
    for rule in rules {
        builder.add_line(None, rule.raw()).map_err(|e| rule.invalid(e))?;
    }
    builder.build().map_err(|e| PatternError::Invalid {
        pattern: rules.iter().map(IgnoreRule::raw).collect::<Vec<_>>().join("\n"),
        reason: e.to_string(),
    })
}

/// Rules excluding the state file and its temporary sibling.
pub fn guard_patterns(state_relative: &str) -> Vec<String> {
    let escaped = glob::Pattern::escape(state_relative);
    vec![format!("/{escaped}"), format!("/{escaped}.tmp")]
}

/// Split ignore-file text into patterns.
///
/// One pattern per line; trailing whitespace is trimmed, blank lines and
/// lines starting with `#` are dropped.
pub fn parse_ignore_file(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
