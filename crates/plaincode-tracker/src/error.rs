//! Tracker error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// An ignore pattern that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern is empty once `!` and a trailing `/` are removed.
    #[error("Ignore pattern #{index} is empty")]
    Empty { index: usize },

    /// The glob syntax is invalid (unbalanced `[`, `***`, ...).
    #[error("Invalid ignore pattern {pattern:?}: {reason}")]
    Invalid { pattern: String, reason: String },
}

/// An edit script that does not fit the content it is replayed against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The edit does not start where the previous one ended.
    #[error("Edit #{index} starts at line {found}, expected line {expected}")]
    OutOfOrder {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// The range length and the number of carried lines disagree.
    #[error("Edit #{index} spans {span} lines but carries {lines}")]
    LengthMismatch {
        index: usize,
        span: usize,
        lines: usize,
    },

    /// The edit reaches past the end of the prior content.
    #[error("Edit #{index} ends at line {end}, past the end of the content ({len} lines)")]
    OutOfBounds { index: usize, end: usize, len: usize },

    /// A retained or deleted line differs from the prior content.
    #[error("Line {line} does not match the prior content")]
    Mismatch { line: usize },

    /// The script leaves part of the prior content unaccounted for.
    #[error("Edit script stops at line {consumed} of {total}")]
    Incomplete { consumed: usize, total: usize },
}

/// Errors that can occur while tracking a project.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// An ignore pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The persisted state exists but cannot be trusted.
    #[error("Corrupt state file {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    /// A session operation was called in the wrong state.
    #[error("Cannot {operation} a session in state {state}")]
    InvalidSessionState {
        operation: &'static str,
        state: SessionState,
    },

    /// The project root does not exist or is not a directory.
    #[error("Project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrackerError {
    /// Create a corrupt state error.
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid session state error.
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidSessionState { operation, state }
    }
}
