//! Logging initialization.
//!
//! Reports go to stdout, so logs are written to stderr or to a file.

use plaincode_util::log::{self, LogConfig, LogLevel};
use std::path::PathBuf;

/// Initialize logging for a CLI run.
///
/// Only warnings are shown unless `verbose` is set. With `log_file` the
/// output goes to that file instead of stderr.
pub fn init_logging(verbose: bool, log_file: Option<PathBuf>) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    log::init(LogConfig {
        print: true,
        level,
        include_location: verbose,
        file: log_file,
    });
}
