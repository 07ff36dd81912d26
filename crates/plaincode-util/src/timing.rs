//! Duration logging for long-running phases.
//!
//! ```rust,ignore
//! use plaincode_util::TimingGuard;
//!
//! async fn scan_project(root: &Path) {
//!     let _timing = TimingGuard::scan(root.display().to_string());
//!     // ... walk and read files ...
//! } // duration logged here
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Phases slower than this are logged as warnings.
const DEFAULT_SLOW_AFTER: Duration = Duration::from_secs(5);

/// Logs how long a phase took when dropped.
///
/// Durations are logged at debug level, or at warn level once they pass the
/// slow threshold.
pub struct TimingGuard {
    phase: &'static str,
    target: String,
    start: Instant,
    slow_after: Duration,
}

impl TimingGuard {
    pub fn new(phase: &'static str, target: impl Into<String>) -> Self {
        Self {
            phase,
            target: target.into(),
            start: Instant::now(),
            slow_after: DEFAULT_SLOW_AFTER,
        }
    }

    /// Time a tree scan of `root`.
    pub fn scan(root: impl Into<String>) -> Self {
        Self::new("scan", root)
    }

    /// Time a full tracking session on `root`.
    pub fn session(root: impl Into<String>) -> Self {
        Self::new("session", root)
    }

    /// Override the slow threshold.
    pub fn slow_after(mut self, threshold: Duration) -> Self {
        self.slow_after = threshold;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Render a duration as `850ms`, `2.35s` or `3m12s`.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let took = format_duration(elapsed);

        if elapsed >= self.slow_after {
            warn!(phase = self.phase, subject = %self.target, took = %took, "Slow phase");
        } else {
            debug!(phase = self.phase, subject = %self.target, took = %took, "Phase finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(2_350)), "2.35s");
        assert_eq!(format_duration(Duration::from_secs(192)), "3m12s");
    }

    #[test]
    fn test_guard_measures_elapsed_time() {
        let guard = TimingGuard::scan("/project").slow_after(Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        assert!(guard.elapsed() >= Duration::from_millis(5));
        assert_eq!(guard.phase, "scan");
        assert_eq!(guard.target, "/project");
    }
}
