//! Port for the per-run log.
//!
//! Every consensus run gets its own human-readable log file with progress
//! lines (model answered, judge still working, retrying, ...). This is
//! separate from `tracing`: tracing handles process diagnostics, while this
//! port captures the story of one run for later inspection.

use consensus_domain::RunId;

/// Severity of a run log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Port for appending lines to a run's log.
///
/// The `log` method is synchronous and non-fallible so that logging never
/// affects the run; implementations drop lines they cannot write.
pub trait RunLogger: Send + Sync {
    /// Record one line for `run_id`.
    fn log(&self, run_id: &RunId, level: LogLevel, message: &str);

    fn info(&self, run_id: &RunId, message: &str) {
        self.log(run_id, LogLevel::Info, message);
    }

    fn warn(&self, run_id: &RunId, message: &str) {
        self.log(run_id, LogLevel::Warn, message);
    }

    fn error(&self, run_id: &RunId, message: &str) {
        self.log(run_id, LogLevel::Error, message);
    }
}

/// No-op implementation for tests and when run logs are disabled.
pub struct NoRunLogger;

impl RunLogger for NoRunLogger {
    fn log(&self, _run_id: &RunId, _level: LogLevel, _message: &str) {}
}
