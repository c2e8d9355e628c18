//! Append-only writer for per-run log files.

use chrono::{DateTime, Local};
use consensus_application::ports::run_logger::LogLevel;
use consensus_domain::RunId;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

const LOGS_DIR: &str = "logs";

/// One queued log line
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub run_id: RunId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    pub fn new(run_id: RunId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            run_id,
            level,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    /// `[LEVEL][YYYY-MM-DD HH:MM:SS] message`
    pub fn format_line(&self) -> String {
        format!(
            "[{}][{}] {}",
            self.level,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Appends entries to `<root>/logs/consensus-<run_id>.log`.
///
/// Writes to one file are serialized by a lock for that file only.
pub struct LogFileWriter {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LogFileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Log file of one run
    pub fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.root
            .join(LOGS_DIR)
            .join(format!("consensus-{}.log", run_id))
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Append one entry; failures are reported through `tracing` only.
    pub fn write(&self, entry: &LogEntry) {
        let path = self.path_for(&entry.run_id);
        let lock = self.lock_for(&path);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Err(e) = Self::append(&path, &entry.format_line()) {
            warn!("Could not write run log {}: {}", path.display(), e);
        }
    }

    fn append(path: &Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_line() {
        let entry = LogEntry {
            run_id: RunId::parse("run-1").unwrap(),
            level: LogLevel::Warn,
            message: "gpt timed out".to_string(),
            timestamp: Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap(),
        };
        assert_eq!(entry.format_line(), "[WARN][2026-03-01 09:05:07] gpt timed out");
    }

    #[test]
    fn test_appends_per_run_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogFileWriter::new(dir.path());
        let run_a = RunId::parse("a").unwrap();
        let run_b = RunId::parse("b").unwrap();

        writer.write(&LogEntry::new(run_a.clone(), LogLevel::Info, "first"));
        writer.write(&LogEntry::new(run_b.clone(), LogLevel::Error, "other run"));
        writer.write(&LogEntry::new(run_a.clone(), LogLevel::Info, "second"));

        let path_a = dir.path().join("logs/consensus-a.log");
        assert_eq!(writer.path_for(&run_a), path_a);
        let content = std::fs::read_to_string(path_a).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[INFO]["));
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));

        let content_b = std::fs::read_to_string(writer.path_for(&run_b)).unwrap();
        assert!(content_b.starts_with("[ERROR]["));
    }
}
