//! Per-run log files
//!
//! [`ChannelRunLogger`] implements the application's `RunLogger` port: many
//! producers enqueue lines, a single consumer task appends them through
//! [`LogFileWriter`] to `<dir>/logs/consensus-<run_id>.log`.

mod file_writer;
mod run_log;

pub use file_writer::{LogEntry, LogFileWriter};
pub use run_log::ChannelRunLogger;
