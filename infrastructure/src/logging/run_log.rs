//! Channel-backed [`RunLogger`].

use super::file_writer::{LogEntry, LogFileWriter};
use consensus_application::ports::run_logger::{LogLevel, RunLogger};
use consensus_domain::RunId;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Run logger that queues lines for a single writer task.
///
/// Must be created inside a Tokio runtime. Call [`shutdown`](Self::shutdown)
/// before exit so every queued line reaches disk; lines logged afterwards
/// are dropped.
pub struct ChannelRunLogger {
    sender: Mutex<Option<mpsc::UnboundedSender<LogEntry>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    writer: Arc<LogFileWriter>,
}

impl ChannelRunLogger {
    /// Log under `<root>/logs`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let writer = Arc::new(LogFileWriter::new(root));
        let (sender, mut receiver) = mpsc::unbounded_channel::<LogEntry>();

        let consumer_writer = Arc::clone(&writer);
        let consumer = tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                consumer_writer.write(&entry);
            }
        });

        Self {
            sender: Mutex::new(Some(sender)),
            consumer: Mutex::new(Some(consumer)),
            writer,
        }
    }

    /// Log file of one run
    pub fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.writer.path_for(run_id)
    }

    /// Close the queue and wait until every queued line is written.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().unwrap_or_else(|e| e.into_inner()).take());

        let consumer = self.consumer.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(consumer) = consumer
            && let Err(e) = consumer.await
        {
            warn!("Run log writer task failed: {}", e);
        }
    }
}

impl RunLogger for ChannelRunLogger {
    fn log(&self, run_id: &RunId, level: LogLevel, message: &str) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = sender.as_ref() {
            // Only fails once the consumer is gone, i.e. after shutdown
            let _ = sender.send(LogEntry::new(run_id.clone(), level, message));
        }
    }
}
