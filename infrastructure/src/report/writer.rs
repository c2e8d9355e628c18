//! Writes a rendered report to `<dir>/consensus-<run_id>.md`.

use consensus_domain::RunId;
use std::path::PathBuf;
use tracing::info;

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, run_id: &RunId) -> PathBuf {
        self.dir.join(format!("consensus-{}.md", run_id))
    }

    /// Write `content`, creating the directory if needed. Returns the file path.
    pub async fn save(&self, run_id: &RunId, content: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(run_id);
        tokio::fs::write(&path, content).await?;
        info!("Report saved to {}", path.display());
        Ok(path)
    }
}
