//! JSON file store for divergent-phase responses.
//!
//! Layout: `<root>/responses/<run_id>/<sanitized model>.json`, one pretty
//! printed [`ModelResponse`] per file.

use async_trait::async_trait;
use consensus_application::ports::response_store::{ResponseStore, StoreError};
use consensus_domain::{ModelResponse, RunId};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RESPONSES_DIR: &str = "responses";

/// Replace characters that are not valid in file names on common filesystems.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match sanitized.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// [`ResponseStore`] backed by one JSON file per model
pub struct FileResponseStore {
    root: PathBuf,
}

impl FileResponseStore {
    /// `root` is the output directory; responses go under `root/responses`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the responses of one run
    pub fn run_dir(&self, run_id: &str) -> Result<PathBuf, StoreError> {
        let run_id =
            RunId::parse(run_id).map_err(|_| StoreError::InvalidRunId(run_id.to_string()))?;
        Ok(self.root.join(RESPONSES_DIR).join(run_id.as_str()))
    }

    async fn json_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl ResponseStore for FileResponseStore {
    async fn save(&self, run_id: &str, responses: &[ModelResponse]) -> Result<(), StoreError> {
        let dir = self.run_dir(run_id)?;
        tokio::fs::create_dir_all(&dir).await?;

        for response in responses {
            let path = dir.join(format!("{}.json", sanitize_file_name(&response.model_name)));
            let json = serde_json::to_string_pretty(response)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            tokio::fs::write(&path, json).await?;
            debug!("Saved response from {} to {}", response.model_name, path.display());
        }

        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Vec<ModelResponse>, StoreError> {
        let dir = self.run_dir(run_id)?;
        let mut responses = Vec::new();

        for path in Self::json_files(&dir).await? {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable response file {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<ModelResponse>(&text) {
                Ok(response) => responses.push(response),
                Err(e) => warn!("Skipping malformed response file {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} responses for run {}", responses.len(), run_id);
        Ok(responses)
    }

    async fn exists(&self, run_id: &str) -> Result<bool, StoreError> {
        let dir = self.run_dir(run_id)?;
        Ok(!Self::json_files(&dir).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn responses() -> Vec<ModelResponse> {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        vec![
            ModelResponse::new("openai/gpt-4o", "Paris", at)
                .with_reasoning("It is the capital.")
                .with_confidence(0.75)
                .with_summary("Paris. Certainly."),
            ModelResponse::new("anthropic/claude-sonnet-4.5", "Paris, France", at),
        ]
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("openai/gpt-4o"), "openai_gpt-4o");
        assert_eq!(sanitize_file_name(r#"a\b:c*d?e"f<g>h|i"#), "a_b_c_d_e_f_g_h_i");
        assert_eq!(sanitize_file_name(".."), "_");
        assert_eq!(sanitize_file_name("plain-model"), "plain-model");
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());

        store.save("run-1", &responses()).await.unwrap();
        assert!(dir.path().join("responses/run-1/openai_gpt-4o.json").is_file());

        let mut loaded = store.load("run-1").await.unwrap();
        loaded.sort_by(|a, b| b.model_name.cmp(&a.model_name));
        assert_eq!(loaded, responses());
    }

    #[tokio::test]
    async fn test_round_trip_keeps_fractional_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let saved: Vec<ModelResponse> = [1.1, 1.3, 1.4, 87.3, 99.9]
            .iter()
            .enumerate()
            .map(|(i, pct)| {
                ModelResponse::new(format!("model-{i}"), "answer", at).with_confidence(pct / 100.0)
            })
            .collect();

        store.save("run-1", &saved).await.unwrap();
        assert_eq!(store.load("run-1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_load_is_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        store.save("run-1", &responses()).await.unwrap();

        let names: Vec<String> = store
            .load("run-1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.model_name)
            .collect();
        assert_eq!(names, vec!["anthropic/claude-sonnet-4.5", "openai/gpt-4o"]);
    }

    #[tokio::test]
    async fn test_missing_run_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        assert!(store.load("never-saved").await.unwrap().is_empty());
        assert!(!store.exists("never-saved").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        store.save("run-1", &responses()[..1]).await.unwrap();

        let run_dir = store.run_dir("run-1").unwrap();
        std::fs::write(run_dir.join("broken.json"), "{not json").unwrap();
        std::fs::write(run_dir.join("notes.txt"), "ignored").unwrap();

        let loaded = store.load("run-1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].model_name, "openai/gpt-4o");
    }

    #[tokio::test]
    async fn test_loads_pascal_case_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        let run_dir = store.run_dir("legacy").unwrap();
        std::fs::create_dir_all(&run_dir).unwrap();
        std::fs::write(
            run_dir.join("m.json"),
            r#"{"ModelName":"m","Answer":"42","ConfidenceScore":0.5,"Timestamp":"2026-03-01T12:00:00Z"}"#,
        )
        .unwrap();

        let loaded = store.load("legacy").await.unwrap();
        assert_eq!(loaded[0].answer, "42");
        assert_eq!(loaded[0].confidence_score, 0.5);
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        std::fs::create_dir_all(store.run_dir("empty-run").unwrap()).unwrap();
        assert!(!store.exists("empty-run").await.unwrap());

        store.save("run-1", &responses()).await.unwrap();
        assert!(store.exists("run-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_run_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResponseStore::new(dir.path());
        for bad in ["", "..", "a/b"] {
            let err = store.save(bad, &responses()).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidRunId(_)), "{bad:?}");
        }
        assert!(matches!(
            store.load("").await.unwrap_err(),
            StoreError::InvalidRunId(_)
        ));
    }
}
