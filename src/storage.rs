use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Metadata about a stored event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Trait abstracting event persistence – implement this for different
/// backends (filesystem, S3, SQLite, etc.).
#[allow(async_fn_in_trait)]
pub trait EventStorage: Send + Sync + 'static {
    async fn save(&self, id: &str, payload: &serde_json::Value) -> Result<EventMeta, AppError>;
    async fn load(&self, id: &str) -> Result<serde_json::Value, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn list(&self) -> Result<Vec<EventMeta>, AppError>;
    async fn exists(&self, id: &str) -> Result<bool, AppError>;
}

/// Filesystem-backed storage. Each event is a JSON file named `<id>.json`.
#[derive(Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, AppError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn event_path(&self, id: &str) -> PathBuf {
        // Sanitize id to prevent path traversal
        let safe_id: String = id
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }
}

impl EventStorage for FileSystemStorage {
    async fn save(&self, id: &str, payload: &serde_json::Value) -> Result<EventMeta, AppError> {
        let path = self.event_path(id);
        let bytes = serde_json::to_vec(payload)?;
        let size_bytes = bytes.len() as u64;

        fs::write(&path, &bytes).await?;

        Ok(EventMeta {
            id: id.to_string(),
            received_at: Utc::now(),
            size_bytes,
        })
    }

    async fn load(&self, id: &str) -> Result<serde_json::Value, AppError> {
        let path = self.event_path(id);
        if !path.exists() {
            return Err(AppError::NotFound);
        }
        let bytes = fs::read(&path).await?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)?;
        Ok(payload)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let path = self.event_path(id);
        if !path.exists() {
            return Err(AppError::NotFound);
        }
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<EventMeta>, AppError> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut events = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let metadata = entry.metadata().await?;
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();

            // mtime rather than btime: the latter is unavailable on some
            // filesystems, and events are never rewritten after ingest.
            let received_at = metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

            events.push(EventMeta {
                id,
                received_at: DateTime::from(received_at),
                size_bytes: metadata.len(),
            });
        }

        events.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(events)
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.event_path(id).exists())
    }
}
