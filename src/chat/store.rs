//! Client-local persistence of the current thread id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "chatThreadId")]
    chat_thread_id: String,
    #[serde(rename = "savedAt", default)]
    saved_at: Option<DateTime<Utc>>,
}

/// JSON file holding the `chatThreadId` of the terminal chat
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.assistant-relay/session.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Path::new(&home).join(".assistant-relay").join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored thread id, `None` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let stored: StoredSession =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(stored.chat_thread_id).filter(|id| !id.is_empty()))
    }

    pub fn save(&self, thread_id: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let stored = StoredSession {
            chat_thread_id: thread_id.to_string(),
            saved_at: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        tracing::debug!(path = %self.path.display(), thread_id, "Saved session");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
