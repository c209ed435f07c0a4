//! Record store.
//!
//! Results, users, achievement unlocks and custom challenges are kept as
//! JSONL files under the data directory:
//! - `records/users.jsonl`
//! - `records/results.jsonl` (append-only)
//! - `records/unlocked_achievements.jsonl`
//! - `records/custom_challenges.jsonl`

pub mod jsonl;
pub mod store;

pub use jsonl::{EntityType, JsonlIterator, JsonlReader, JsonlWriter};
pub use store::{JsonlStore, RecordStore};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Malformed record at {}:{line}: {source}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.records_dir().join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
