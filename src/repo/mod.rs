//! Persistence for the [`DbData`] document.
//!
//! Every backend stores the whole document and hands it back whole. Business
//! logic only sees the [`Repository`] trait, so the JSON file, the in-memory
//! blob and SQLite are interchangeable.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;
pub use sqlite::{init_db, SqliteRepository};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StorageKind;
use crate::models::DbData;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Whole-document storage.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Loads the full document. A store that has never been written returns
    /// an empty document.
    async fn read(&self) -> Result<DbData, RepoError>;

    /// Replaces the full document.
    async fn write(&self, data: &DbData) -> Result<(), RepoError>;
}

/// Opens the configured backend at `path`.
pub async fn open_repository(
    kind: StorageKind,
    path: PathBuf,
) -> Result<Arc<dyn Repository>, RepoError> {
    let repo: Arc<dyn Repository> = match kind {
        StorageKind::Json => Arc::new(JsonFileRepository::new(path)),
        StorageKind::Sqlite => {
            let pool = init_db(&path).await?;
            Arc::new(SqliteRepository::new(pool))
        }
    };
    tracing::debug!(?kind, "Opened repository");
    Ok(repo)
}
