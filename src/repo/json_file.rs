use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use super::{RepoError, Repository};
use crate::models::DbData;

/// The document as a single pretty-printed JSON file.
///
/// Writes go through a temp file and a rename so a crash never leaves a
/// half-written document behind.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Repository for JsonFileRepository {
    async fn read(&self) -> Result<DbData, RepoError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(DbData::default()),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| RepoError::Parse(self.path.clone(), e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DbData::default()),
            Err(e) => Err(RepoError::Io(self.path.clone(), e)),
        }
    }

    async fn write(&self, data: &DbData) -> Result<(), RepoError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::Io(parent.to_path_buf(), e))?;
        }

        let bytes = serde_json::to_vec_pretty(data)?;
        let temp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| RepoError::Io(temp_path.clone(), e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| RepoError::Io(self.path.clone(), e))?;

        Ok(())
    }
}
