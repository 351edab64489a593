use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RepoError, Repository};
use crate::models::DbData;

/// Keeps the document as a serialized JSON blob under a single key, the way
/// a browser keeps it in local storage. Useful for tests and for running the
/// service without touching disk.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    blob: RwLock<Option<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `data` already stored.
    pub fn with_data(data: &DbData) -> Result<Self, RepoError> {
        let blob = serde_json::to_string(data)?;
        Ok(Self {
            blob: RwLock::new(Some(blob)),
        })
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn read(&self) -> Result<DbData, RepoError> {
        match self.blob.read().await.as_deref() {
            Some(blob) => serde_json::from_str(blob)
                .map_err(|e| RepoError::Corrupt(format!("stored document: {}", e))),
            None => Ok(DbData::default()),
        }
    }

    async fn write(&self, data: &DbData) -> Result<(), RepoError> {
        let blob = serde_json::to_string(data)?;
        *self.blob.write().await = Some(blob);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawMaterial;

    #[tokio::test]
    async fn test_empty_store_reads_default() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.read().await.unwrap(), DbData::default());
    }

    #[tokio::test]
    async fn test_reads_return_independent_copies() {
        let mut data = DbData::default();
        data.raw_materials.push(RawMaterial::new("Milk", "l", 1000.0));
        let repo = MemoryRepository::with_data(&data).unwrap();

        let mut copy = repo.read().await.unwrap();
        copy.raw_materials.clear();

        assert_eq!(repo.read().await.unwrap().raw_materials.len(), 1);
    }
}
