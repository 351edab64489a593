//! Operations on the cafe document.
//!
//! Each mutation loads the whole document, applies the change with the rules
//! in [`crate::logic`], and writes it back. Mutations are serialized with an
//! in-process lock so two requests to the same service cannot interleave
//! their read and write.

mod costs;
mod error;
mod materials;
mod products;
mod sales;

pub use error::{ServiceError, ServiceResult};
pub use materials::RestockInput;
pub use sales::NewSale;

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::DbData;
use crate::repo::Repository;

pub struct CafeService {
    repo: Arc<dyn Repository>,
    write_lock: Mutex<()>,
}

impl CafeService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// The whole document as currently stored.
    pub async fn snapshot(&self) -> ServiceResult<DbData> {
        Ok(self.repo.read().await?)
    }

    async fn read<T>(&self, f: impl FnOnce(DbData) -> ServiceResult<T>) -> ServiceResult<T> {
        let db = self.repo.read().await?;
        f(db)
    }

    async fn mutate<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut DbData) -> ServiceResult<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut db = self.repo.read().await?;
        let result = f(&mut db)?;
        if let Err(e) = self.repo.write(&db).await {
            tracing::error!("Failed to write document: {}", e);
            return Err(e.into());
        }
        Ok(result)
    }
}

fn ensure_id(id: &mut String) {
    if id.trim().is_empty() {
        *id = Uuid::new_v4().to_string();
    }
}

fn require_name(kind: &str, name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation(format!(
            "{} name cannot be empty",
            kind
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> ServiceResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServiceError::validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}
