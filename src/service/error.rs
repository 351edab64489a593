use crate::repo::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    InUse(String),
    #[error("{0}")]
    Validation(String),
    #[error(
        "Not enough {material}: {required} needed, {available} in stock"
    )]
    InsufficientStock {
        material: String,
        required: f64,
        available: f64,
    },
    #[error(transparent)]
    Storage(#[from] RepoError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
