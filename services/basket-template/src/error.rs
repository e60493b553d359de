//! Service error types

use errors::AppError;
use thiserror::Error;

use crate::domain::value_objects::CategoryId;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Category {category_id} already has a quota rule in this template")]
    DuplicateCategory { category_id: CategoryId },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository failure: {0}")]
    RepositoryFailure(#[from] AppError),
}

impl ServiceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => AppError::Validation(msg),
            ServiceError::DuplicateCategory { category_id } => AppError::Conflict(format!(
                "Category {category_id} already has a quota rule in this template"
            )),
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::RepositoryFailure(source) => source,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
