//! Network engine error types

use citemap_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("No papers left after filtering ({total} supplied)")]
    EmptyNetwork { total: usize },

    #[error("Similarity weights sum to {sum:.3}, expected 1.0")]
    InvalidWeights { sum: f64 },

    #[error("Invalid option {field}: {message}")]
    InvalidOption { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl From<NetworkError> for AppError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::EmptyNetwork { total } => AppError::EmptyNetwork { total },
            NetworkError::InvalidWeights { sum } => AppError::InvalidWeights { sum },
            NetworkError::InvalidOption { field, message } => AppError::Validation {
                message,
                field: Some(field.to_string()),
            },
        }
    }
}
