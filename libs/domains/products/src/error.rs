use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Invalid product id: {0}")]
    InvalidId(String),

    #[error("Product not found: {0}")]
    NotFound(ObjectId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::InvalidId(id) => {
                AppError::BadRequest(format!("Invalid product id: {}", id))
            }
            ProductError::NotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id.to_hex()))
            }
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::Database(msg) => AppError::InternalServerError(msg),
            ProductError::Unsupported(op) => {
                AppError::NotImplemented(format!("Operation '{}' is not supported", op))
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

impl From<mongodb::bson::oid::Error> for ProductError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        ProductError::InvalidId(err.to_string())
    }
}
