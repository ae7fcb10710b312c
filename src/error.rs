use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    RedisPool(#[from] deadpool_redis::PoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Slug not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidInput(String),

    #[error("Could not find a free slug after {0} attempts")]
    DuplicateSlugExhausted(u32),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable missing: {0}")]
    MissingEnvVar(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable error code reported to clients.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_URL"),
            AppError::DuplicateSlugExhausted(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SLUG_SPACE_EXHAUSTED")
            }
            AppError::Storage(StoreError::Timeout) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_TIMEOUT")
            }
            AppError::Storage(_) | AppError::Migration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
            AppError::Redis(_) | AppError::RedisPool(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        // Client errors carry their own message; server-side details stay in the logs.
        let error_message = if status.is_client_error() {
            self.to_string()
        } else {
            tracing::error!(error = ?self, code = error_code, "Request failed");
            match &self {
                AppError::DuplicateSlugExhausted(_) => "Could not allocate a short link".to_string(),
                AppError::Storage(StoreError::Timeout) => "Storage timed out".to_string(),
                AppError::Storage(_) | AppError::Migration(_) => {
                    "Database error occurred".to_string()
                }
                AppError::Redis(_) | AppError::RedisPool(_) => "Cache error occurred".to_string(),
                _ => "An internal error occurred".to_string(),
            }
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            AppError::NotFound("abc".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            AppError::InvalidInput("bad".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_URL")
        );
    }

    #[test]
    fn test_storage_timeout_is_503() {
        let err = AppError::from(StoreError::Timeout);
        assert_eq!(err.status_and_code().0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_exhaustion_is_server_error() {
        let err = AppError::DuplicateSlugExhausted(5);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "SLUG_SPACE_EXHAUSTED")
        );
        assert!(err.to_string().contains("5 attempts"));
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::NotFound("zzzzzzzz".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
