use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::database::ExecutionError;
use crate::services::intent_translator::TranslateError;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("Translation error: {0}")]
    Translation(#[from] TranslateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg),
            ),
            AppError::InvalidSql(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INVALID_SQL", msg)
                    .with_details("Only a single SELECT statement is allowed."),
            ),
            AppError::Translation(err) => {
                let detail = ErrorDetail::new("TRANSLATION_ERROR", err.to_string());
                let detail = match err {
                    TranslateError::EmptySchema { .. } => {
                        detail.with_details("Check that the source has a table with columns.")
                    }
                    _ => detail,
                };
                (StatusCode::BAD_REQUEST, detail)
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", msg),
            ),
            AppError::Execution(err) => {
                let code = match err {
                    ExecutionError::Backend(_) => "EXECUTION_ERROR",
                    ExecutionError::Filter(_) => "FILTER_ERROR",
                    ExecutionError::Load(_) => "SOURCE_ERROR",
                };
                // Backend text is passed through verbatim
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail::new(code, err.to_string()),
                )
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_detail,
        });

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(error: AppError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_response_format() {
        let error = AppError::NotFound("Table not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_detail_creation() {
        let detail = ErrorDetail::new("TEST_CODE", "Test message");
        assert_eq!(detail.code, "TEST_CODE");
        assert_eq!(detail.message, "Test message");
        assert!(detail.details.is_none());
    }

    #[tokio::test]
    async fn test_execution_error_keeps_backend_text() {
        let error: AppError = ExecutionError::Backend("no such table: nope".to_string()).into();
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "EXECUTION_ERROR");
        assert_eq!(body.error.message, "no such table: nope");
    }

    #[tokio::test]
    async fn test_translation_error_is_client_error() {
        let error: AppError = TranslateError::EmptyPhrase.into();
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.code, "TRANSLATION_ERROR");
    }

    #[tokio::test]
    async fn test_filter_error_code() {
        let error: AppError = ExecutionError::Filter("unknown column 'x'".to_string()).into();
        let (_, body) = body_of(error).await;
        assert_eq!(body.error.code, "FILTER_ERROR");
        assert_eq!(body.error.message, "Filter error: unknown column 'x'");
    }
}
