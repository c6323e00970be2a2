use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::search::SearchError;
use crate::llm_client::LlmError;
use crate::resume::extractor::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job search failed: {0}")]
    SearchFailed(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type '{0}'. Please use PDF, DOCX, or TXT.")]
    UnsupportedFormat(String),

    #[error("Could not extract résumé text: {0}")]
    ExtractionFailed(String),

    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Language model error: {0}")]
    ModelRefusal(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Refusal(message) => AppError::ModelRefusal(message),
            other => AppError::ModelUnavailable(other.to_string()),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        AppError::SearchFailed(err.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::FileNotFound(path) => AppError::FileNotFound(path.display().to_string()),
            ExtractError::UnsupportedFormat(extension) => AppError::UnsupportedFormat(extension),
            failed @ ExtractError::ExtractionFailed { .. } => {
                AppError::ExtractionFailed(failed.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::SearchFailed(msg) => {
                tracing::error!("Job search failed: {msg}");
                (StatusCode::BAD_GATEWAY, "SEARCH_FAILED")
            }
            AppError::FileNotFound(_) => (StatusCode::NOT_FOUND, "FILE_NOT_FOUND"),
            AppError::UnsupportedFormat(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            AppError::ExtractionFailed(msg) => {
                tracing::warn!("Extraction failed: {msg}");
                (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILED")
            }
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model unavailable: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE")
            }
            AppError::ModelRefusal(msg) => {
                tracing::warn!("Model returned an error: {msg}");
                (StatusCode::BAD_GATEWAY, "MODEL_REFUSAL")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Internal details stay in the logs; everything else is the user-facing cause.
        let message = match &self {
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
