//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::nutrition::NutritionApiError;
use crate::storage::StorageError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Required query, path or body parameter absent
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Correlation analysis failed
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Nutrition lookup failed
    #[error("Nutrition lookup error: {0}")]
    Nutrition(#[from] NutritionApiError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

fn storage_status(e: &StorageError) -> (StatusCode, &'static str) {
    match e {
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StorageError::Invalid(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            ApiError::Storage(e) => storage_status(e),
            ApiError::Analysis(AnalysisError::Storage(e)) => storage_status(e),
            ApiError::Analysis(AnalysisError::Timeout(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ANALYSIS_TIMEOUT")
            }
            ApiError::Nutrition(e) => match e {
                NutritionApiError::NotFound(_) => (StatusCode::NOT_FOUND, "FOOD_NOT_FOUND"),
                NutritionApiError::InvalidApiKey => (StatusCode::BAD_GATEWAY, "NUTRITION_API_KEY"),
                NutritionApiError::Timeout | NutritionApiError::Unavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "NUTRITION_UNAVAILABLE")
                }
                NutritionApiError::Api { .. } | NutritionApiError::Request(_) => {
                    (StatusCode::BAD_GATEWAY, "NUTRITION_API_ERROR")
                }
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::MissingParameter("date"), StatusCode::BAD_REQUEST),
            (ApiError::Storage(StorageError::Invalid("x".into())), StatusCode::BAD_REQUEST),
            (ApiError::Storage(StorageError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::Storage(StorageError::Database("x".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::Analysis(AnalysisError::Timeout(Duration::from_secs(1))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Analysis(AnalysisError::Storage(StorageError::Lock("x".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Nutrition(NutritionApiError::InvalidApiKey), StatusCode::BAD_GATEWAY),
            (ApiError::Nutrition(NutritionApiError::NotFound(1)), StatusCode::NOT_FOUND),
            (ApiError::Nutrition(NutritionApiError::Timeout), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected, "{}", err);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::MissingParameter("date").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"]["code"], "MISSING_PARAMETER");
        assert_eq!(json["error"]["message"], "Missing parameter: date");
        assert!(uuid::Uuid::parse_str(json["request_id"].as_str().unwrap()).is_ok());
    }
}
