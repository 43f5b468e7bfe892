//! Error types for argos-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::classifier::ClassifierError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Login failed (401)
    #[error("Invalid credentials.")]
    Unauthorized,

    /// Classifier failed, timed out or returned garbage (500)
    #[error("AI analysis failed: {0}")]
    AnalysisFailed(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// argos-common error
    #[error("Common error: {0}")]
    Common(#[from] argos_common::Error),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::AnalysisFailed(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use argos_common::Error as CommonError;

        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid credentials.".to_string(),
            ),
            ApiError::AnalysisFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_ANALYSIS_FAILED",
                format!("AI analysis failed: {}", msg),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(CommonError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(CommonError::Authentication) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid credentials.".to_string(),
            ),
            ApiError::Common(CommonError::Upstream(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AI_ANALYSIS_FAILED",
                format!("AI analysis failed: {}", msg),
            ),
            ApiError::Common(ref err) => {
                tracing::error!("Request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::AnalysisFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::Common(argos_common::Error::InvalidInput("blank".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Common(argos_common::Error::Authentication),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Common(argos_common::Error::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
