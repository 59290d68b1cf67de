//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use capburn_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("{message}")]
    Internal {
        message: String,
        diagnostics: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            diagnostics: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Unauthorized => ApiError::Unauthorized,
            PipelineError::Validation(e) => ApiError::BadRequest(e.to_string()),
            PipelineError::Encode {
                ref diagnostics, ..
            } => ApiError::Internal {
                diagnostics: diagnostics.clone(),
                message: err.to_string(),
            },
            other => ApiError::internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Encoder output stays out of production responses; it is logged instead.
        let production = std::env::var("ENVIRONMENT")
            .map(|e| e.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let diagnostics = match &self {
            ApiError::Internal { diagnostics, .. } if !production => diagnostics.clone(),
            _ => None,
        };

        let body = ErrorResponse {
            status: "error",
            error: self.to_string(),
            diagnostics,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capburn_models::ValidationError;

    #[test]
    fn test_pipeline_error_mapping() {
        assert_eq!(
            ApiError::from(PipelineError::Unauthorized).status_code(),
            StatusCode::UNAUTHORIZED
        );
        let validation = ApiError::from(PipelineError::from(ValidationError::MissingField(
            "job_id",
        )));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "missing required field: job_id");
        assert_eq!(
            ApiError::from(PipelineError::upload("bucket gone")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_encode_error_keeps_diagnostics() {
        let err = ApiError::from(PipelineError::Encode {
            message: "exit 1".to_string(),
            diagnostics: Some("No such filter".to_string()),
        });
        match err {
            ApiError::Internal {
                message,
                diagnostics,
            } => {
                assert_eq!(message, "Encode failed: exit 1");
                assert_eq!(diagnostics.as_deref(), Some("No such filter"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
