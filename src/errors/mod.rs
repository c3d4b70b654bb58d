/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("External API error: {0}")]
    ExternalApi(#[from] reqwest::Error),
    #[error("HTTP Error Code {0}")]
    UpstreamStatus(u16),
    #[error("Unexpected departure board payload: {0}")]
    Decode(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invariant violated: {0}")]
    Invariant(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Json(_) => "CONFIG_ERROR",
            ApiError::ExternalApi(e) => match e.status() {
                Some(status) => upstream_code(status.as_u16()),
                None => "UPSTREAM_ERROR",
            },
            ApiError::UpstreamStatus(status) => upstream_code(*status),
            ApiError::Decode(_) => "DECODE_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Invariant(_) => "INVARIANT_VIOLATION",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn upstream_code(status: u16) -> &'static str {
    match status {
        401 => "UPSTREAM_401",
        403 => "UPSTREAM_403",
        404 => "UPSTREAM_404",
        429 => "UPSTREAM_429",
        500..=599 => "UPSTREAM_5XX",
        _ => "UPSTREAM_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Failures travel inside the envelope, the status line stays 200
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_codes() {
        assert_eq!(ApiError::UpstreamStatus(403).code(), "UPSTREAM_403");
        assert_eq!(ApiError::UpstreamStatus(503).code(), "UPSTREAM_5XX");
        assert_eq!(ApiError::UpstreamStatus(302).code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_display_keeps_status() {
        let err = ApiError::UpstreamStatus(500);
        assert_eq!(err.to_string(), "HTTP Error Code 500");
    }

    #[test]
    fn test_io_error_converts_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ApiError = io.into();
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
