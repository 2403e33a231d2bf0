//! Response envelope and domain-error mapping
//!
//! Every success is wrapped in `{status, message, data}`; every failure
//! carries a stable kind mapped to an HTTP status plus a human-readable
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mawid_domain::MawidError;
use serde::Serialize;
use serde_json::json;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self { status: "success", message: message.into(), data: Some(data) }
    }
}

/// Boundary error: a domain failure or a rejected request
#[derive(Debug)]
pub enum ApiError {
    Domain(MawidError),
    Unauthorized(String),
}

impl From<MawidError> for ApiError {
    fn from(err: MawidError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            Self::Domain(err) => {
                let status = match &err {
                    MawidError::NotFound(_) => StatusCode::NOT_FOUND,
                    MawidError::Forbidden(_) => StatusCode::FORBIDDEN,
                    MawidError::Conflict(_) => StatusCode::CONFLICT,
                    MawidError::InvalidState(_) | MawidError::Validation(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    MawidError::Database(_)
                    | MawidError::Config(_)
                    | MawidError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                // Storage faults are logged server-side and reported
                // generically
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "request failed");
                    (status, "internal server error".to_string())
                } else {
                    (status, err.to_string())
                }
            }
        };

        let body = json!({ "status": "fail", "message": message });
        (status, Json(body)).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
