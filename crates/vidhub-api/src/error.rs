use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use vidhub_core::{AuthFailure, CoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        ApiError::Core(failure.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Core(CoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Core(CoreError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{} not found", what))
            }
            ApiError::Core(CoreError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Core(CoreError::Auth(failure)) => {
                tracing::debug!("Rejected request: {}", failure);
                (StatusCode::UNAUTHORIZED, unauthorized_message(*failure).to_string())
            }
            ApiError::Core(CoreError::Authorization) => (
                StatusCode::FORBIDDEN,
                "Not permitted to modify this resource".to_string(),
            ),
            ApiError::Core(CoreError::Internal(e)) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Login failures share one message so the body does not reveal whether the
/// account exists.
fn unauthorized_message(failure: AuthFailure) -> &'static str {
    match failure {
        AuthFailure::MissingCredential => "Unauthorized request",
        AuthFailure::Expired => "Token expired",
        AuthFailure::InvalidSignature | AuthFailure::UserNotFound => "Invalid token",
        AuthFailure::Revoked => "Refresh token is expired or used",
        AuthFailure::InvalidCredentials => "Invalid credentials",
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
