use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::StoreError;
use crate::hierarchy::Rejection;

/// Error type for HTTP handlers.
///
/// Every variant renders as a JSON body with a `message`; rejected hierarchy
/// mutations add the machine-readable `reason`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::not_found(entity, id),
            StoreError::Rejected(rejection) => Self::Rejected(rejection),
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::BadRequest(msg.unwrap_or_else(|| "constraint violation".to_string()))
            }
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, json!({ "message": message }))
            }
            ApiError::Rejected(rejection) => {
                tracing::warn!(reason = rejection.reason(), "{rejection}");
                (
                    StatusCode::CONFLICT,
                    json!({ "message": rejection.to_string(), "reason": rejection.reason() }),
                )
            }
            ApiError::BadRequest(message) => {
                tracing::warn!("Bad request: {message}");
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
