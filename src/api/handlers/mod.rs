pub mod comments;
pub mod layers;
pub mod orgs;
pub mod projects;
pub mod search;
pub mod tasks;
pub mod users;
pub mod views;

use axum::{response::IntoResponse, Json};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};

// ============================================================
// Health
// ============================================================

pub async fn root() -> &'static str {
    "This is the orgnocal API"
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Shared extractors
// ============================================================

/// `?depth=N` for tree endpoints. Clamped to the configured maximum.
#[derive(Debug, Default, Deserialize)]
pub struct DepthQuery {
    pub depth: Option<usize>,
}

/// Reject blank names and titles with a 400.
fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    Ok(())
}
