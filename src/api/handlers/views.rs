use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn create_view(
    State(db): State<Database>,
    Json(input): Json<CreateViewInput>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    require_text("name", &input.name)?;
    let view = db.create_view(input)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_view(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateViewInput>,
) -> ApiResult<Json<ProjectView>> {
    db.update_view(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("view", id))
}

/// Returns the deleted view.
pub async fn delete_view(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<ProjectView>> {
    db.delete_view(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("view", id))
}
