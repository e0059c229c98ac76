use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn create_comment(
    State(db): State<Database>,
    Json(input): Json<CreateCommentInput>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    require_text("text", &input.text)?;
    let comment = db.create_comment(input)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Soft-delete or recover a comment.
pub async fn soft_delete_comment(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<SoftDeleteCommentInput>,
) -> ApiResult<Json<Comment>> {
    db.soft_delete_comment(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("comment", id))
}
