use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn list_users(State(db): State<Database>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(db.get_all_users()?))
}

pub async fn get_user(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<UserDetail>> {
    db.get_user(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user", id))
}

pub async fn get_user_by_external_id(
    State(db): State<Database>,
    Path(external_id): Path<String>,
) -> ApiResult<Json<UserDetail>> {
    db.get_user_by_external_id(&external_id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user", &external_id))
}

pub async fn create_user(
    State(db): State<Database>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_text("username", &input.username)?;
    require_text("email", &input.email)?;
    let user = db.create_user(input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<Json<User>> {
    db.update_user(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user", id))
}

pub async fn delete_user(State(db): State<Database>, Path(id): Path<DbId>) -> ApiResult<StatusCode> {
    if db.delete_user(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("user", id))
    }
}
