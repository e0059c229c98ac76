use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{require_text, DepthQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::{Database, TaskFilter};
use crate::models::*;

/// Query parameters for listing tasks.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub project_id: Option<DbId>,
    pub archived: Option<bool>,
    pub query: Option<String>,
    pub depth: Option<usize>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<TaskForest>> {
    let depth = state.config.depth(query.depth);
    let filter = TaskFilter {
        project_id: query.project_id,
        archived: query.archived,
        query: query.query,
    };
    Ok(Json(state.db.get_tasks(&filter, depth)?))
}

pub async fn list_user_tasks(
    State(db): State<Database>,
    Path(user_id): Path<DbId>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(db.get_user_tasks(user_id)?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<DepthQuery>,
) -> ApiResult<Json<TaskDetail>> {
    let depth = state.config.depth(query.depth);
    state
        .db
        .get_task_detail(id, depth)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("task", id))
}

pub async fn create_task(
    State(db): State<Database>,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    require_text("title", &input.title)?;
    let task = db.create_task(input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<Json<Task>> {
    if let Some(title) = &input.title {
        require_text("title", title)?;
    }
    db.update_task(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("task", id))
}

pub async fn delete_task(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<StatusCode> {
    if db.delete_task(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("task", id))
    }
}

// ============================================================
// Hierarchy moves
// ============================================================

pub async fn assign_task_to_layer(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignLayerInput>,
) -> ApiResult<Json<Task>> {
    Ok(Json(db.assign_task_to_layer(id, input)?))
}

pub async fn drop_task_onto_task(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<DropTaskInput>,
) -> ApiResult<Json<Task>> {
    Ok(Json(db.drop_task_onto_task(id, input)?))
}

pub async fn reparent_task(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<ReparentTaskInput>,
) -> ApiResult<Json<Task>> {
    Ok(Json(db.reparent_task(id, input)?))
}

pub async fn update_task_status(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTaskStatusInput>,
) -> ApiResult<Json<Task>> {
    db.update_task_status(id, input.status)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("task", id))
}

pub async fn add_attachment(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateAttachmentInput>,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    require_text("fileName", &input.file_name)?;
    let attachment = db.add_attachment(id, input)?;
    Ok((StatusCode::CREATED, Json(attachment)))
}
