use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn list_projects(State(db): State<Database>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(db.get_all_projects()?))
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<ProjectDetail>> {
    db.get_project_detail(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("project", id))
}

/// `POST /projects` body: the project fields plus the view types to create.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub project: CreateProjectInput,
    #[serde(default)]
    pub views: Vec<ViewType>,
}

pub async fn create_project(
    State(db): State<Database>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    require_text("name", &request.project.name)?;
    let mut input = request.project;
    input.views.extend(request.views);
    let project = db.create_project(input)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectInput>,
) -> ApiResult<Json<Project>> {
    if let Some(name) = &input.name {
        require_text("name", name)?;
    }
    db.update_project(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("project", id))
}

pub async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<StatusCode> {
    if db.delete_project(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("project", id))
    }
}

pub async fn update_project_members(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectMembersInput>,
) -> ApiResult<Json<Project>> {
    db.update_project_members(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("project", id))
}

/// Rewrite the display order of the project's layers.
pub async fn reorder_layers(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<ReorderLayersInput>,
) -> ApiResult<Json<Vec<TaskLayer>>> {
    Ok(Json(db.reorder_layers(id, input)?))
}
