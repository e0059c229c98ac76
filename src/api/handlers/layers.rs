use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::Database;
use crate::hierarchy::HierarchyInstance;
use crate::models::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersQuery {
    pub project_id: DbId,
    pub depth: Option<usize>,
}

pub async fn list_layers(
    State(state): State<AppState>,
    Query(query): Query<LayersQuery>,
) -> ApiResult<Json<Vec<LayerWithTasks>>> {
    let depth = state.config.depth(query.depth);
    Ok(Json(state.db.get_layers_with_tasks(query.project_id, depth)?))
}

pub async fn get_layout(
    State(state): State<AppState>,
    Query(query): Query<LayersQuery>,
) -> ApiResult<Json<Vec<HierarchyInstance>>> {
    let depth = state.config.depth(query.depth);
    Ok(Json(state.db.get_layout(query.project_id, depth)?))
}

pub async fn create_layer(
    State(db): State<Database>,
    Json(input): Json<CreateLayerInput>,
) -> ApiResult<(StatusCode, Json<TaskLayer>)> {
    require_text("name", &input.name)?;
    let layer = db.create_layer(input)?;
    Ok((StatusCode::CREATED, Json(layer)))
}

pub async fn rename_layer(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLayerInput>,
) -> ApiResult<Json<TaskLayer>> {
    require_text("name", &input.name)?;
    db.rename_layer(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("layer", id))
}

/// Returns the deleted layer.
pub async fn delete_layer(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<TaskLayer>> {
    db.delete_layer(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("layer", id))
}
