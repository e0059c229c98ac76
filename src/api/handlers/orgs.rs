use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::require_text;
use crate::api::error::{ApiError, ApiResult};
use crate::db::Database;
use crate::models::*;

pub async fn list_orgs(State(db): State<Database>) -> ApiResult<Json<Vec<OrgSummary>>> {
    Ok(Json(db.get_all_orgs()?))
}

pub async fn get_org(
    State(db): State<Database>,
    Path(id): Path<DbId>,
) -> ApiResult<Json<OrgDetail>> {
    db.get_org(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("org", id))
}

pub async fn create_org(
    State(db): State<Database>,
    Json(input): Json<CreateOrgInput>,
) -> ApiResult<(StatusCode, Json<Org>)> {
    require_text("orgName", &input.org_name)?;
    let org = db.create_org(input)?;
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn update_org(
    State(db): State<Database>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrgInput>,
) -> ApiResult<Json<Org>> {
    db.update_org(id, input)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("org", id))
}

pub async fn delete_org(State(db): State<Database>, Path(id): Path<DbId>) -> ApiResult<StatusCode> {
    if db.delete_org(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("org", id))
    }
}
