use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::error::ApiResult;
use crate::db::Database;
use crate::models::SearchResults;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

pub async fn search(
    State(db): State<Database>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResults>> {
    Ok(Json(db.search(&query.query)?))
}
