//! Cheaper alternative suggestions

use axum::{extract::Query, Json};
use serde::Deserialize;

use gasto_core::alternatives::{suggest, Alternative};

/// Query params for alternative lookup
#[derive(Debug, Deserialize)]
pub struct AlternativesQuery {
    #[serde(default)]
    pub service: String,
}

/// GET /api/alternatives?service= - Suggestions for one service
pub async fn list_alternatives(Query(query): Query<AlternativesQuery>) -> Json<Vec<Alternative>> {
    Json(suggest(&query.service))
}
