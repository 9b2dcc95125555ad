//! Unlocked report access and the canned demo

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use gasto_core::demo::demo_report;
use gasto_core::models::AnalysisResult;

use crate::{AppError, AppState};

/// GET /api/reports/:id - Fetch an unlocked report copy
///
/// Only reports that went through a successful payment return exist
/// here; anything else is a 404, including ids that were analyzed but
/// never paid for.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResult>, AppError> {
    state
        .gate
        .report(&id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Report not found"))
}

/// GET /api/demo - Sample report for the demo flow
pub async fn demo() -> Json<AnalysisResult> {
    Json(demo_report())
}
