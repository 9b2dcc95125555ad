//! Statement analysis handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use gasto_core::ai::ExtractError;
use gasto_core::analysis::{aggregate, normalize_items};
use gasto_core::models::ExtractionReply;

use crate::client_ip::client_ip;
use crate::{too_many_requests, AppError, AppState};

/// Request body for statement analysis
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// POST /api/analyze - Run statement text through the provider chain
///
/// The rate limit is charged before input validation so malformed floods
/// spend their quota too. On success the server aggregates the raw
/// extraction into a locked report and hands back its id; the report
/// itself stays behind the paywall.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Option<Json<AnalyzeRequest>>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));

    if !state
        .extraction_limiter
        .check(&ip, &state.config.extraction_limit)?
    {
        return too_many_requests(&state.extraction_limiter, &ip, &state.config.extraction_limit);
    }

    let text = body.and_then(|Json(req)| req.text).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::bad_request("Text is required"));
    }

    match state.orchestrator.extract(&text).await {
        Ok(extraction) => {
            let analysis = aggregate(normalize_items(&extraction.subs));
            state.gate.record_analysis(&analysis)?;

            info!(
                client = %ip,
                provider = %extraction.provider,
                subscriptions = analysis.subscription_count,
                analysis_id = %analysis.id,
                "Statement analyzed"
            );

            let body = json!({
                "success": true,
                "data": ExtractionReply {
                    subs: extraction.subs,
                },
                "provider": extraction.provider,
                "analysisId": analysis.id,
            });
            Ok(Json(body).into_response())
        }
        Err(err) => {
            error!(client = %ip, error = %err, "Extraction failed");

            let ExtractError::AllProvidersFailed { ref last_error, .. } = err;
            let body = json!({
                "error": "All AI providers failed",
                "details": last_error.to_string(),
            });
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// GET /api/health - Liveness probe with the provider chain size
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "providers": state.orchestrator.providers().len(),
    }))
}
