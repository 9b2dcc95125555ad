//! Payment return and verification handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use gasto_core::paywall::{PaymentReturn, ReturnOutcome};

use crate::client_ip::client_ip;
use crate::{AppError, AppState};

/// GET /api/payments/return - Run the paywall gatekeeper on a redirect
///
/// The payment provider redirects the client back with
/// `?payment_success=true&method=...` or `?payment_cancelled=true`; this
/// endpoint decides whether that actually unlocks anything.
pub async fn payment_return(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(ret): Query<PaymentReturn>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));

    let body = match state.gate.handle_return(&ip, &ret)? {
        ReturnOutcome::Unlocked { analysis, method } => json!({
            "status": "unlocked",
            "method": method,
            "analysis": analysis,
        }),
        ReturnOutcome::Rejected(reason) => json!({
            "status": "rejected",
            "reason": reason.message(),
        }),
        ReturnOutcome::Cancelled => json!({ "status": "cancelled" }),
        ReturnOutcome::Idle => json!({ "status": "idle" }),
    };

    Ok(Json(body))
}

/// Query params for payment verification
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    #[serde(default)]
    pub analysis_id: Option<String>,
}

/// GET /api/payments/verify - Check the webhook confirmation ledger
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let analysis_id = query
        .analysis_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("analysisId is required"))?;

    let paid = state.ledger.verify(&analysis_id)?;
    Ok(Json(json!({ "paid": paid })))
}
