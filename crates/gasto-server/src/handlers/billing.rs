//! PIX billing handlers
//!
//! Ordering matters here: origin and CSRF rejections come before the
//! rate limit, so a flood of forged requests cannot starve legitimate
//! clients of their window.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gasto_core::billing::{BillingError, ChargeDescriptor};

use crate::client_ip::client_ip;
use crate::{too_many_requests, AppError, AppState, CSRF_TOKEN_HEADER};

/// Request body for charge creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRequest {
    #[serde(default)]
    pub analysis_id: Option<String>,
}

/// Response body for a created charge
#[derive(Debug, Serialize)]
pub struct BillingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub charge: ChargeDescriptor,
}

/// Same-origin check: a request with no Origin header passes (non-browser
/// clients), a mismatched one is rejected unless it points at localhost.
fn origin_allowed(headers: &HeaderMap, site_url: &str) -> bool {
    match headers.get(header::ORIGIN).and_then(|v| v.to_str().ok()) {
        Some(origin) if !origin.is_empty() => {
            origin.starts_with(site_url) || origin.contains("localhost")
        }
        _ => true,
    }
}

/// Token format check. The client mints 32 random bytes hex-encoded per
/// session, so anything other than 64 hex characters is forged or
/// corrupted.
fn csrf_token_valid(headers: &HeaderMap) -> bool {
    match headers.get(CSRF_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(token) => token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// POST /api/billing - Create the PIX charge that unlocks a report
///
/// Also registers the pending payment marker for the requesting client
/// when an analysis id is supplied, so the payment return knows what to
/// unlock.
pub async fn create_billing(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Option<Json<BillingRequest>>,
) -> Result<Response, AppError> {
    if !origin_allowed(&headers, &state.config.site_url) {
        warn!("Billing request rejected: cross-origin");
        return Err(AppError::forbidden("Forbidden"));
    }

    if !csrf_token_valid(&headers) {
        warn!("Billing request rejected: missing or malformed CSRF token");
        return Err(AppError::forbidden("Invalid CSRF token"));
    }

    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));
    if !state.billing_limiter.check(&ip, &state.config.billing_limit)? {
        return too_many_requests(&state.billing_limiter, &ip, &state.config.billing_limit);
    }

    if !state.dispatcher.is_configured() {
        return Err(AppError::internal("Payment service not configured"));
    }

    let analysis_id = body
        .and_then(|Json(req)| req.analysis_id)
        .filter(|id| !id.is_empty());

    match state.dispatcher.create_charge(analysis_id.as_deref()).await {
        Ok(charge) => {
            if let Some(id) = &analysis_id {
                state.gate.prepare_payment(&ip, id)?;
            }

            info!(
                client = %ip,
                provider = %charge.provider,
                charge_id = %charge.charge_id,
                "Unlock charge created"
            );

            Ok(Json(BillingResponse {
                success: true,
                charge,
            })
            .into_response())
        }
        Err(BillingError::Unconfigured) => {
            Err(AppError::internal("Payment service not configured"))
        }
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "Charge creation failed");
            Err(AppError::internal("Failed to create charge"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_origin(origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        headers
    }

    #[test]
    fn test_origin_allowed_same_site() {
        let headers = headers_with_origin("https://gastorecorrente.shop");
        assert!(origin_allowed(&headers, "https://gastorecorrente.shop"));
    }

    #[test]
    fn test_origin_allowed_localhost() {
        let headers = headers_with_origin("http://localhost:3000");
        assert!(origin_allowed(&headers, "https://gastorecorrente.shop"));
    }

    #[test]
    fn test_origin_rejected_cross_site() {
        let headers = headers_with_origin("https://evil.example.com");
        assert!(!origin_allowed(&headers, "https://gastorecorrente.shop"));
    }

    #[test]
    fn test_origin_missing_passes() {
        assert!(origin_allowed(
            &HeaderMap::new(),
            "https://gastorecorrente.shop"
        ));
    }

    #[test]
    fn test_csrf_token_valid_hex() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CSRF_TOKEN_HEADER,
            HeaderValue::from_str(&"ab".repeat(32)).unwrap(),
        );
        assert!(csrf_token_valid(&headers));
    }

    #[test]
    fn test_csrf_token_rejects_wrong_length() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CSRF_TOKEN_HEADER,
            HeaderValue::from_str(&"ab".repeat(16)).unwrap(),
        );
        assert!(!csrf_token_valid(&headers));
    }

    #[test]
    fn test_csrf_token_rejects_non_hex() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CSRF_TOKEN_HEADER,
            HeaderValue::from_str(&"zz".repeat(32)).unwrap(),
        );
        assert!(!csrf_token_valid(&headers));
    }

    #[test]
    fn test_csrf_token_rejects_missing() {
        assert!(!csrf_token_valid(&HeaderMap::new()));
    }
}
