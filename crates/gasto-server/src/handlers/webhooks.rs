//! Payment provider webhook handlers
//!
//! Confirmation webhooks are the authoritative "this charge was paid"
//! signal. Providers retry failed deliveries aggressively, so malformed
//! payloads are acknowledged with 200 and ignored; only a recognized
//! confirmation writes the ledger, and an ignored event simply leaves
//! the report locked.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{info, warn};

use gasto_core::billing::PaymentProvider;

use crate::{AppError, AppState};

type HmacSha256 = Hmac<Sha256>;

/// Accepted skew between a Stripe signature timestamp and the clock
const STRIPE_TOLERANCE_SECS: i64 = 300;

/// Header carrying the Stripe signature
const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// The acknowledgement every webhook returns once past its guards
fn received() -> Response {
    Json(json!({ "received": true })).into_response()
}

fn provider_configured(state: &AppState, name: &str) -> bool {
    state
        .dispatcher
        .providers()
        .iter()
        .any(|provider| provider.name() == name)
}

/// POST /api/webhooks/woovi - PIX charge updates from Woovi
///
/// A charge reaching COMPLETED (or ACTIVE, which Woovi reports for some
/// instant confirmations) confirms the payment. The analysis id rides in
/// `additionalInfo`, with the correlation id as fallback.
pub async fn woovi_webhook(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    if !provider_configured(&state, "woovi") {
        return Err(AppError::internal("Webhook not configured"));
    }

    let Some(Json(event)) = body else {
        return Ok(received());
    };

    let charge = &event["charge"];
    let status = charge["status"].as_str().unwrap_or_default();
    if matches!(status, "COMPLETED" | "ACTIVE") {
        let from_info = charge["additionalInfo"].as_array().and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry["key"].as_str() == Some("analysisId"))
                .and_then(|entry| entry["value"].as_str())
        });

        let analysis_id = from_info
            .filter(|id| !id.is_empty())
            .or_else(|| charge["correlationID"].as_str().filter(|id| !id.is_empty()));

        if let Some(id) = analysis_id {
            let charge_id = charge["correlationID"].as_str().filter(|c| !c.is_empty());
            state.ledger.confirm(id, "woovi", charge_id)?;
            info!(analysis_id = %id, "Woovi payment confirmed");
        }
    }

    Ok(received())
}

/// POST /api/webhooks/abacatepay - Billing updates from AbacatePay
///
/// AbacatePay wraps billing fields in a `data` object; the bare shape
/// without the wrapper is accepted too. The analysis id rides in
/// `metadata`, with `externalId` as fallback.
pub async fn abacatepay_webhook(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Result<Response, AppError> {
    if !provider_configured(&state, "abacatepay") {
        return Err(AppError::internal("Webhook not configured"));
    }

    let Some(Json(event)) = body else {
        return Ok(received());
    };

    let billing = if event["data"].is_object() {
        &event["data"]
    } else {
        &event
    };

    let status = billing["status"].as_str().unwrap_or_default();
    if matches!(status, "COMPLETED" | "PAID") {
        let analysis_id = billing["metadata"]["analysisId"]
            .as_str()
            .filter(|id| !id.is_empty())
            .or_else(|| billing["externalId"].as_str().filter(|id| !id.is_empty()));

        if let Some(id) = analysis_id {
            let charge_id = billing["id"].as_str().filter(|c| !c.is_empty());
            state.ledger.confirm(id, "abacatepay", charge_id)?;
            info!(analysis_id = %id, "AbacatePay payment confirmed");
        }
    }

    Ok(received())
}

/// POST /api/webhooks/stripe - Checkout confirmations from Stripe
///
/// The raw body is verified against the `Stripe-Signature` header before
/// any parsing. Signature values never reach the logs.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        return Err(AppError::internal("Webhook not configured"));
    };

    let Ok(payload) = std::str::from_utf8(&body) else {
        warn!("Stripe webhook rejected: body is not UTF-8");
        return Err(AppError::bad_request("Invalid signature"));
    };

    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_stripe_signature(payload, signature, secret) {
        warn!("Stripe webhook rejected: signature verification failed");
        return Err(AppError::bad_request("Invalid signature"));
    }

    let Ok(event) = serde_json::from_str::<Value>(payload) else {
        return Ok(received());
    };

    if event["type"].as_str() == Some("checkout.session.completed") {
        let analysis_id = event["data"]["object"]["metadata"]["analysisId"]
            .as_str()
            .filter(|id| !id.is_empty());

        if let Some(id) = analysis_id {
            let session_id = event["data"]["object"]["id"].as_str();
            state.ledger.confirm(id, "stripe", session_id)?;
            info!(analysis_id = %id, "Stripe payment confirmed");
        }
    }

    Ok(received())
}

/// Verify a Stripe-style `t=...,v1=...` signature header
///
/// The signed payload is `"{timestamp}.{body}"` under HMAC-SHA256 with
/// the `whsec_`-stripped secret. Timestamps more than five minutes from
/// the clock are rejected to bound replays.
fn verify_stripe_signature(payload: &str, signature: &str, secret: &str) -> bool {
    use subtle::ConstantTimeEq;

    let mut timestamp: Option<i64> = None;
    let mut candidate: Option<&str> = None;

    for part in signature.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => timestamp = value.parse().ok(),
            (Some("v1"), Some(value)) => candidate = Some(value),
            _ => {}
        }
    }

    let (Some(timestamp), Some(candidate)) = (timestamp, candidate) else {
        return false;
    };

    let now = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => return false,
    };
    if (now - timestamp).abs() > STRIPE_TOLERANCE_SECS {
        return false;
    }

    let secret_key = secret.strip_prefix("whsec_").unwrap_or(secret);
    let signed_payload = format!("{}.{}", timestamp, payload);

    let Ok(mut mac) = HmacSha256::new_from_slice(secret_key.as_bytes()) else {
        return false;
    };
    mac.update(signed_payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_testsecret";

    fn sign(payload: &str, timestamp: i64, secret: &str) -> String {
        let key = secret.strip_prefix("whsec_").unwrap_or(secret);
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    fn unix_now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, unix_now(), SECRET);
        assert!(verify_stripe_signature(payload, &header, SECRET));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, unix_now(), "whsec_othersecret");
        assert!(!verify_stripe_signature(payload, &header, SECRET));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign(r#"{"amount":500}"#, unix_now(), SECRET);
        assert!(!verify_stripe_signature(r#"{"amount":9999}"#, &header, SECRET));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, unix_now() - 600, SECRET);
        assert!(!verify_stripe_signature(payload, &header, SECRET));
    }

    #[test]
    fn test_garbage_header_rejected() {
        assert!(!verify_stripe_signature("{}", "not-a-signature", SECRET));
        assert!(!verify_stripe_signature("{}", "", SECRET));
        assert!(!verify_stripe_signature("{}", "t=abc,v1=", SECRET));
    }

    #[test]
    fn test_extra_signature_schemes_ignored() {
        let payload = r#"{"ok":true}"#;
        let now = unix_now();
        let signed = sign(payload, now, SECRET);
        // Stripe sends v0 entries alongside v1 during migrations
        let header = format!("{},v0=deadbeef", signed);
        assert!(verify_stripe_signature(payload, &header, SECRET));
    }
}
