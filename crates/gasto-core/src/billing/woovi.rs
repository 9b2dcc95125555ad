//! Woovi backend implementation
//!
//! Creates a PIX charge through Woovi's `/api/v1/charge` endpoint. The
//! reply's `brCode` (copy-paste PIX code) doubles as the payment URL, with
//! the hosted QR image as a fallback.
//!
//! # Configuration
//!
//! Environment variables:
//! - `WOOVI_API_KEY`: AppID credential (required; empty string counts as
//!   unset). Woovi expects it bare in the Authorization header, no Bearer
//!   prefix.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BillingError, ChargeDescriptor, ChargeRequest, PaymentProvider, REQUEST_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://api.woovi.com";
const CHARGE_COMMENT: &str = "Análise Completa de Assinaturas - Gasto Recorrente";
const PRODUCT_DESCRIPTION: &str = "Relatório detalhado de gastos recorrentes";
const CUSTOMER_NAME: &str = "Cliente Gasto Recorrente";
const CUSTOMER_EMAIL: &str = "cliente@gastorecorrente.shop";

/// Woovi backend
#[derive(Clone)]
pub struct WooviBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl WooviBackend {
    /// Create a new Woovi backend
    pub fn new(api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Override the API base URL (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Create from environment variables
    ///
    /// Required: `WOOVI_API_KEY`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("WOOVI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(&api_key))
    }
}

/// Charge creation request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChargeRequest {
    #[serde(rename = "correlationID")]
    correlation_id: String,
    value: u32,
    comment: String,
    customer: Customer,
    additional_info: Vec<InfoEntry>,
}

#[derive(Debug, Serialize)]
struct Customer {
    name: &'static str,
    email: &'static str,
}

#[derive(Debug, Serialize)]
struct InfoEntry {
    key: &'static str,
    value: String,
}

/// Charge creation response
#[derive(Debug, Deserialize)]
struct CreateChargeResponse {
    #[serde(default)]
    charge: Option<Charge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Charge {
    #[serde(rename = "correlationID", default)]
    correlation_id: Option<String>,
    #[serde(default)]
    br_code: Option<String>,
    #[serde(default)]
    qr_code_image: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    value: Option<u32>,
}

fn charge_body(request: &ChargeRequest) -> CreateChargeRequest {
    CreateChargeRequest {
        correlation_id: request.correlation_id.clone(),
        value: request.value,
        comment: CHARGE_COMMENT.to_string(),
        customer: Customer {
            name: CUSTOMER_NAME,
            email: CUSTOMER_EMAIL,
        },
        additional_info: vec![
            InfoEntry {
                key: "Produto",
                value: PRODUCT_DESCRIPTION.to_string(),
            },
            InfoEntry {
                key: "analysisId",
                value: request.analysis_id.clone().unwrap_or_default(),
            },
        ],
    }
}

/// Map the provider charge into the agnostic descriptor
///
/// `brCode` wins as the payment URL, the hosted QR image is the fallback; a
/// charge with neither is unusable and counts as a rejection.
fn map_charge(request: &ChargeRequest, charge: Charge) -> Result<ChargeDescriptor, BillingError> {
    let qr_code = charge.br_code;
    let payment_url = qr_code.clone().or(charge.qr_code_image).ok_or_else(|| {
        BillingError::ProviderRejected {
            provider: "woovi".to_string(),
            detail: "charge missing payment URL".to_string(),
        }
    })?;

    Ok(ChargeDescriptor {
        provider: "woovi".to_string(),
        charge_id: charge
            .correlation_id
            .unwrap_or_else(|| request.correlation_id.clone()),
        payment_url,
        qr_code,
        status: charge.status.unwrap_or_default(),
        value: charge.value.unwrap_or(request.value),
    })
}

#[async_trait]
impl PaymentProvider for WooviBackend {
    async fn create_charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeDescriptor, BillingError> {
        let response = self
            .http_client
            .post(format!("{}/api/v1/charge", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", &self.api_key)
            .json(&charge_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::from_status("woovi", status, body));
        }

        let reply: CreateChargeResponse =
            response
                .json()
                .await
                .map_err(|e| BillingError::ProviderRejected {
                    provider: "woovi".to_string(),
                    detail: format!("invalid reply envelope: {e}"),
                })?;

        let charge = reply.charge.ok_or_else(|| BillingError::ProviderRejected {
            provider: "woovi".to_string(),
            detail: "reply missing charge object".to_string(),
        })?;

        map_charge(request, charge)
    }

    fn name(&self) -> &str {
        "woovi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChargeRequest {
        ChargeRequest::new(Some("abc123"))
    }

    #[test]
    fn test_from_env_missing() {
        std::env::remove_var("WOOVI_API_KEY");
        assert!(WooviBackend::from_env().is_none());
    }

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_value(charge_body(&request())).unwrap();

        assert_eq!(json["correlationID"], "abc123");
        assert_eq!(json["value"], 500);
        assert_eq!(
            json["comment"],
            "Análise Completa de Assinaturas - Gasto Recorrente"
        );
        assert_eq!(json["customer"]["name"], "Cliente Gasto Recorrente");
        assert_eq!(json["customer"]["email"], "cliente@gastorecorrente.shop");
        assert_eq!(json["additionalInfo"][0]["key"], "Produto");
        assert_eq!(json["additionalInfo"][1]["key"], "analysisId");
        assert_eq!(json["additionalInfo"][1]["value"], "abc123");
    }

    #[test]
    fn test_request_without_analysis_id_sends_empty_value() {
        let request = ChargeRequest {
            correlation_id: "analysis-1700000000000".into(),
            analysis_id: None,
            value: 500,
        };
        let json = serde_json::to_value(charge_body(&request)).unwrap();
        assert_eq!(json["additionalInfo"][1]["value"], "");
    }

    #[test]
    fn test_map_charge_prefers_br_code() {
        let charge = Charge {
            correlation_id: Some("abc123".into()),
            br_code: Some("00020126brcode".into()),
            qr_code_image: Some("https://api.woovi.com/qr/abc.png".into()),
            status: Some("ACTIVE".into()),
            value: Some(500),
        };
        let descriptor = map_charge(&request(), charge).unwrap();

        assert_eq!(descriptor.provider, "woovi");
        assert_eq!(descriptor.charge_id, "abc123");
        assert_eq!(descriptor.payment_url, "00020126brcode");
        assert_eq!(descriptor.qr_code.as_deref(), Some("00020126brcode"));
        assert_eq!(descriptor.status, "ACTIVE");
        assert_eq!(descriptor.value, 500);
    }

    #[test]
    fn test_map_charge_falls_back_to_qr_image() {
        let charge = Charge {
            correlation_id: Some("abc123".into()),
            br_code: None,
            qr_code_image: Some("https://api.woovi.com/qr/abc.png".into()),
            status: Some("ACTIVE".into()),
            value: Some(500),
        };
        let descriptor = map_charge(&request(), charge).unwrap();

        assert_eq!(descriptor.payment_url, "https://api.woovi.com/qr/abc.png");
        assert!(descriptor.qr_code.is_none());
    }

    #[test]
    fn test_map_charge_without_payment_url_is_rejected() {
        let charge = Charge {
            correlation_id: Some("abc123".into()),
            br_code: None,
            qr_code_image: None,
            status: Some("ACTIVE".into()),
            value: Some(500),
        };
        let err = map_charge(&request(), charge).unwrap_err();
        assert!(matches!(err, BillingError::ProviderRejected { .. }));
    }

    #[test]
    fn test_response_without_charge_object() {
        let reply: CreateChargeResponse =
            serde_json::from_str(r#"{"error": "invalid AppID"}"#).unwrap();
        assert!(reply.charge.is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "charge": {
                "correlationID": "abc123",
                "brCode": "00020126brcode",
                "qrCodeImage": "https://api.woovi.com/qr/abc.png",
                "status": "ACTIVE",
                "value": 500,
                "paymentLinkUrl": "https://woovi.com/pay/abc"
            }
        }"#;
        let reply: CreateChargeResponse = serde_json::from_str(json).unwrap();
        let charge = reply.charge.unwrap();
        assert_eq!(charge.correlation_id.as_deref(), Some("abc123"));
        assert_eq!(charge.br_code.as_deref(), Some("00020126brcode"));
    }

    #[tokio::test]
    async fn test_create_charge_unreachable_is_network_error() {
        let backend = WooviBackend::new("app-id").with_base_url("http://localhost:99999");
        let err = backend.create_charge(&request()).await.unwrap_err();
        assert!(matches!(err, BillingError::Network(_)));
    }
}
