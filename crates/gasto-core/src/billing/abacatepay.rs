//! AbacatePay backend implementation
//!
//! Creates a one-time PIX billing through `/v1/billing/create`. Unlike
//! Woovi there is no PIX copy-paste code in the reply; the `url` field is a
//! hosted payment page the client is sent to, and the completion URL brings
//! it back with the success flag already set.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ABACATEPAY_API_KEY`: API key (required; empty string counts as unset)
//! - `SITE_URL`: return/completion URL base (default:
//!   https://gastorecorrente.shop)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BillingError, ChargeDescriptor, ChargeRequest, PaymentProvider, REQUEST_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://api.abacatepay.com";
const DEFAULT_SITE_URL: &str = "https://gastorecorrente.shop";
const PRODUCT_NAME: &str = "Análise Completa de Assinaturas";
const PRODUCT_DESCRIPTION: &str =
    "Relatório detalhado de gastos recorrentes identificados no seu extrato";

/// AbacatePay backend
#[derive(Clone)]
pub struct AbacatePayBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    site_url: String,
}

impl AbacatePayBackend {
    /// Create a new AbacatePay backend
    pub fn new(api_key: &str, site_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            site_url: site_url.to_string(),
        }
    }

    /// Override the API base URL (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Create from environment variables
    ///
    /// Required: `ABACATEPAY_API_KEY`. Optional: `SITE_URL` (return URL
    /// base)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("ABACATEPAY_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let site_url =
            std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());
        Some(Self::new(&api_key, &site_url))
    }
}

/// Billing creation request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBillingRequest {
    frequency: &'static str,
    methods: Vec<&'static str>,
    products: Vec<Product>,
    return_url: String,
    completion_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    external_id: String,
    name: &'static str,
    description: &'static str,
    price: u32,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct Metadata {
    #[serde(rename = "analysisId", skip_serializing_if = "Option::is_none")]
    analysis_id: Option<String>,
    source: &'static str,
}

/// Billing creation response
#[derive(Debug, Deserialize)]
struct CreateBillingResponse {
    // Error payloads vary between a plain string and an object
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<BillingData>,
}

#[derive(Debug, Deserialize)]
struct BillingData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    amount: Option<u32>,
    #[serde(default)]
    status: Option<String>,
}

fn billing_body(request: &ChargeRequest, site_url: &str) -> CreateBillingRequest {
    CreateBillingRequest {
        frequency: "ONE_TIME",
        methods: vec!["PIX"],
        products: vec![Product {
            external_id: request
                .analysis_id
                .clone()
                .unwrap_or_else(|| "analysis".to_string()),
            name: PRODUCT_NAME,
            description: PRODUCT_DESCRIPTION,
            price: request.value,
            quantity: 1,
        }],
        return_url: site_url.to_string(),
        completion_url: format!("{site_url}?payment_success=true&method=pix"),
        external_id: request.analysis_id.clone(),
        metadata: Metadata {
            analysis_id: request.analysis_id.clone(),
            source: "gasto-recorrente",
        },
    }
}

/// Map the provider billing into the agnostic descriptor
fn map_billing(
    request: &ChargeRequest,
    data: BillingData,
) -> Result<ChargeDescriptor, BillingError> {
    let payment_url = data.url.ok_or_else(|| BillingError::ProviderRejected {
        provider: "abacatepay".to_string(),
        detail: "billing missing payment URL".to_string(),
    })?;

    Ok(ChargeDescriptor {
        provider: "abacatepay".to_string(),
        charge_id: data.id.unwrap_or_else(|| request.correlation_id.clone()),
        payment_url,
        qr_code: None,
        status: data.status.unwrap_or_default(),
        value: data.amount.unwrap_or(request.value),
    })
}

#[async_trait]
impl PaymentProvider for AbacatePayBackend {
    async fn create_charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeDescriptor, BillingError> {
        let response = self
            .http_client
            .post(format!("{}/v1/billing/create", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&billing_body(request, &self.site_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::from_status("abacatepay", status, body));
        }

        let reply: CreateBillingResponse =
            response
                .json()
                .await
                .map_err(|e| BillingError::ProviderRejected {
                    provider: "abacatepay".to_string(),
                    detail: format!("invalid reply envelope: {e}"),
                })?;

        if let Some(error) = reply.error {
            let detail = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(BillingError::ProviderRejected {
                provider: "abacatepay".to_string(),
                detail,
            });
        }

        let data = reply.data.ok_or_else(|| BillingError::ProviderRejected {
            provider: "abacatepay".to_string(),
            detail: "reply missing billing data".to_string(),
        })?;

        map_billing(request, data)
    }

    fn name(&self) -> &str {
        "abacatepay"
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
        std::env::remove_var("ABACATEPAY_API_KEY");
        assert!(AbacatePayBackend::from_env().is_none());
    }

    #[test]
    fn test_request_serialization() {
        let json =
            serde_json::to_value(billing_body(&request(), "https://gastorecorrente.shop")).unwrap();

        assert_eq!(json["frequency"], "ONE_TIME");
        assert_eq!(json["methods"], serde_json::json!(["PIX"]));
        assert_eq!(json["products"][0]["externalId"], "abc123");
        assert_eq!(json["products"][0]["name"], "Análise Completa de Assinaturas");
        assert_eq!(json["products"][0]["price"], 500);
        assert_eq!(json["products"][0]["quantity"], 1);
        assert_eq!(json["returnUrl"], "https://gastorecorrente.shop");
        assert_eq!(
            json["completionUrl"],
            "https://gastorecorrente.shop?payment_success=true&method=pix"
        );
        assert_eq!(json["externalId"], "abc123");
        assert_eq!(json["metadata"]["analysisId"], "abc123");
        assert_eq!(json["metadata"]["source"], "gasto-recorrente");
    }

    #[test]
    fn test_request_without_analysis_id_omits_external_id() {
        let request = ChargeRequest {
            correlation_id: "analysis-1700000000000".into(),
            analysis_id: None,
            value: 500,
        };
        let json = serde_json::to_value(billing_body(&request, "https://example.com")).unwrap();

        assert!(json.get("externalId").is_none());
        assert!(json["metadata"].get("analysisId").is_none());
        assert_eq!(json["metadata"]["source"], "gasto-recorrente");
        // The product line still needs a stable external id.
        assert_eq!(json["products"][0]["externalId"], "analysis");
    }

    #[test]
    fn test_map_billing() {
        let data = BillingData {
            id: Some("bill_123".into()),
            url: Some("https://pay.abacatepay.com/bill_123".into()),
            amount: Some(500),
            status: Some("PENDING".into()),
        };
        let descriptor = map_billing(&request(), data).unwrap();

        assert_eq!(descriptor.provider, "abacatepay");
        assert_eq!(descriptor.charge_id, "bill_123");
        assert_eq!(descriptor.payment_url, "https://pay.abacatepay.com/bill_123");
        assert!(descriptor.qr_code.is_none());
        assert_eq!(descriptor.status, "PENDING");
    }

    #[test]
    fn test_map_billing_without_url_is_rejected() {
        let data = BillingData {
            id: Some("bill_123".into()),
            url: None,
            amount: Some(500),
            status: Some("PENDING".into()),
        };
        let err = map_billing(&request(), data).unwrap_err();
        assert!(matches!(err, BillingError::ProviderRejected { .. }));
    }

    #[test]
    fn test_response_error_field() {
        let reply: CreateBillingResponse =
            serde_json::from_str(r#"{"error": "invalid api key"}"#).unwrap();
        assert_eq!(reply.error.unwrap().as_str(), Some("invalid api key"));
        assert!(reply.data.is_none());
    }

    #[test]
    fn test_response_data_field() {
        let json = r#"{
            "error": null,
            "data": {
                "id": "bill_123",
                "url": "https://pay.abacatepay.com/bill_123",
                "amount": 500,
                "status": "PENDING",
                "devMode": true
            }
        }"#;
        let reply: CreateBillingResponse = serde_json::from_str(json).unwrap();
        assert!(reply.error.is_none());
        assert_eq!(reply.data.unwrap().id.as_deref(), Some("bill_123"));
    }

    #[tokio::test]
    async fn test_create_charge_unreachable_is_network_error() {
        let backend = AbacatePayBackend::new("key", "https://example.com")
            .with_base_url("http://localhost:99999");
        let err = backend.create_charge(&request()).await.unwrap_err();
        assert!(matches!(err, BillingError::Network(_)));
    }
}
