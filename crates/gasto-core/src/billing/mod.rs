//! PIX payment provider abstraction
//!
//! Unlocking a report costs a fixed R$ 5,00 charge. Each payment provider
//! gets a thin adapter that creates the charge and maps the reply into a
//! provider-agnostic [`ChargeDescriptor`]; the dispatcher tries them in
//! priority order.
//!
//! # Architecture
//!
//! - `PaymentProvider` trait: defines the interface all adapters implement
//! - `PaymentClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Adapter implementations: `WooviBackend`, `AbacatePayBackend`,
//!   `MockPaymentBackend`
//! - `BillingDispatcher`: primary-then-secondary fallback, same correlation
//!   id on every attempt
//!
//! # Configuration
//!
//! Environment variables (server-side only; keys never appear in responses,
//! logs, or error text):
//! - `WOOVI_API_KEY`: enables the Woovi entry (primary)
//! - `ABACATEPAY_API_KEY`: enables the AbacatePay entry (secondary)
//! - `SITE_URL`: return/completion URL base for AbacatePay

mod abacatepay;
mod mock;
mod woovi;

pub use abacatepay::AbacatePayBackend;
pub use mock::MockPaymentBackend;
pub use woovi::WooviBackend;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Per-request deadline for every charge-creation call
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Unlock price in centavos (R$ 5,00)
pub const CHARGE_VALUE_CENTAVOS: u32 = 500;

/// How a single charge-creation attempt failed
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("payment provider is not configured")]
    Unconfigured,
    #[error("{provider} rejected the charge: {detail}")]
    ProviderRejected { provider: String, detail: String },
    #[error("payment provider request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl BillingError {
    /// Short label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::ProviderRejected { .. } => "rejected",
            Self::Network(_) => "network",
        }
    }

    /// Maps a non-success HTTP status to a rejection.
    ///
    /// The body is kept for generic rejections only; 401/403 bodies are
    /// dropped so credential echoes can never reach logs.
    pub(crate) fn from_status(provider: &str, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::ProviderRejected {
                provider: provider.to_string(),
                detail: format!("credentials rejected (HTTP {})", status.as_u16()),
            },
            code => Self::ProviderRejected {
                provider: provider.to_string(),
                detail: format!("HTTP {code}: {}", truncate(&body)),
            },
        }
    }
}

/// Cap rejection detail so a full provider error page never lands in a log
/// line
fn truncate(s: &str) -> String {
    const LIMIT: usize = 200;
    if s.chars().count() <= LIMIT {
        return s.to_string();
    }
    let cut: String = s.chars().take(LIMIT).collect();
    format!("{cut}...")
}

/// One charge to create, already priced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Provider-side correlation id: the analysis id when present, a
    /// generated fallback otherwise
    pub correlation_id: String,
    /// Analysis id as received; threads into provider metadata so webhooks
    /// can map back
    pub analysis_id: Option<String>,
    /// Price in centavos
    pub value: u32,
}

impl ChargeRequest {
    /// Price the fixed report unlock for an analysis.
    ///
    /// An absent or empty analysis id gets an `analysis-{timestamp}`
    /// correlation id so the charge is still traceable.
    pub fn new(analysis_id: Option<&str>) -> Self {
        let analysis_id = analysis_id
            .map(str::to_string)
            .filter(|id| !id.is_empty());
        let correlation_id = analysis_id
            .clone()
            .unwrap_or_else(|| format!("analysis-{}", Utc::now().timestamp_millis()));
        Self {
            correlation_id,
            analysis_id,
            value: CHARGE_VALUE_CENTAVOS,
        }
    }
}

/// Provider-agnostic charge, ready for the client to pay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeDescriptor {
    /// Lowercase provider tag ("woovi", "abacatepay")
    pub provider: String,
    pub charge_id: String,
    /// PIX copy-paste code or hosted payment page
    pub payment_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    pub status: String,
    pub value: u32,
}

/// Trait defining the interface for all payment providers
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a charge and map the provider reply into a descriptor
    async fn create_charge(&self, request: &ChargeRequest)
        -> Result<ChargeDescriptor, BillingError>;

    /// Lowercase provider tag used in logs and the charge descriptor
    fn name(&self) -> &str;
}

/// Concrete payment client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum PaymentClient {
    /// Woovi PIX charges (primary)
    Woovi(WooviBackend),
    /// AbacatePay PIX billing (secondary)
    AbacatePay(AbacatePayBackend),
    /// Mock backend for testing
    Mock(MockPaymentBackend),
}

impl PaymentClient {
    /// Create a mock provider for testing
    pub fn mock() -> Self {
        PaymentClient::Mock(MockPaymentBackend::new())
    }
}

#[async_trait]
impl PaymentProvider for PaymentClient {
    async fn create_charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeDescriptor, BillingError> {
        match self {
            PaymentClient::Woovi(b) => b.create_charge(request).await,
            PaymentClient::AbacatePay(b) => b.create_charge(request).await,
            PaymentClient::Mock(b) => b.create_charge(request).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            PaymentClient::Woovi(b) => b.name(),
            PaymentClient::AbacatePay(b) => b.name(),
            PaymentClient::Mock(b) => b.name(),
        }
    }
}

/// Prioritized payment provider chain
///
/// Priority order is fixed: Woovi, then AbacatePay. Providers whose keys
/// are absent never enter the chain.
#[derive(Clone)]
pub struct BillingDispatcher {
    providers: Vec<PaymentClient>,
}

impl BillingDispatcher {
    /// Create a dispatcher over an explicit chain
    pub fn new(providers: Vec<PaymentClient>) -> Self {
        Self { providers }
    }

    /// Assemble the chain from environment variables
    pub fn from_env() -> Self {
        let mut providers = Vec::new();

        if let Some(woovi) = WooviBackend::from_env() {
            providers.push(PaymentClient::Woovi(woovi));
        }
        if let Some(abacatepay) = AbacatePayBackend::from_env() {
            providers.push(PaymentClient::AbacatePay(abacatepay));
        }

        if providers.is_empty() {
            warn!("No payment provider configured, charge creation will fail");
        } else {
            let chain = providers.iter().map(|p| p.name()).collect::<Vec<_>>();
            info!(chain = %chain.join(" -> "), "Payment provider chain ready");
        }

        Self { providers }
    }

    /// The configured chain, in priority order
    pub fn providers(&self) -> &[PaymentClient] {
        &self.providers
    }

    /// Whether any provider is configured
    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Create the unlock charge for an analysis
    ///
    /// Every provider in the chain sees the same request, so the
    /// correlation id a webhook reports is stable no matter which provider
    /// won. Failures are logged and the chain advances; exhaustion returns
    /// the last provider error (`Unconfigured` for an empty chain).
    pub async fn create_charge(
        &self,
        analysis_id: Option<&str>,
    ) -> Result<ChargeDescriptor, BillingError> {
        let request = ChargeRequest::new(analysis_id);

        let mut last_error = BillingError::Unconfigured;

        for provider in &self.providers {
            info!(
                provider = provider.name(),
                correlation_id = %request.correlation_id,
                "Creating PIX charge"
            );

            match provider.create_charge(&request).await {
                Ok(descriptor) => {
                    info!(
                        provider = provider.name(),
                        charge_id = %descriptor.charge_id,
                        "Charge created"
                    );
                    return Ok(descriptor);
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        kind = err.kind(),
                        error = %err,
                        "Payment provider failed"
                    );
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}
