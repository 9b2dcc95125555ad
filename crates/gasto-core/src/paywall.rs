//! Payment-return gatekeeping for locked analysis reports.
//!
//! An analysis is cached locked at extraction time; a pending-payment
//! marker is recorded at charge creation, before the client leaves for the
//! payment provider. When the client comes back with a success flag the
//! [`PaywallGate`] only unlocks the report if a fresh marker exists for
//! that client and the marker's analysis is known. The marker is consumed
//! on unlock, so a replayed return URL finds nothing to redeem. On any
//! ambiguity the report stays locked.
//!
//! Webhooks from the payment providers feed a [`ConfirmationLedger`];
//! gates built with [`PaywallGate::require_confirmation`] additionally
//! demand a ledger entry before unlocking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::AnalysisResult;

/// How long a pending-payment marker stays redeemable.
pub const MARKER_TTL: Duration = Duration::from_secs(30 * 60);

/// Proof that a charge-creation flow was started by a client.
#[derive(Debug, Clone)]
pub struct PendingPaymentMarker {
    pub analysis_id: String,
    pub created_at: Instant,
}

impl PendingPaymentMarker {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > MARKER_TTL
    }
}

/// Flags carried back on the post-payment redirect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentReturn {
    pub payment_success: Option<String>,
    pub payment_cancelled: Option<String>,
    pub method: Option<String>,
}

impl PaymentReturn {
    pub fn success(&self) -> bool {
        self.payment_success.as_deref() == Some("true")
    }

    pub fn cancelled(&self) -> bool {
        self.payment_cancelled.as_deref() == Some("true")
    }
}

/// Decision for one processed payment return.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnOutcome {
    /// Marker matched a cached analysis; the report is unlocked.
    Unlocked {
        analysis: AnalysisResult,
        method: Option<String>,
    },
    /// A success flag arrived but validation failed; everything stays
    /// locked.
    Rejected(RejectReason),
    /// The client abandoned the payment flow.
    Cancelled,
    /// No payment flags on the request.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoPendingPayment,
    MarkerExpired,
    UnknownAnalysis,
    PaymentNotConfirmed,
}

impl RejectReason {
    /// User-facing message for the rejection.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoPendingPayment => "Nenhum pagamento pendente encontrado",
            Self::MarkerExpired => "Pagamento pendente expirado",
            Self::UnknownAnalysis => "Sessão expirada. Por favor, faça a análise novamente.",
            Self::PaymentNotConfirmed => "Pagamento ainda não confirmado",
        }
    }
}

/// One webhook-confirmed charge.
#[derive(Debug, Clone)]
pub struct ConfirmedCharge {
    pub analysis_id: String,
    pub provider: String,
    /// Provider-side charge identifier, when the webhook carried one.
    pub charge_id: Option<String>,
    pub confirmed_at: DateTime<Utc>,
}

/// Charges confirmed out-of-band by provider webhooks, keyed by analysis
/// id.
#[derive(Default)]
pub struct ConfirmationLedger {
    charges: RwLock<HashMap<String, ConfirmedCharge>>,
}

impl ConfirmationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a confirmed charge for the analysis. Idempotent: a second
    /// webhook for the same analysis overwrites the first.
    pub fn confirm(&self, analysis_id: &str, provider: &str, charge_id: Option<&str>) -> Result<()> {
        self.charges
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire confirmation ledger lock".into()))?
            .insert(
                analysis_id.to_string(),
                ConfirmedCharge {
                    analysis_id: analysis_id.to_string(),
                    provider: provider.to_string(),
                    charge_id: charge_id.map(str::to_string),
                    confirmed_at: Utc::now(),
                },
            );
        Ok(())
    }

    /// Whether a confirmed charge exists for the analysis.
    pub fn verify(&self, analysis_id: &str) -> Result<bool> {
        Ok(self
            .charges
            .read()
            .map_err(|_| Error::InvalidData("Failed to acquire confirmation ledger lock".into()))?
            .contains_key(analysis_id))
    }
}

/// Server-held paywall state: pending markers keyed by client identifier,
/// locked analyses and unlocked report copies keyed by analysis id.
#[derive(Default)]
pub struct PaywallGate {
    markers: RwLock<HashMap<String, PendingPaymentMarker>>,
    analyses: RwLock<HashMap<String, AnalysisResult>>,
    reports: RwLock<HashMap<String, AnalysisResult>>,
    confirmation: Option<Arc<ConfirmationLedger>>,
}

impl PaywallGate {
    /// Gate trusting the redirect flags alone, as the redirect contract
    /// defines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that additionally requires a webhook-confirmed charge before
    /// unlocking.
    pub fn require_confirmation(ledger: Arc<ConfirmationLedger>) -> Self {
        Self {
            confirmation: Some(ledger),
            ..Self::default()
        }
    }

    /// Caches a locked analysis so a later payment return can unlock it.
    pub fn record_analysis(&self, analysis: &AnalysisResult) -> Result<()> {
        self.analyses
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire analysis cache lock".into()))?
            .insert(analysis.id.clone(), analysis.clone());
        Ok(())
    }

    /// Records the pending-payment marker for a client, replacing any
    /// previous one. Called at charge creation, immediately before the
    /// client is sent to the payment provider.
    pub fn prepare_payment(&self, client: &str, analysis_id: &str) -> Result<()> {
        self.prepare_payment_at(client, analysis_id, Instant::now())
    }

    pub fn prepare_payment_at(&self, client: &str, analysis_id: &str, now: Instant) -> Result<()> {
        self.markers
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire payment marker lock".into()))?
            .insert(
                client.to_string(),
                PendingPaymentMarker {
                    analysis_id: analysis_id.to_string(),
                    created_at: now,
                },
            );
        Ok(())
    }

    /// Validates a payment return against the client's pending marker.
    pub fn handle_return(&self, client: &str, ret: &PaymentReturn) -> Result<ReturnOutcome> {
        self.handle_return_at(client, ret, Instant::now())
    }

    pub fn handle_return_at(
        &self,
        client: &str,
        ret: &PaymentReturn,
        now: Instant,
    ) -> Result<ReturnOutcome> {
        if ret.cancelled() {
            self.remove_marker(client)?;
            return Ok(ReturnOutcome::Cancelled);
        }
        if !ret.success() {
            return Ok(ReturnOutcome::Idle);
        }

        let marker = {
            let markers = self
                .markers
                .read()
                .map_err(|_| Error::InvalidData("Failed to acquire payment marker lock".into()))?;
            markers.get(client).cloned()
        };
        let Some(marker) = marker else {
            warn!(client = %client, "Payment return without a pending marker");
            return Ok(ReturnOutcome::Rejected(RejectReason::NoPendingPayment));
        };

        if marker.expired(now) {
            self.remove_marker(client)?;
            warn!(
                client = %client,
                analysis_id = %marker.analysis_id,
                "Pending payment marker expired"
            );
            return Ok(ReturnOutcome::Rejected(RejectReason::MarkerExpired));
        }

        let analysis = {
            let analyses = self
                .analyses
                .read()
                .map_err(|_| Error::InvalidData("Failed to acquire analysis cache lock".into()))?;
            analyses.get(&marker.analysis_id).cloned()
        };
        let Some(analysis) = analysis else {
            warn!(
                analysis_id = %marker.analysis_id,
                "Payment return for an unknown analysis"
            );
            return Ok(ReturnOutcome::Rejected(RejectReason::UnknownAnalysis));
        };

        // The marker stays in place here so the client can retry once the
        // provider webhook lands.
        if let Some(ledger) = &self.confirmation {
            if !ledger.verify(&marker.analysis_id)? {
                warn!(
                    analysis_id = %marker.analysis_id,
                    "Payment return before webhook confirmation"
                );
                return Ok(ReturnOutcome::Rejected(RejectReason::PaymentNotConfirmed));
            }
        }

        // Consume the marker so a replayed return URL finds nothing.
        self.remove_marker(client)?;
        self.reports
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire report store lock".into()))?
            .insert(marker.analysis_id.clone(), analysis.clone());
        info!(analysis_id = %marker.analysis_id, "Payment confirmed, report unlocked");

        Ok(ReturnOutcome::Unlocked {
            analysis,
            method: ret.method.clone(),
        })
    }

    /// Unlocked report copy for direct-link access.
    pub fn report(&self, analysis_id: &str) -> Result<Option<AnalysisResult>> {
        Ok(self
            .reports
            .read()
            .map_err(|_| Error::InvalidData("Failed to acquire report store lock".into()))?
            .get(analysis_id)
            .cloned())
    }

    /// Drops expired markers, returning how many were removed.
    pub fn sweep(&self) -> Result<usize> {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> Result<usize> {
        let mut markers = self
            .markers
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire payment marker lock".into()))?;
        let before = markers.len();
        markers.retain(|_, marker| !marker.expired(now));
        Ok(before - markers.len())
    }

    fn remove_marker(&self, client: &str) -> Result<()> {
        self.markers
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire payment marker lock".into()))?
            .remove(client);
        Ok(())
    }
}
