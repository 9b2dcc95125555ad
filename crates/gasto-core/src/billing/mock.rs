//! Mock payment backend for testing
//!
//! Scriptable success or failure plus an invocation counter and request
//! log, so dispatcher fallback tests can assert which providers ran and
//! what they were asked to charge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BillingError, ChargeDescriptor, ChargeRequest, PaymentProvider};

/// Mock payment backend
///
/// Succeeds by default, echoing the request's correlation id as the charge
/// id. The call counter and request log are shared across clones, so a
/// dispatcher holding a clone still reports through the handle a test
/// kept.
#[derive(Clone)]
pub struct MockPaymentBackend {
    name: String,
    failure: Option<fn() -> BillingError>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ChargeRequest>>>,
}

impl MockPaymentBackend {
    /// Create a mock that creates every charge
    pub fn new() -> Self {
        Self::succeeding("mock")
    }

    /// Create a mock with the given provider tag
    pub fn succeeding(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails every call with the produced error
    pub fn failing(name: &str, failure: fn() -> BillingError) -> Self {
        Self {
            name: name.to_string(),
            failure: Some(failure),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// How many times `create_charge` ran (across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request `create_charge` received (across clones)
    pub fn requests(&self) -> Vec<ChargeRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockPaymentBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentBackend {
    async fn create_charge(
        &self,
        request: &ChargeRequest,
    ) -> Result<ChargeDescriptor, BillingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(ChargeDescriptor {
                provider: self.name.clone(),
                charge_id: request.correlation_id.clone(),
                payment_url: format!("https://pay.invalid/{}", request.correlation_id),
                qr_code: Some(format!("00020126mock{}", request.correlation_id)),
                status: "ACTIVE".to_string(),
                value: request.value,
            }),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
