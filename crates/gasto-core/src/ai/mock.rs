//! Mock backend for testing
//!
//! Scriptable success or failure plus an invocation counter, so fallback
//! chain tests can assert which adapters ran and how often. Also usable for
//! development without provider keys.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{ExtractionReply, RawSubscription};

use super::{ProviderBackend, ProviderError};

/// Mock extraction backend
///
/// Succeeds by default with a small canned extraction. The call counter and
/// prompt log are shared across clones, so a chain holding a clone still
/// reports through the handle a test kept.
#[derive(Clone)]
pub struct MockBackend {
    name: String,
    subs: Vec<RawSubscription>,
    failure: Option<fn() -> ProviderError>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a mock that succeeds with canned data
    pub fn new() -> Self {
        Self::succeeding(
            "Mock",
            vec![
                RawSubscription::new("Netflix", 55.9, "streaming"),
                RawSubscription::new("Spotify", 21.9, "music"),
            ],
        )
    }

    /// Create a mock that succeeds with the given subscriptions
    pub fn succeeding(name: &str, subs: Vec<RawSubscription>) -> Self {
        Self {
            name: name.to_string(),
            subs,
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails every call with the produced error
    pub fn failing(name: &str, failure: fn() -> ProviderError) -> Self {
        Self {
            name: name.to_string(),
            subs: Vec::new(),
            failure: Some(failure),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// How many times `analyze` ran (across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt `analyze` received (across clones)
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderBackend for MockBackend {
    async fn analyze(&self, prompt: &str) -> Result<ExtractionReply, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(ExtractionReply {
                subs: self.subs.clone(),
            }),
        }
    }

    async fn health_check(&self) -> bool {
        self.failure.is_none()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_succeeds_with_canned_data() {
        let mock = MockBackend::new();
        let reply = mock.analyze("prompt").await.unwrap();
        assert_eq!(reply.subs.len(), 2);
        assert_eq!(reply.subs[0].n, "Netflix");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockBackend::failing("Broken", || ProviderError::RateLimited);
        let err = mock.analyze("prompt").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
        assert_eq!(mock.calls(), 1);
        assert!(!mock.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_counts_across_clones() {
        let mock = MockBackend::new();
        let clone = mock.clone();

        clone.analyze("a").await.unwrap();
        clone.analyze("b").await.unwrap();

        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.prompts(), vec!["a".to_string(), "b".to_string()]);
    }
}
