//! Sequential provider fallback
//!
//! One attempt per adapter, strict priority order, first success wins.
//! No per-adapter retries and no concurrent racing: the free tiers these
//! adapters run on punish bursts, and a second-priority success is exactly
//! as good as a first-priority one.

use thiserror::Error;
use tracing::{info, warn};

use crate::models::RawSubscription;
use crate::prompt::build_prompt;
use crate::text::normalize;

use super::{
    GeminiBackend, GroqBackend, OpenRouterBackend, ProviderBackend, ProviderClient, ProviderError,
};

/// A successful extraction and the provider that produced it
#[derive(Debug, Clone)]
pub struct Extraction {
    pub subs: Vec<RawSubscription>,
    /// Display name of the winning provider
    pub provider: String,
}

/// Why an extraction produced nothing
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("All AI providers failed after {} attempt(s): {last_error}", attempted.len())]
    AllProvidersFailed {
        /// Display names of every adapter tried, in chain order
        attempted: Vec<String>,
        /// The error from the last adapter tried (`Unconfigured` for an
        /// empty chain)
        last_error: ProviderError,
    },
}

/// Prioritized provider chain
///
/// Priority order is fixed: Gemini 2.5 Flash, Gemini 2.0 Flash Lite, Groq,
/// OpenRouter. Adapters whose keys are absent never enter the chain.
#[derive(Clone)]
pub struct FallbackOrchestrator {
    providers: Vec<ProviderClient>,
}

impl FallbackOrchestrator {
    /// Create an orchestrator over an explicit chain
    pub fn new(providers: Vec<ProviderClient>) -> Self {
        Self { providers }
    }

    /// Assemble the chain from environment variables
    ///
    /// Unconfigured adapters are skipped here, not at call time. An empty
    /// chain is valid and fails fast on the first extraction.
    pub fn from_env() -> Self {
        let mut providers = Vec::new();

        if let Some(gemini) = GeminiBackend::from_env() {
            let lite = gemini.with_model("gemini-2.0-flash-lite", "Gemini 2.0 Flash Lite");
            providers.push(ProviderClient::Gemini(gemini));
            providers.push(ProviderClient::Gemini(lite));
        }
        if let Some(groq) = GroqBackend::from_env() {
            providers.push(ProviderClient::Groq(groq));
        }
        if let Some(openrouter) = OpenRouterBackend::from_env() {
            providers.push(ProviderClient::OpenRouter(openrouter));
        }

        if providers.is_empty() {
            warn!("No AI providers configured, every extraction will fail");
        } else {
            let chain = providers.iter().map(|p| p.name()).collect::<Vec<_>>();
            info!(chain = %chain.join(" -> "), "AI provider chain ready");
        }

        Self { providers }
    }

    /// The configured chain, in priority order
    pub fn providers(&self) -> &[ProviderClient] {
        &self.providers
    }

    /// Run raw statement text through the chain
    ///
    /// Normalizes the text and builds the prompt exactly once, then walks
    /// the chain. Failures are logged and the chain advances; exhaustion
    /// returns `AllProvidersFailed` carrying the last provider error.
    pub async fn extract(&self, raw_text: &str) -> Result<Extraction, ExtractError> {
        let normalized = normalize(raw_text);
        let prompt = build_prompt(&normalized);

        let mut attempted = Vec::with_capacity(self.providers.len());
        let mut last_error = ProviderError::Unconfigured;

        for provider in &self.providers {
            info!(provider = provider.name(), "Trying AI provider");
            attempted.push(provider.name().to_string());

            match provider.analyze(&prompt).await {
                Ok(reply) => {
                    info!(
                        provider = provider.name(),
                        subs = reply.subs.len(),
                        "Extraction succeeded"
                    );
                    return Ok(Extraction {
                        subs: reply.subs,
                        provider: provider.name().to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        kind = err.kind(),
                        error = %err,
                        "AI provider failed, advancing chain"
                    );
                    last_error = err;
                }
            }
        }

        Err(ExtractError::AllProvidersFailed {
            attempted,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn failing(name: &str, failure: fn() -> ProviderError) -> (MockBackend, ProviderClient) {
        let mock = MockBackend::failing(name, failure);
        let client = ProviderClient::Mock(mock.clone());
        (mock, client)
    }

    fn succeeding(name: &str, subs: Vec<RawSubscription>) -> (MockBackend, ProviderClient) {
        let mock = MockBackend::succeeding(name, subs);
        let client = ProviderClient::Mock(mock.clone());
        (mock, client)
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (first, c1) = failing("First", || ProviderError::RateLimited);
        let (second, c2) = failing("Second", || ProviderError::EmptyResponse);
        let (third, c3) = succeeding(
            "Third",
            vec![RawSubscription::new("Netflix", 55.9, "streaming")],
        );
        let (fourth, c4) = succeeding("Fourth", vec![]);

        let orchestrator = FallbackOrchestrator::new(vec![c1, c2, c3, c4]);
        let extraction = orchestrator.extract("extrato").await.unwrap();

        assert_eq!(extraction.provider, "Third");
        assert_eq!(extraction.subs.len(), 1);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 1);
        assert_eq!(fourth.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let (first, c1) = failing("First", || ProviderError::Unauthorized(401));
        let (second, c2) = failing("Second", || ProviderError::RateLimited);
        let (third, c3) = failing("Third", || ProviderError::EmptyResponse);

        let orchestrator = FallbackOrchestrator::new(vec![c1, c2, c3]);
        let err = orchestrator.extract("extrato").await.unwrap_err();

        let ExtractError::AllProvidersFailed {
            attempted,
            last_error,
        } = err;
        assert_eq!(attempted, vec!["First", "Second", "Third"]);
        assert!(matches!(last_error, ProviderError::EmptyResponse));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_fails_fast() {
        let orchestrator = FallbackOrchestrator::new(vec![]);
        let err = orchestrator.extract("extrato").await.unwrap_err();

        let ExtractError::AllProvidersFailed {
            attempted,
            last_error,
        } = err;
        assert!(attempted.is_empty());
        assert!(matches!(last_error, ProviderError::Unconfigured));
    }

    #[tokio::test]
    async fn test_prompt_built_from_normalized_text() {
        let (mock, client) = succeeding("Only", vec![]);
        let orchestrator = FallbackOrchestrator::new(vec![client]);

        orchestrator
            .extract("NETFLIX.COM      55,90\n\n\n\n\nSPOTIFY  21,90")
            .await
            .unwrap();

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("NETFLIX.COM 55,90\n\nSPOTIFY 21,90"));
        assert!(prompts[0].starts_with("Analise o extrato bancário"));
    }

    #[tokio::test]
    async fn test_failure_does_not_rebuild_prompt() {
        let (first, c1) = failing("First", || ProviderError::RateLimited);
        let (second, c2) = succeeding("Second", vec![]);
        let orchestrator = FallbackOrchestrator::new(vec![c1, c2]);

        orchestrator.extract("texto   do   extrato").await.unwrap();

        // Both adapters must see the identical prompt
        let first_prompts = first.prompts();
        let second_prompts = second.prompts();
        assert_eq!(first_prompts.len(), 1);
        assert_eq!(first_prompts, second_prompts);
    }
}
