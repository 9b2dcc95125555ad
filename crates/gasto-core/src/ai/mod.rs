//! Hosted AI provider abstraction
//!
//! Statement extraction runs against hosted LLM APIs. Each provider gets a
//! thin adapter that sends the fixed extraction prompt and parses the
//! `{"subs":[...]}` reply; the orchestrator tries them in priority order.
//!
//! # Architecture
//!
//! - `ProviderBackend` trait: defines the interface all adapters implement
//! - `ProviderClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Adapter implementations: `GeminiBackend`, `GroqBackend`, `OpenRouterBackend`,
//!   `MockBackend`
//! - `FallbackOrchestrator`: sequential fallback chain (first success wins)
//!
//! # Configuration
//!
//! Environment variables (server-side only; keys never appear in responses,
//! logs, or error text):
//! - `GEMINI_API_KEY`: enables both Gemini chain entries
//! - `GROQ_API_KEY`: enables the Groq entry
//! - `OPENROUTER_API_KEY`: enables the OpenRouter entry
//! - `SITE_URL`: attribution referer sent to OpenRouter

mod gemini;
mod groq;
mod mock;
mod openrouter;
pub mod orchestrator;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use groq::GroqBackend;
pub use mock::MockBackend;
pub use openrouter::OpenRouterBackend;
pub use orchestrator::{ExtractError, Extraction, FallbackOrchestrator};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ExtractionReply;

/// Per-request deadline for every provider call
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hard cap on provider output, enough for a long statement's subscriptions
pub(crate) const MAX_OUTPUT_TOKENS: u32 = 1024;

/// How a single provider attempt failed
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider is not configured")]
    Unconfigured,
    #[error("provider rejected the credentials (HTTP {0})")]
    Unauthorized(u16),
    #[error("provider rate limit hit (HTTP 429)")]
    RateLimited,
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("provider returned malformed data: {0}")]
    MalformedResponse(String),
    #[error("provider request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

impl ProviderError {
    /// Short label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Unauthorized(_) => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Network(_) => "network",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Maps a non-success HTTP status to the matching error kind.
    ///
    /// The body is kept for generic rejections only; 401/403 bodies are
    /// dropped so credential echoes can never reach logs.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Unauthorized(status.as_u16()),
            429 => Self::RateLimited,
            code => Self::Rejected {
                status: code,
                detail: body,
            },
        }
    }
}

/// Trait defining the interface for all extraction providers
///
/// Adapters must be Send + Sync to allow use across async tasks. Every
/// adapter pins temperature to 0 and output to `MAX_OUTPUT_TOKENS` so a
/// given statement extracts the same way on retries.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Run the extraction prompt and parse the `{"subs":[...]}` reply
    async fn analyze(&self, prompt: &str) -> Result<ExtractionReply, ProviderError>;

    /// Cheap reachability probe (model listing endpoint), no tokens spent
    async fn health_check(&self) -> bool;

    /// Display name used in logs and reported with a winning extraction
    fn name(&self) -> &str;

    /// Model identifier (for the CLI providers listing)
    fn model(&self) -> &str;
}

/// Concrete provider client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ProviderClient {
    /// Google Gemini (generateContent REST API)
    Gemini(GeminiBackend),
    /// Groq (OpenAI-style chat completions)
    Groq(GroqBackend),
    /// OpenRouter (OpenAI-style chat completions, free tier)
    OpenRouter(OpenRouterBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ProviderClient {
    /// Create a mock provider for testing
    pub fn mock() -> Self {
        ProviderClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl ProviderBackend for ProviderClient {
    async fn analyze(&self, prompt: &str) -> Result<ExtractionReply, ProviderError> {
        match self {
            ProviderClient::Gemini(b) => b.analyze(prompt).await,
            ProviderClient::Groq(b) => b.analyze(prompt).await,
            ProviderClient::OpenRouter(b) => b.analyze(prompt).await,
            ProviderClient::Mock(b) => b.analyze(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ProviderClient::Gemini(b) => b.health_check().await,
            ProviderClient::Groq(b) => b.health_check().await,
            ProviderClient::OpenRouter(b) => b.health_check().await,
            ProviderClient::Mock(b) => b.health_check().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            ProviderClient::Gemini(b) => b.name(),
            ProviderClient::Groq(b) => b.name(),
            ProviderClient::OpenRouter(b) => b.name(),
            ProviderClient::Mock(b) => b.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            ProviderClient::Gemini(b) => b.model(),
            ProviderClient::Groq(b) => b.model(),
            ProviderClient::OpenRouter(b) => b.model(),
            ProviderClient::Mock(b) => b.model(),
        }
    }
}
