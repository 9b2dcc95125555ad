//! OpenRouter backend implementation
//!
//! OpenAI-style chat completions against OpenRouter's free Llama tier.
//! OpenRouter has no JSON output mode, so the reply goes through the
//! defensive JSON-substring extractor. Attribution headers (`HTTP-Referer`,
//! `X-Title`) identify the product per OpenRouter's free-tier terms.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENROUTER_API_KEY`: API key (required; empty string counts as unset)
//! - `SITE_URL`: referer for attribution (default: https://gastorecorrente.shop)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::ExtractionReply;
use crate::prompt::SYSTEM_PROMPT;

use super::parsing::parse_extraction;
use super::{ProviderBackend, ProviderError, MAX_OUTPUT_TOKENS, REQUEST_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";
const DEFAULT_SITE_URL: &str = "https://gastorecorrente.shop";

/// OpenRouter backend
#[derive(Clone)]
pub struct OpenRouterBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    site_url: String,
}

impl OpenRouterBackend {
    /// Create a new OpenRouter backend
    pub fn new(api_key: &str, site_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
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
    /// Required: `OPENROUTER_API_KEY`
    /// Optional: `SITE_URL` (attribution referer)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let site_url =
            std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string());
        Some(Self::new(&api_key, &site_url))
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ProviderBackend for OpenRouterBackend {
    async fn analyze(&self, prompt: &str) -> Result<ExtractionReply, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.0,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .http_client
            .post(format!("{}/api/v1/chat/completions", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", "Gasto Recorrente")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let chat_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Invalid OpenRouter envelope: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        // Free-tier models chat around the payload; cut the JSON out.
        parse_extraction(&content)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/v1/models", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
