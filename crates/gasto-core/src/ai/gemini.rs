//! Google Gemini backend implementation
//!
//! Calls the `generateContent` REST endpoint with JSON response mode and an
//! explicit response schema, so the model is constrained to the
//! `{"subs":[{n,v,c}]}` shape. One API key serves both chain entries
//! (`gemini-2.5-flash` and `gemini-2.0-flash-lite`).
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required; empty string counts as unset)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::ExtractionReply;

use super::parsing::parse_extraction;
use super::{ProviderBackend, ProviderError, MAX_OUTPUT_TOKENS, REQUEST_TIMEOUT};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini backend
///
/// The API key rides in the query string, so every reqwest error is passed
/// through `without_url()` before it becomes error text.
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    name: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(api_key: &str, model: &str, name: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            name: name.to_string(),
        }
    }

    /// Create a new instance with a different model and display name
    ///
    /// Used to derive the second chain entry from the same API key.
    pub fn with_model(&self, model: &str, name: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            name: name.to_string(),
        }
    }

    /// Override the API base URL (proxies, tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Create the primary chain entry from environment variables
    ///
    /// Required: `GEMINI_API_KEY`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(&api_key, DEFAULT_MODEL, "Gemini 2.5 Flash"))
    }
}

/// Response schema forcing the compact subscription shape
fn subscription_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "subs": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "n": { "type": "STRING", "description": "Nome do serviço" },
                        "v": { "type": "NUMBER", "description": "Valor mensal" },
                        "c": { "type": "STRING", "description": "Categoria" }
                    },
                    "required": ["n", "v", "c"]
                }
            }
        }
    })
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
    max_output_tokens: u32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    // Safety-blocked candidates come back with a finishReason and no content
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[async_trait]
impl ProviderBackend for GeminiBackend {
    async fn analyze(&self, prompt: &str) -> Result<ExtractionReply, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: subscription_schema(),
                temperature: 0.0,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let gemini_response: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "Invalid Gemini envelope: {}",
                e.without_url()
            ))
        })?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(ProviderError::EmptyResponse)?;

        parse_extraction(&text)
    }

    async fn health_check(&self) -> bool {
        let url = format!(
            "{}/v1beta/models?key={}&pageSize=1",
            self.base_url, self.api_key
        );
        match self
            .http_client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new() {
        let backend = GeminiBackend::new("test-key", "gemini-2.5-flash", "Gemini 2.5 Flash");
        assert_eq!(backend.name(), "Gemini 2.5 Flash");
        assert_eq!(backend.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_with_model_shares_key() {
        let primary = GeminiBackend::new("test-key", "gemini-2.5-flash", "Gemini 2.5 Flash");
        let lite = primary.with_model("gemini-2.0-flash-lite", "Gemini 2.0 Flash Lite");

        assert_eq!(lite.name(), "Gemini 2.0 Flash Lite");
        assert_eq!(lite.model(), "gemini-2.0-flash-lite");
        assert_eq!(lite.api_key, primary.api_key);
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let backend = GeminiBackend::new("k", "m", "n").with_base_url("http://localhost:8080/");
        assert_eq!(backend.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_from_env_missing() {
        std::env::remove_var("GEMINI_API_KEY");
        assert!(GeminiBackend::from_env().is_none());
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "prompt".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: subscription_schema(),
                temperature: 0.0,
                max_output_tokens: 1024,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);

        let schema = &json["generationConfig"]["responseSchema"];
        assert_eq!(schema["properties"]["subs"]["type"], "ARRAY");
        assert_eq!(
            schema["properties"]["subs"]["items"]["required"],
            serde_json::json!(["n", "v", "c"])
        );
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "{\"subs\":[{\"n\":\"Netflix\",\"v\":55.9,\"c\":\"tv\"}]}"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let text = &response.candidates[0].content.as_ref().unwrap().parts[0].text;
        assert!(text.contains("Netflix"));
    }

    #[test]
    fn test_response_blocked_candidate() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(response.candidates[0].content.is_none());
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend =
            GeminiBackend::new("k", "m", "Gemini").with_base_url("http://localhost:99999");
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_analyze_unreachable_is_network_error() {
        let backend =
            GeminiBackend::new("k", "m", "Gemini").with_base_url("http://localhost:99999");
        let err = backend.analyze("prompt").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
