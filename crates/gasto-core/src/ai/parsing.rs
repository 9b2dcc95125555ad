//! JSON parsing helpers for provider responses
//!
//! Providers without a JSON output mode wrap the payload in prose or
//! markdown fences; these helpers cut the JSON object out of the reply
//! before parsing it.

use crate::models::ExtractionReply;

use super::ProviderError;

/// Parse an extraction reply from a raw provider response
///
/// Takes the substring from the first `{` to the last `}` so fenced or
/// prose-wrapped replies still parse. An empty reply and a reply with no
/// JSON object are distinct failures.
pub fn parse_extraction(response: &str) -> Result<ExtractionReply, ProviderError> {
    let response = response.trim();

    if response.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                ProviderError::MalformedResponse(format!(
                    "Invalid JSON from provider: {} | Raw: {}",
                    e,
                    truncate(json_str)
                ))
            })
        }
        _ => Err(ProviderError::MalformedResponse(format!(
            "No JSON found in provider response | Raw: {}",
            truncate(response)
        ))),
    }
}

// Char-based cut: reply text is Portuguese, byte slicing could split a code point.
fn truncate(s: &str) -> String {
    const LIMIT: usize = 200;
    if s.chars().count() <= LIMIT {
        return s.to_string();
    }
    let cut: String = s.chars().take(LIMIT).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_json() {
        let reply = parse_extraction(r#"{"subs":[{"n":"Netflix","v":55.9,"c":"tv"}]}"#).unwrap();
        assert_eq!(reply.subs.len(), 1);
        assert_eq!(reply.subs[0].n, "Netflix");
    }

    #[test]
    fn test_parse_fenced_json() {
        let response = "Aqui está o resultado:\n```json\n{\"subs\":[{\"n\":\"Spotify\",\"v\":21.9,\"c\":\"music\"}]}\n```\nEspero ter ajudado!";
        let reply = parse_extraction(response).unwrap();
        assert_eq!(reply.subs.len(), 1);
        assert_eq!(reply.subs[0].n, "Spotify");
    }

    #[test]
    fn test_parse_empty_subs() {
        let reply = parse_extraction(r#"{"subs":[]}"#).unwrap();
        assert!(reply.subs.is_empty());

        // A JSON object without the subs key is an empty extraction
        let reply = parse_extraction("{}").unwrap();
        assert!(reply.subs.is_empty());
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(matches!(
            parse_extraction(""),
            Err(ProviderError::EmptyResponse)
        ));
        assert!(matches!(
            parse_extraction("   \n  "),
            Err(ProviderError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_no_json() {
        let err = parse_extraction("Não encontrei assinaturas no texto.").unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => {
                assert!(msg.contains("No JSON found"));
                assert!(msg.contains("Não encontrei"));
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_extraction(r#"{"subs": [{"n": }"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        // Long Portuguese garbage must truncate without panicking mid code point
        let long = "çãé".repeat(200);
        let err = parse_extraction(&long).unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => assert!(msg.ends_with("...")),
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }
}
