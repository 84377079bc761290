//! Google Gemini `generateContent` client.

use super::{LlmClient, error_for_status, request_error};
use crate::error::{AskError, AskResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER: &str = "Gemini";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: Client, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            api_key: api_key.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> AskResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(endpoint = %self.endpoint, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(PROVIDER, e))?;

        let response = error_for_status(PROVIDER, response).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| request_error(PROVIDER, e))?;

        response_text(body)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Concatenated text parts of the first candidate.
fn response_text(body: GenerateContentResponse) -> AskResult<String> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = body
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (blocked: {})", r))
            .unwrap_or_default();
        return Err(AskError::service(
            PROVIDER,
            format!("Empty response{}", reason),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AskResult<String> {
        response_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_response_parts_concatenated() {
        let text = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"SELECT 1"},{"text":" FROM t"}],"role":"model"}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(text, "SELECT 1 FROM t");
    }

    #[test]
    fn test_blocked_prompt_is_service_error() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, AskError::Service { .. }));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_empty_candidates_is_service_error() {
        assert!(parse(r#"{"candidates":[]}"#).is_err());
        assert!(parse(r#"{"candidates":[{"finishReason":"STOP"}]}"#).is_err());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(Client::new(), "http://localhost:8080/", "k", DEFAULT_MODEL);
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
