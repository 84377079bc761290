//! LLM clients.
//!
//! The pipeline only needs one capability from a model: turn a prompt into
//! text. [`LlmClient`] captures that; [`GeminiClient`] and [`OpenAiClient`]
//! implement it over HTTP, and tests substitute their own implementations.

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use crate::error::{AskError, AskResult};
use async_trait::async_trait;
use clap::ValueEnum;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default LLM request timeout in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// A text-generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` and return the model's reply verbatim.
    async fn complete(&self, prompt: &str) -> AskResult<String>;

    /// Provider name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Ask the model for SQL and cut any preamble before the first `SELECT`.
///
/// The reply is trimmed; if it contains `SELECT` (ASCII case-insensitive)
/// everything before the first occurrence is dropped, otherwise the trimmed
/// reply is returned unchanged and left for the sanitizer to reject.
pub async fn generate_sql(client: &dyn LlmClient, prompt: &str) -> AskResult<String> {
    let reply = client.complete(prompt).await?;
    let sql = strip_preamble(reply.trim());

    debug!(provider = client.name(), sql = %sql, "Model reply");
    Ok(sql.to_string())
}

fn strip_preamble(text: &str) -> &str {
    // ASCII uppercasing keeps byte offsets aligned with `text`
    match text.to_ascii_uppercase().find("SELECT") {
        Some(pos) => &text[pos..],
        None => text,
    }
}

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LlmProvider {
    /// Google Gemini `generateContent` API
    #[default]
    Gemini,
    /// Any OpenAI-compatible chat completions API
    #[value(name = "openai")]
    OpenAi,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => gemini::DEFAULT_MODEL,
            Self::OpenAi => openai::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => gemini::DEFAULT_BASE_URL,
            Self::OpenAi => openai::DEFAULT_BASE_URL,
        }
    }

    /// Provider-specific environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Resolved settings for constructing a client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Build the HTTP client for the configured provider.
pub fn build_client(settings: &LlmSettings) -> AskResult<Arc<dyn LlmClient>> {
    if settings.api_key.trim().is_empty() {
        return Err(AskError::config(format!(
            "No API key for {}. Pass --api-key or set ASKDB_API_KEY or {}",
            settings.provider,
            settings.provider.api_key_env()
        )));
    }

    let http = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| AskError::config(format!("Failed to build HTTP client: {}", e)))?;

    let client: Arc<dyn LlmClient> = match settings.provider {
        LlmProvider::Gemini => Arc::new(GeminiClient::new(
            http,
            &settings.base_url,
            &settings.api_key,
            &settings.model,
        )),
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            http,
            &settings.base_url,
            &settings.api_key,
            &settings.model,
        )),
    };
    Ok(client)
}

/// Classify a transport failure for `provider`.
pub(crate) fn request_error(provider: &str, err: reqwest::Error) -> AskError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("could not reach the provider: {}", err)
    } else if err.is_decode() {
        format!("malformed response: {}", err)
    } else {
        err.to_string()
    };
    AskError::service(provider, message)
}

/// Turn a non-success HTTP response into a service error carrying the body.
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> AskResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AskError::service(
        provider,
        format!("HTTP {}: {}", status, body.trim()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl LlmClient for Canned {
        async fn complete(&self, _prompt: &str) -> AskResult<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_generate_sql_strips_preamble() {
        let client = Canned("  Here is your query:\n```sql\nSELECT * FROM t;\n```\n");
        let sql = generate_sql(&client, "p").await.unwrap();
        assert_eq!(sql, "SELECT * FROM t;\n```");
    }

    #[tokio::test]
    async fn test_generate_sql_lowercase_select() {
        let client = Canned("Sure: select id from t");
        assert_eq!(generate_sql(&client, "p").await.unwrap(), "select id from t");
    }

    #[tokio::test]
    async fn test_generate_sql_without_select_passes_through() {
        let client = Canned("  I cannot answer that.  ");
        assert_eq!(
            generate_sql(&client, "p").await.unwrap(),
            "I cannot answer that."
        );
    }

    #[test]
    fn test_strip_preamble_with_multibyte_prefix() {
        assert_eq!(strip_preamble("Voilà → SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_build_client_requires_api_key() {
        let settings = LlmSettings {
            provider: LlmProvider::Gemini,
            api_key: "  ".into(),
            model: LlmProvider::Gemini.default_model().into(),
            base_url: LlmProvider::Gemini.default_base_url().into(),
            timeout: Duration::from_secs(5),
        };
        let err = build_client(&settings).err().unwrap();
        assert!(matches!(err, AskError::Config { .. }));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_build_client_names() {
        let settings = LlmSettings {
            provider: LlmProvider::OpenAi,
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            base_url: LlmProvider::OpenAi.default_base_url().into(),
            timeout: Duration::from_secs(5),
        };
        let client = build_client(&settings).unwrap();
        assert_eq!(client.name(), "OpenAI");
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(LlmProvider::Gemini.to_string(), "gemini");
        assert_eq!(LlmProvider::OpenAi.to_string(), "openai");
    }
}
