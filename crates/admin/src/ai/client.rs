//! Messages API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::AiConfig;

use super::error::{AiError, ApiErrorResponse};
use super::types::{Message, MessagesRequest, MessagesResponse, StopReason};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the generative-AI provider.
#[derive(Clone)]
pub struct AiClient {
    inner: Arc<AiClientInner>,
}

struct AiClientInner {
    client: reqwest::Client,
    model: String,
    api_url: String,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("model", &self.inner.model)
            .field("api_url", &self.inner.api_url)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Config` if the API key is not a valid header value,
    /// or `AiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| AiError::Config("API key contains invalid header characters".into()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AiClientInner {
                client,
                model: config.model.clone(),
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// Model id requests are sent with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send a single-turn request and return the response text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider returns an error,
    /// or the response has no text.
    #[instrument(skip(self, system, prompt), fields(model = %self.inner.model))]
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let request = MessagesRequest {
            model: self.inner.model.clone(),
            max_tokens,
            messages: vec![Message::user(prompt)],
            system: Some(system.to_string()),
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        let body = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            stop_reason = ?parsed.stop_reason,
            "AI completion"
        );

        if parsed.stop_reason == Some(StopReason::MaxTokens) {
            tracing::warn!(max_tokens, "AI response truncated at max_tokens");
        }

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(AiError::Parse("response contained no text".to_string()));
        }
        Ok(text)
    }
}

async fn error_from_response(status: StatusCode, response: reqwest::Response) -> AiError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return AiError::RateLimited(retry_after);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AiError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => error_from_body(&body),
        Err(e) => AiError::Http(e),
    }
}

fn error_from_body(body: &str) -> AiError {
    serde_json::from_str::<ApiErrorResponse>(body).map_or_else(
        |_| AiError::Api {
            error_type: "unknown".to_string(),
            message: body.chars().take(500).collect(),
        },
        |api_error| AiError::Api {
            error_type: api_error.error.error_type,
            message: api_error.error.message,
        },
    )
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(key: &str) -> AiConfig {
        AiConfig {
            api_key: SecretString::from(key.to_string()),
            model: "claude-sonnet-4-20250514".to_string(),
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
        }
    }

    #[test]
    fn test_new_rejects_invalid_header_key() {
        assert!(matches!(
            AiClient::new(&config("bad\nkey")),
            Err(AiError::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = AiClient::new(&config("sk-ant-secret")).expect("client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("claude-sonnet-4-20250514"));
    }

    #[test]
    fn test_error_from_body() {
        let err = error_from_body(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert!(matches!(err, AiError::Api { ref error_type, .. } if error_type == "overloaded_error"));

        let err = error_from_body("<html>bad gateway</html>");
        assert!(matches!(err, AiError::Api { ref error_type, .. } if error_type == "unknown"));
    }

    #[test]
    fn test_ai_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<AiClient>();
    }
}
