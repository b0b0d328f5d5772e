//! OpenAI-compatible provider implementation.
//!
//! Works with: Mistral, OpenAI, OpenRouter, Ollama, vLLM, and any endpoint
//! exposing `/v1/chat/completions`.

use async_trait::async_trait;
use pagewise_core::error::ProviderError;
use pagewise_core::message::{Message, Role};
use pagewise_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// An OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with the default timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(name, base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a provider whose requests time out after `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a Mistral provider (convenience constructor).
    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::new("mistral", "https://api.mistral.ai/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                },
                content: Some(m.content.clone()),
            })
            .collect()
    }

    async fn get_models(&self) -> std::result::Result<reqwest::Response, ProviderError> {
        self.client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)
    }

    fn map_send_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Map a non-200 status to a failure the classifier can read.
///
/// 413 and size wording in 400 bodies surface as `ApiError` so that the
/// message reaches the classifier unchanged.
fn status_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::AuthenticationFailed(extract_error_message(body)),
        404 => ProviderError::ModelNotFound(extract_error_message(body)),
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        _ => ProviderError::ApiError {
            status_code: status,
            message: extract_error_message(body),
        },
    }
}

/// Pull the human-readable message out of an error body.
///
/// Handles both `{"message": ...}` (Mistral) and `{"error": {"message": ...}}`
/// (OpenAI); anything else is returned as-is.
fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    value["error"]["message"]
        .as_str()
        .or_else(|| value["message"].as_str())
        .or_else(|| value["detail"].as_str())
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl pagewise_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Completion request rejected");
            return Err(status_error(status, &error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let response = self.get_models().await?;
        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let listing: ApiModelList = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(self.get_models().await?.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiModelList {
    #[serde(default)]
    data: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewise_core::Provider;

    #[test]
    fn mistral_constructor() {
        let p = OpenAiCompatProvider::mistral("sk-test");
        assert_eq!(p.name(), "mistral");
        assert_eq!(p.base_url(), "https://api.mistral.ai/v1");
    }

    #[test]
    fn ollama_constructor() {
        let p = OpenAiCompatProvider::ollama(None);
        assert_eq!(p.name(), "ollama");
        assert!(p.base_url().contains("11434"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let p = OpenAiCompatProvider::new("custom", "http://localhost:8000/v1/", "k");
        assert_eq!(p.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn message_conversion() {
        let msgs = vec![Message::system("Document content: ..."), Message::user("Summarize")];
        let api = OpenAiCompatProvider::to_api_messages(&msgs);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content.as_deref(), Some("Summarize"));
    }

    #[test]
    fn error_message_from_mistral_body() {
        let body = r#"{"object":"error","message":"Prompt contains 40000 tokens, too large for model with 32768 maximum context length","type":"invalid_request_error"}"#;
        assert!(extract_error_message(body).starts_with("Prompt contains 40000 tokens"));
    }

    #[test]
    fn error_message_from_openai_body() {
        let body = r#"{"error":{"message":"This model's maximum context length is 8192 tokens","type":"invalid_request_error"}}"#;
        assert_eq!(
            extract_error_message(body),
            "This model's maximum context length is 8192 tokens"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(extract_error_message(r#"{"code":1}"#), r#"{"code":1}"#);
    }

    #[test]
    fn statuses_map_to_failures() {
        assert!(matches!(
            status_error(401, r#"{"message":"Unauthorized"}"#),
            ProviderError::AuthenticationFailed(m) if m == "Unauthorized"
        ));
        assert!(matches!(status_error(429, ""), ProviderError::RateLimited { .. }));
        assert!(matches!(status_error(404, "no such model"), ProviderError::ModelNotFound(_)));
        assert!(matches!(
            status_error(413, "Payload Too Large"),
            ProviderError::ApiError { status_code: 413, .. }
        ));
    }

    #[test]
    fn model_listing_parsing() {
        let json = r#"{"object":"list","data":[{"id":"mistral-small-latest"},{"id":"mistral-large-latest"}]}"#;
        let listing: ApiModelList = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = listing.data.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["mistral-small-latest", "mistral-large-latest"]);
    }

    #[test]
    fn response_parsing() {
        let json = r#"{
            "model": "mistral-small-latest",
            "choices": [{"message": {"role": "assistant", "content": "Photosynthesis converts light."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Photosynthesis converts light.")
        );
        assert_eq!(parsed.usage.unwrap().total_tokens, 17);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let p = OpenAiCompatProvider::with_timeout(
            "closed",
            "http://127.0.0.1:9/v1",
            "k",
            Duration::from_secs(5),
        );
        let req = ProviderRequest::chat("m", "system", "user", 16, 0.7);
        match p.complete(req).await {
            Err(ProviderError::Network(_)) | Err(ProviderError::Timeout(_)) => {}
            other => panic!("Expected transport failure, got: {other:?}"),
        }
    }
}
