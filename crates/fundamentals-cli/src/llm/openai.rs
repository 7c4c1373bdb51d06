//! OpenAI-compatible chat-completions client used to draft the memo.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use fundamentals_core::memo::{GenerationError, MemoRequest, TextGenerator};

use crate::config::DEFAULT_MODEL;

pub struct OpenAiClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Client for the chat-completions API at `base_url` (OpenAI, Azure
    /// OpenAI or any compatible server).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            GenerationError::NotConfigured("OPENAI_API_KEY is not a valid header value".into())
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> String {
        format!("openai/{}", self.model)
    }

    async fn generate(&self, request: &MemoRequest) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".into(),
                    content: request.system.clone(),
                },
                OpenAIMessage {
                    role: "user".into(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::Authentication(message)
                }
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
                _ => GenerationError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to parse response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion finished"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

/// Prefer the API's own `error.message` over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> MemoRequest {
        MemoRequest {
            system: "You are an analyst.".into(),
            prompt: "Write a memo.".into(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    async fn respond(status: u16, body: serde_json::Value) -> Result<String, GenerationError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        OpenAiClient::with_base_url("sk-test", server.uri())
            .unwrap()
            .generate(&request())
            .await
    }

    #[tokio::test]
    async fn test_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 2000,
                "messages": [
                    { "role": "system", "content": "You are an analyst." },
                    { "role": "user", "content": "Write a memo." }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "# Memo" } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::with_base_url("sk-test", server.uri()).unwrap();
        assert_eq!(client.name(), "openai/gpt-4o-mini");
        assert_eq!(client.generate(&request()).await.unwrap(), "# Memo");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication() {
        let err = respond(401, json!({ "error": { "message": "Incorrect API key provided" } }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Authentication("Incorrect API key provided".into())
        );
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let err = respond(429, json!({ "error": { "message": "slow down" } }))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_other_status_maps_to_api_error() {
        let err = respond(500, json!({ "error": { "message": "boom" } }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Api {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_response() {
        let err = respond(200, json!({ "choices": [] })).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = OpenAiClient::with_base_url("sk-test", "http://127.0.0.1:1").unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport(_)));
    }

    #[test]
    fn test_key_with_line_break_is_not_configured() {
        let err = OpenAiClient::with_base_url("sk-test\nX-Injected: 1", "http://127.0.0.1:1")
            .err()
            .unwrap();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }
}
