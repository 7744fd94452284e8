use super::TranslationProvider;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings for the OpenAI chat-completions provider
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub max_completion_tokens: u32,
    pub retry: RetryConfig,
}

impl OpenAiConfig {
    pub fn new(api_key: &str, model: &str, api_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            api_url: api_url.to_string(),
            max_completion_tokens: 2000,
            retry: RetryConfig::provider(),
        }
    }
}

/// OpenAI Chat Completion request for translation
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Non-success HTTP status from the API
#[derive(Debug)]
struct ApiStatusError {
    status: reqwest::StatusCode,
    body: String,
}

impl fmt::Display for ApiStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenAI API error ({}): {}", self.status, self.body)
    }
}

impl std::error::Error for ApiStatusError {}

/// Reasoning models reject `temperature` and take `reasoning_effort` instead
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

fn build_system_prompt(source: &str, target: &str) -> String {
    format!(
        r#"You are a professional translator for user interface text.
Translate the user's text from the language with ISO 639-1 code "{}" to the language with ISO 639-1 code "{}".

Rules:
- Reply with the translation only, no quotes or explanations
- Keep placeholders such as {{name}}, %s and {{{{count}}}} unchanged
- Keep markup, URLs and product names unchanged
- Match the length and tone of the original where possible"#,
        source, target
    )
}

/// Retry 429 and 5xx responses plus transport failures; other 4xx are final
fn is_retryable_error(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<ApiStatusError>() {
        Some(api_error) => {
            api_error.status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || api_error.status.is_server_error()
        }
        None => true,
    }
}

/// Provider backed by the OpenAI chat-completions API
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request(&self, text: &str, source: &str, target: &str) -> TranslationRequest {
        let is_reasoning = is_reasoning_model(&self.config.model);
        TranslationRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(source, target),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            // Reasoning models spend tokens before answering
            max_completion_tokens: if is_reasoning {
                16000
            } else {
                self.config.max_completion_tokens
            },
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }

    async fn send(&self, request: &TranslationRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send translation request to OpenAI API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(ApiStatusError { status, body }.into());
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI translation response")?;

        let translated = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .context("OpenAI translation response contained no choices")?;

        if translated.is_empty() {
            anyhow::bail!("OpenAI returned an empty translation");
        }
        Ok(translated)
    }
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = self.build_request(text, source, target);
        with_retry_if(
            &self.config.retry,
            &format!("Translation {} -> {}", source, target),
            || self.send(&request),
            is_retryable_error,
        )
        .await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn create_provider(server: &MockServer, model: &str) -> OpenAiProvider {
        let mut config = OpenAiConfig::new(
            "test-openai-key",
            model,
            &format!("{}/v1/chat/completions", server.uri()),
        );
        config.retry = RetryConfig::new(3, Duration::from_millis(10));
        OpenAiProvider::new(config)
    }

    // ==================== Success Path Tests ====================

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-openai-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response(" Bienvenido \n")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server, "gpt-4o-mini");
        let result = provider
            .translate("Welcome", "en", "es")
            .await
            .expect("Should succeed");

        assert_eq!(result, "Bienvenido");
    }

    #[tokio::test]
    async fn test_translate_sends_low_temperature_for_chat_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_openai_response("Hola")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server, "gpt-4o-mini");
        provider.translate("Hello", "en", "es").await.expect("Should succeed");
    }

    // ==================== Error Handling Tests ====================

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server, "gpt-4o-mini");
        let result = provider.translate("Hello", "en", "es").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server, "gpt-4o-mini");
        let result = provider.translate("Hello", "en", "es").await;

        assert!(result.unwrap_err().to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let provider = create_provider(&mock_server, "gpt-4o-mini");
        let result = provider.translate("Hello", "en", "es").await;

        assert!(result.unwrap_err().to_string().contains("no choices"));
    }

    // ==================== Request Structure Tests ====================

    #[test]
    fn test_is_retryable_error() {
        let rate_limited: anyhow::Error = ApiStatusError {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        }
        .into();
        let bad_request: anyhow::Error = ApiStatusError {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: String::new(),
        }
        .into();

        assert!(is_retryable_error(&rate_limited));
        assert!(!is_retryable_error(&bad_request));
        assert!(is_retryable_error(&anyhow::anyhow!("connection reset")));
    }

    #[test]
    fn test_reasoning_model_request_omits_temperature() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("key", "o3-mini", "http://unused"));
        let request = provider.build_request("Hello", "en", "es");

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(!json.contains("temperature"));
        assert!(json.contains("\"reasoning_effort\":\"low\""));
        assert_eq!(request.max_completion_tokens, 16000);
    }

    #[test]
    fn test_system_prompt_names_both_languages() {
        let prompt = build_system_prompt("en", "es");
        assert!(prompt.contains("\"en\""));
        assert!(prompt.contains("\"es\""));
        assert!(prompt.contains("{name}"));
    }
}
