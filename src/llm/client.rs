//! HTTP client for the OpenAI-compatible extraction endpoint
//!
//! Sends the fixed instruction block plus one scoped HTML fragment to the
//! chat completions API and parses the structured JSON payload out of the
//! completion. Requests that hit a rate limit (HTTP 429) are retried with
//! the server-provided `Retry-After` delay and exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::config::{EXTRACTION_INSTRUCTIONS, LlmConfig};
use crate::extract::{ExtractError, ExtractionCandidate, Extractor};

use super::error::LlmError;

/// Default timeout for extraction requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Maximum retry attempts for rate-limited requests
const MAX_RETRIES: u32 = 3;

/// Fallback retry delay when no Retry-After header is provided
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Backoff delay cap in seconds
const MAX_RETRY_DELAY_SECS: u64 = 60;

/// LLM extraction client for an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    instructions: String,
}

#[cfg(test)]
impl LlmClient {
    /// Set the base URL (for testing only)
    pub fn set_base_url(&mut self, url: String) {
        self.base_url = url;
    }
}

impl LlmClient {
    /// Create a client from the run configuration.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            instructions: EXTRACTION_INSTRUCTIONS.to_string(),
        })
    }

    /// Replace the instruction block sent with every request.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Run one extraction over an HTML fragment and return the parsed JSON
    /// payload.
    #[instrument(skip(self, html), fields(html_len = html.len()))]
    pub async fn extract_value(&self, html: &str) -> Result<Value, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.instructions.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: format!(
                        "Extract the requested data from the following HTML fragment.\n\n{html}"
                    ),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let response = self.execute(&request).await?;
        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| LlmError::MalformedOutput("response has no choices".to_string()))?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "extraction call completed"
            );
        }

        parse_payload(content)
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut attempts = 0;

        loop {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;

                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|header| header.to_str().ok())
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                let body = response.text().await?;
                error!("API error: {} - {}", status, body);

                if attempts <= MAX_RETRIES {
                    let exp_factor = u64::pow(2, attempts - 1);
                    let delay = retry_after
                        .saturating_mul(exp_factor)
                        .min(MAX_RETRY_DELAY_SECS);

                    debug!(
                        "Rate limited. Retrying after {} seconds (attempt {}/{})",
                        delay, attempts, MAX_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    continue;
                }

                return Err(LlmError::RateLimit {
                    retry_after_secs: retry_after,
                });
            }

            let body = response.text().await?;

            if status.is_success() {
                return serde_json::from_str(&body).map_err(|err| {
                    error!("Failed to parse response: {}", err);
                    LlmError::MalformedOutput(format!("failed to parse response: {err}"))
                });
            }

            error!("API error: {} - {}", status, body);
            return if status == StatusCode::UNAUTHORIZED {
                Err(LlmError::Auth("invalid API key or credentials".to_string()))
            } else {
                Err(LlmError::Api {
                    status_code: status.as_u16(),
                    message: body,
                })
            };
        }
    }
}

#[async_trait]
impl Extractor for LlmClient {
    async fn extract(&self, fragment: &str) -> Result<ExtractionCandidate, ExtractError> {
        let value = self
            .extract_value(fragment)
            .await
            .map_err(|err| ExtractError::Llm(err.to_string()))?;
        Ok(ExtractionCandidate::from(value))
    }
}

/// Parse the JSON document out of a completion, tolerating code fences and
/// leading/trailing prose.
fn parse_payload(content: &str) -> Result<Value, LlmError> {
    if let Ok(value) = serde_json::from_str(content) {
        return Ok(value);
    }

    let cleaned = extract_json_from_text(content)
        .ok_or_else(|| LlmError::MalformedOutput("no JSON found in completion".to_string()))?;
    serde_json::from_str(&cleaned)
        .map_err(|err| LlmError::MalformedOutput(format!("invalid JSON in completion: {err}")))
}

/// Pull a JSON block out of surrounding text: fenced ```json blocks first,
/// then bare fences, then the outermost brace pair.
fn extract_json_from_text(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim().to_string());
        }
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim().to_string());
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return Some(text[start..=end].to_string());
        }
    }

    None
}

// OpenAI API request/response structures
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    fn test_client(base_url: String) -> LlmClient {
        let config = LlmConfig {
            api_key: "test-key".to_string(),
            ..LlmConfig::default()
        };
        let mut client = LlmClient::new(&config).unwrap();
        client.set_base_url(base_url);
        client
    }

    fn completion_body(content: &str) -> String {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_extract_parses_json_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(r#"{"timeline": [{"minute": 10}]}"#))
            .expect(1)
            .create_async()
            .await;

        let client = test_client(server.url());
        let value = client.extract_value("<div>html</div>").await.unwrap();
        assert_eq!(value["timeline"][0]["minute"], json!(10));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_tolerates_code_fences() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion_body(
                "Here is the data:\n```json\n{\"score\": \"2-1\"}\n```",
            ))
            .create_async()
            .await;

        let client = test_client(server.url());
        let value = client.extract_value("<div/>").await.unwrap();
        assert_eq!(value["score"], json!("2-1"));
    }

    #[tokio::test]
    async fn test_auth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = test_client(server.url());
        let result = client.extract_value("<div/>").await;
        assert!(matches!(result, Err(LlmError::Auth(_))));
    }

    #[tokio::test]
    async fn test_rate_limit_retry_success() {
        let mut server = Server::new_async().await;

        let mock_rate_limit = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        let mock_success = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion_body(r#"{"ok": true}"#))
            .expect(1)
            .create_async()
            .await;

        let client = test_client(server.url());
        let value = client.extract_value("<div/>").await.unwrap();
        assert_eq!(value["ok"], json!(true));

        mock_rate_limit.assert_async().await;
        mock_success.assert_async().await;
    }

    #[tokio::test]
    async fn test_unparseable_completion_is_malformed_output() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(completion_body("I could not find any structured data."))
            .create_async()
            .await;

        let client = test_client(server.url());
        let result = client.extract_value("<div/>").await;
        assert!(matches!(result, Err(LlmError::MalformedOutput(_))));
    }

    #[test]
    fn test_extract_json_from_text() {
        assert_eq!(
            extract_json_from_text("```json\n{\"a\": 1}\n```").as_deref(),
            Some("{\"a\": 1}")
        );
        assert_eq!(
            extract_json_from_text("noise {\"a\": 1} trailing").as_deref(),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_from_text("no json here"), None);
    }
}
