/// LLM Client: the single point of entry for all Gemini API calls in JobIQ.
///
/// ARCHITECTURAL RULE: No other module may call the provider directly.
/// All LLM interactions MUST go through this module.
///
/// Model: gemini-2.5-flash (hardcoded, not configurable)
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all LLM calls in JobIQ.
pub const MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 8192;
const TEMPERATURE: f32 = 0.4;
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to the provider timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response did not contain a JSON object")]
    MissingJson,
}

impl LlmError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(err)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl LlmResponse {
    /// Joins the text parts of the first candidate. `None` when the model
    /// produced no text (for example a safety block).
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single LLM client used by all services in JobIQ.
/// Wraps the Gemini `generateContent` API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry_base_delay: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    /// Points the client at another server, with a shorter backoff.
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: &str, retry_base_delay: Duration) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.retry_base_delay = retry_base_delay;
        self
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    /// Transport failures and timeouts are returned immediately.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };
        let url = format!("{}/{MODEL}:generateContent", self.base_url);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = self.retry_base_delay * (1 << (attempt - 1));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await
                .map_err(LlmError::from_transport)?;

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse =
                response.json().await.map_err(LlmError::from_transport)?;

            if let Some(usage) = &llm_response.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }
            if let Some(reason) = llm_response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .filter(|r| *r != "STOP")
            {
                warn!("LLM finished with reason {reason}");
            }

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Deserializes the JSON object embedded in model output.
pub fn parse_json_text<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let json = extract_json_object(text).ok_or(LlmError::MissingJson)?;
    serde_json::from_str(json).map_err(LlmError::Parse)
}

/// Returns the span from the first `{` to the last `}`. This drops
/// ```json fences as well as any prose the model put around the object.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::Router;

    /// Canned Gemini endpoint. Every request gets `status` and `body`
    /// after `delay`.
    pub(crate) struct StubProvider {
        pub hits: AtomicUsize,
        pub last_request: std::sync::Mutex<Option<(HeaderMap, String)>>,
        status: StatusCode,
        body: String,
        delay: Duration,
    }

    impl StubProvider {
        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    async fn answer(
        State(stub): State<Arc<StubProvider>>,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        *stub.last_request.lock().unwrap() = Some((headers, body));
        tokio::time::sleep(stub.delay).await;
        (stub.status, stub.body.clone())
    }

    /// Starts the stub on an ephemeral port and returns a client aimed at it.
    pub(crate) async fn stub_provider(
        status: StatusCode,
        body: &str,
        delay: Duration,
        timeout: Duration,
    ) -> (LlmClient, Arc<StubProvider>) {
        let stub = Arc::new(StubProvider {
            hits: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
            status,
            body: body.to_string(),
            delay,
        });
        let app = Router::new().fallback(answer).with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LlmClient::new("test-key".to_string(), timeout)
            .unwrap()
            .with_base_url(&format!("http://{addr}/models"), Duration::from_millis(5));
        (client, stub)
    }

    /// A Gemini response whose only part is `text`.
    pub(crate) fn gemini_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2}
        })
        .to_string()
    }

    const SECOND: Duration = Duration::from_secs(1);
    const LONG_TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_call_sends_gemini_request_and_reads_text() {
        let (client, stub) =
            stub_provider(StatusCode::OK, &gemini_body("{\"ok\": true}"), Duration::ZERO, LONG_TIMEOUT)
                .await;

        let response = client.call("the prompt", "the system").await.unwrap();

        assert_eq!(response.text().as_deref(), Some("{\"ok\": true}"));
        assert_eq!(stub.hits(), 1);
        let (headers, body) = stub.last_request.lock().unwrap().take().unwrap();
        assert_eq!(headers["x-goog-api-key"], "test-key");
        let sent: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["contents"][0]["parts"][0]["text"], "the prompt");
        assert_eq!(sent["systemInstruction"]["parts"][0]["text"], "the system");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_three_times() {
        let (client, stub) =
            stub_provider(StatusCode::SERVICE_UNAVAILABLE, "overloaded", Duration::ZERO, LONG_TIMEOUT)
                .await;

        let err = client.call("p", "s").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        assert_eq!(stub.hits(), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let (client, stub) =
            stub_provider(StatusCode::TOO_MANY_REQUESTS, "slow down", Duration::ZERO, LONG_TIMEOUT)
                .await;

        let err = client.call("p", "s").await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 429, .. }));
        assert_eq!(stub.hits(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let (client, stub) =
            stub_provider(StatusCode::BAD_REQUEST, body, Duration::ZERO, LONG_TIMEOUT).await;

        let err = client.call("p", "s").await.unwrap_err();

        assert!(
            matches!(&err, LlmError::Api { status: 400, message } if message == "API key not valid"),
            "{err:?}"
        );
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let (client, stub) = stub_provider(
            StatusCode::OK,
            &gemini_body("{}"),
            SECOND,
            Duration::from_millis(100),
        )
        .await;

        let err = client.call("p", "s").await.unwrap_err();

        assert!(matches!(err, LlmError::Timeout), "{err:?}");
        assert_eq!(stub.hits(), 1);
    }

    #[test]
    fn test_extract_json_with_json_fence() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_object(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_json_without_fence_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_object(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_json_surrounded_by_prose() {
        let input = "Sure! Here it is: {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_json_object(input), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extract_json_none_without_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_json_text_reports_missing_json() {
        let result: Result<serde_json::Value, _> = parse_json_text("I cannot help with that.");
        assert!(matches!(result, Err(LlmError::MissingJson)));
    }

    #[test]
    fn test_response_text_joins_parts_of_first_candidate() {
        let json = r#"{
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                    "finishReason": "STOP"
                },
                {
                    "content": {"role": "model", "parts": [{"text": "ignored"}]}
                }
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\": 1}"));
        assert_eq!(response.usage_metadata.unwrap().prompt_token_count, 12);
    }

    #[test]
    fn test_response_text_none_when_blocked() {
        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());

        let empty: LlmResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_request_serializes_in_gemini_shape() {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                max_output_tokens: 10,
                temperature: 0.5,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 10);
    }
}
