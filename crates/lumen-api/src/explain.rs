//! Client for the text-completion endpoint behind `/api/niv/explain`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ApiError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 500;
const API_KEY_PREFIX: &str = "sk-";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that explains Bible verses clearly and simply.";

#[derive(Debug, Clone)]
pub struct ExplainConfig {
    pub endpoint: String,
    pub model: String,
    /// Raw value as configured. Normalized by [`normalize_api_key`].
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything the prompt needs, after defaults and profile overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainParams {
    pub book: String,
    pub chapter: i64,
    pub start_verse: i64,
    pub end_verse: i64,
    pub age: i64,
    pub belief: i64,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct ExplainClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

/// Strip whitespace and stray quotes that often surround keys pasted into
/// env files. Empty after stripping means unset.
pub fn normalize_api_key(raw: &str) -> Option<String> {
    let key = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if key.is_empty() { None } else { Some(key.to_string()) }
}

pub fn build_prompt(params: &ExplainParams) -> String {
    format!(
        "Context: Book {}, Chapter {}, Verses {}-{}, Age {}, Belief {}/5. \
         Use age and belief only to adjust tone and depth. \
         Do not mention them in the response. \
         Give a clear summary and explain the verses in a simple, relevant way.",
        params.book, params.chapter, params.start_verse, params.end_verse, params.age, params.belief,
    )
}

impl ExplainClient {
    pub fn new(config: ExplainConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
            model: config.model,
            api_key: config.api_key.as_deref().and_then(normalize_api_key),
        })
    }

    /// The configured key, or the 500 the route answers with before any
    /// outbound call.
    pub fn api_key(&self) -> Result<&str, ApiError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Config("OpenAI API key not configured".into()))?;
        if !key.starts_with(API_KEY_PREFIX) {
            return Err(ApiError::Config("Invalid API key format".into()));
        }
        Ok(key)
    }

    pub async fn explain(&self, params: &ExplainParams) -> Result<String, ApiError> {
        let api_key = self.api_key()?;

        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: build_prompt(params),
                },
            ],
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Explanation API call failed: {}", e);
                ApiError::Upstream("Failed to get explanation".into())
            })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Explanation API returned status {}", status);
            return Err(ApiError::Upstream("Failed to get explanation".into()));
        }

        let parsed: CompletionResponse = resp.json().await.map_err(|e| {
            error!("Failed to parse explanation response: {}", e);
            ApiError::Upstream("Failed to parse response".into())
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("No explanation available".into()))?;

        info!(
            "Explained {} {}:{}-{}",
            params.book, params.chapter, params.start_verse, params.end_verse
        );
        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    fn params() -> ExplainParams {
        ExplainParams {
            book: "Genesis".into(),
            chapter: 1,
            start_verse: 1,
            end_verse: 3,
            age: 25,
            belief: 3,
        }
    }

    fn client(endpoint: String, key: Option<&str>) -> ExplainClient {
        ExplainClient::new(ExplainConfig {
            endpoint,
            api_key: key.map(str::to_string),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    /// Serve `router` on an ephemeral port and return its URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    #[test]
    fn prompt_embeds_every_parameter() {
        let prompt = build_prompt(&params());
        assert!(prompt.starts_with("Context: Book Genesis, Chapter 1, Verses 1-3, Age 25, Belief 3/5."));
        assert!(prompt.contains("Do not mention them"));
    }

    #[test]
    fn api_key_normalization() {
        assert_eq!(normalize_api_key("  \"sk-abc\"  "), Some("sk-abc".into()));
        assert_eq!(normalize_api_key("'sk-abc'"), Some("sk-abc".into()));
        assert_eq!(normalize_api_key("  "), None);
        assert_eq!(normalize_api_key("\"\""), None);
    }

    #[test]
    fn missing_or_malformed_key_is_a_config_error() {
        let missing = client(DEFAULT_ENDPOINT.into(), None);
        match missing.api_key() {
            Err(ApiError::Config(msg)) => assert!(msg.contains("OpenAI API key")),
            other => panic!("unexpected: {other:?}"),
        }

        let malformed = client(DEFAULT_ENDPOINT.into(), Some("pk-123"));
        assert!(matches!(malformed.api_key(), Err(ApiError::Config(_))));

        let good = client(DEFAULT_ENDPOINT.into(), Some("sk-123"));
        assert_eq!(good.api_key().unwrap(), "sk-123");
    }

    #[tokio::test]
    async fn relays_first_choice() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: axum::http::HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *captured.lock().unwrap() = Some((auth, body));
                    Json(json!({
                        "choices": [
                            { "message": { "role": "assistant", "content": "In the beginning..." } },
                            { "message": { "role": "assistant", "content": "ignored" } }
                        ]
                    }))
                }
            }),
        );
        let url = serve(router).await;

        let text = client(url, Some("sk-test")).explain(&params()).await.unwrap();
        assert_eq!(text, "In the beginning...");

        let (auth, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(auth, "Bearer sk-test");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], build_prompt(&params()));
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_failure() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let url = serve(router).await;

        let err = client(url, Some("sk-test")).explain(&params()).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_upstream_failure() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let url = serve(router).await;

        match client(url, Some("sk-test")).explain(&params()).await {
            Err(ApiError::Upstream(msg)) => assert_eq!(msg, "No explanation available"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_body_is_upstream_failure() {
        let router = Router::new().route("/v1/chat/completions", post(|| async { "not json" }));
        let url = serve(router).await;

        let err = client(url, Some("sk-test")).explain(&params()).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn transport_error_is_upstream_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/v1/chat/completions"), Some("sk-test"))
            .explain(&params())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
