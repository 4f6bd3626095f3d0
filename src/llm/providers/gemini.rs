//! Gemini provider: `models/{model}:streamGenerateContent?alt=sse`.
//!
//! All Gemini wire types are private to this module. Callers hand in an
//! [`LlmRequest`] and get back a [`FragmentStream`]; the history translation
//! ([`to_contents`]) and SSE decoding ([`fragments`]) are the only logic here.

use std::fmt::Display;
use std::time::Duration;

use eventsource_stream::{Event, Eventsource};
use futures_util::{Stream, StreamExt, stream};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::config::GeminiConfig;
use crate::llm::{FragmentStream, LlmRequest, ProviderError};
use crate::session::{Role, Turn};

/// System instruction used when a request does not carry its own.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant. \
If user asks for current data (like weather, news), use GoogleSearch. \
Analyze uploaded documents if mentioned in the prompt.";

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for the Gemini REST API. Constructed once at startup, then cheaply
/// cloned because `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    google_search: bool,
    api_key: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("google_search", &self.google_search)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            google_search: config.google_search,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:streamGenerateContent?alt=sse", self.api_base_url, self.model)
    }

    fn build_body(&self, request: &LlmRequest) -> GenerateContentRequest {
        let mut contents = to_contents(&request.history);
        contents.push(Content::text("user", &request.prompt));

        let system = request.system.as_deref().unwrap_or(DEFAULT_SYSTEM_INSTRUCTION);
        let tools = if self.google_search {
            vec![Tool { google_search: GoogleSearch {} }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents,
            system_instruction: Some(SystemInstruction { parts: vec![Part { text: system.to_string() }] }),
            tools,
            generation_config: GenerationConfig { temperature: self.temperature },
        }
    }

    /// Send one request and return its fragments as they arrive.
    ///
    /// Transport and HTTP-status failures surface here; failures after the
    /// first byte surface as an `Err` item inside the stream.
    pub async fn stream(&self, request: &LlmRequest) -> Result<FragmentStream, ProviderError> {
        let body = self.build_body(request);

        debug!(
            model = %self.model,
            turns = body.contents.len(),
            prompt_len = request.prompt.len(),
            google_search = self.google_search,
            "sending Gemini request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&body)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full Gemini request payload");
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, timeout = e.is_timeout(), "Gemini HTTP request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;
        Ok(fragments(response.bytes_stream().eventsource()).boxed())
    }
}

// ── History translation ───────────────────────────────────────────────────────

/// Map transcript turns onto Gemini `contents`.
///
/// Empty turns are skipped; `User` becomes `"user"`, every other role
/// becomes `"model"`. Order is preserved.
fn to_contents(history: &[Turn]) -> Vec<Content> {
    history
        .iter()
        .filter(|turn| !turn.text.is_empty())
        .map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                _ => "model",
            };
            Content::text(role, &turn.text)
        })
        .collect()
}

// ── SSE decoding ──────────────────────────────────────────────────────────────

/// Turn SSE events into text fragments. Each event may carry several parts;
/// they are emitted in candidate order, then part order.
fn fragments<S, E>(events: S) -> impl Stream<Item = Result<String, ProviderError>> + Send + 'static
where
    S: Stream<Item = Result<Event, E>> + Send + 'static,
    E: Display,
{
    events
        .map(|event| match event {
            Ok(event) => parse_event(&event.data),
            Err(e) => Err(ProviderError::Stream(e.to_string())),
        })
        .flat_map(|parsed| match parsed {
            Ok(texts) => stream::iter(texts.into_iter().map(Ok).collect::<Vec<_>>()),
            Err(e) => stream::iter(vec![Err(e)]),
        })
}

fn parse_event(data: &str) -> Result<Vec<String>, ProviderError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(Vec::new());
    }
    trace!(data, "Gemini SSE event");

    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| ProviderError::Stream(format!("malformed event: {e}")))?;

    if let Some(err) = chunk.error {
        return Err(ProviderError::Stream(err.describe()));
    }

    Ok(chunk
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .filter(|t| !t.is_empty())
        .collect())
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self { role: role.to_string(), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

// Error envelope used by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match (&self.status, self.code) {
            (Some(status), _) => format!("{status}: {message}"),
            (None, Some(code)) => format!("[code={code}] {message}"),
            (None, None) => message.to_string(),
        }
    }
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let err = http_error(status.as_u16(), &body);
    error!(%status, error = %err, "Gemini request returned HTTP error");
    Err(err)
}

/// Build `ProviderError::Http` from a non-2xx body. Gemini's error envelope is
/// preferred; anything else is passed through as text.
fn http_error(status: u16, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => env.error.describe(),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    };
    ProviderError::Http { status, message }
}
