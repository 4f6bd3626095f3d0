//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Every provider answers an [`LlmRequest`] with a [`FragmentStream`] of text
//! pieces; [`collect_fragments`] turns that stream into the final reply.

pub mod providers;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use thiserror::Error;
use tracing::error;

use crate::session::Turn;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("GOOGLE_API_KEY is not set (environment or .env)")]
    MissingApiKey,
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("response stream failed: {0}")]
    Stream(String),
}

// ── Request ───────────────────────────────────────────────────────────────────

/// One outbound model call.
///
/// `history` is the transcript *before* the current prompt; providers append
/// `prompt` as the final user message.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub history: Vec<Turn>,
    pub prompt: String,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), ..Default::default() }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_history(mut self, history: &[Turn]) -> Self {
        self.history = history.to_vec();
        self
    }
}

/// Text pieces of a streamed reply, in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Provider instances are cheap to clone (`reqwest::Client` is an `Arc`).
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Gemini(providers::gemini::GeminiProvider),
}

impl LlmProvider {
    /// Open a response stream for `request`.
    pub async fn stream(&self, request: &LlmRequest) -> Result<FragmentStream, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.stream(request).await,
            LlmProvider::Gemini(p) => p.stream(request).await,
        }
    }

    /// Stream `request` and accumulate the whole reply, forwarding each
    /// fragment to `on_fragment` as it arrives.
    pub async fn complete(
        &self,
        request: &LlmRequest,
        on_fragment: impl FnMut(&str),
    ) -> Result<String, ProviderError> {
        let stream = self.stream(request).await?;
        collect_fragments(stream, on_fragment).await
    }

    /// Model label for display and logs.
    pub fn model_name(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Gemini(p) => p.model(),
        }
    }
}

// ── Accumulation ──────────────────────────────────────────────────────────────

/// Concatenate `stream` in arrival order with no separator.
///
/// The first error discards whatever was accumulated and is returned as-is;
/// nothing is retried.
pub async fn collect_fragments<S>(
    mut stream: S,
    mut on_fragment: impl FnMut(&str),
) -> Result<String, ProviderError>
where
    S: futures_util::Stream<Item = Result<String, ProviderError>> + Unpin,
{
    let mut full = String::new();
    let mut fragments = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(text) => {
                if text.is_empty() {
                    continue;
                }
                on_fragment(&text);
                full.push_str(&text);
                fragments += 1;
            }
            Err(e) => {
                error!(fragments, discarded_chars = full.len(), error = %e, "model response stream failed");
                return Err(e);
            }
        }
    }
    tracing::debug!(fragments, chars = full.len(), "model response complete");
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn ok(s: &str) -> Result<String, ProviderError> {
        Ok(s.to_string())
    }

    #[tokio::test]
    async fn fragments_concatenate_in_order_without_separator() {
        let s = stream::iter(vec![ok("The "), ok("quick"), ok(" brown"), ok(" fox.")]);
        let full = collect_fragments(s, |_| {}).await.unwrap();
        assert_eq!(full, "The quick brown fox.");
    }

    #[tokio::test]
    async fn sink_sees_every_fragment_in_order() {
        let mut seen = Vec::new();
        let s = stream::iter(vec![ok("a"), ok(""), ok("b"), ok("c")]);
        let full = collect_fragments(s, |f| seen.push(f.to_string())).await.unwrap();
        assert_eq!(full, "abc");
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn error_discards_partial_response() {
        let s = stream::iter(vec![
            ok("partial "),
            Err(ProviderError::Stream("connection reset".into())),
            ok("never seen"),
        ]);
        let err = collect_fragments(s, |_| {}).await.unwrap_err();
        assert!(matches!(err, ProviderError::Stream(_)));
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_string() {
        let s = stream::iter(Vec::<Result<String, ProviderError>>::new());
        assert_eq!(collect_fragments(s, |_| {}).await.unwrap(), "");
    }

    #[tokio::test]
    async fn provider_complete_uses_stream() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider::new());
        let reply = p.complete(&LlmRequest::new("hello there"), |_| {}).await.unwrap();
        assert_eq!(reply, "[echo] hello there");
        assert_eq!(p.model_name(), "dummy");
    }
}
