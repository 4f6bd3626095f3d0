//! Dummy LLM provider: echoes the prompt back prefixed with `[echo]`.
//! Used for offline runs and for testing the section flows without an API key.

use futures_util::StreamExt;
use futures_util::stream;

use crate::llm::{FragmentStream, LlmRequest, ProviderError};

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    fail_with: Option<String>,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose stream breaks after the first fragment.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fail_with: Some(message.into()) }
    }

    pub async fn stream(&self, request: &LlmRequest) -> Result<FragmentStream, ProviderError> {
        let reply = format!("[echo] {}", request.prompt);
        let mut items: Vec<Result<String, ProviderError>> =
            reply.split_inclusive(' ').map(|w| Ok(w.to_string())).collect();
        if let Some(msg) = &self.fail_with {
            items.truncate(1);
            items.push(Err(ProviderError::Stream(msg.clone())));
        }
        Ok(stream::iter(items).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::collect_fragments;

    #[tokio::test]
    async fn echo_is_split_into_word_fragments() {
        let p = DummyProvider::new();
        let s = p.stream(&LlmRequest::new("hello big world")).await.unwrap();
        let parts: Vec<String> = s.map(|r| r.unwrap()).collect().await;
        assert_eq!(parts, vec!["[echo] ", "hello ", "big ", "world"]);
    }

    #[tokio::test]
    async fn complete_empty_input() {
        let p = DummyProvider::new();
        let s = p.stream(&LlmRequest::new("")).await.unwrap();
        assert_eq!(collect_fragments(s, |_| {}).await.unwrap(), "[echo] ");
    }

    #[tokio::test]
    async fn failing_mode_errors_mid_stream() {
        let p = DummyProvider::failing("boom");
        let s = p.stream(&LlmRequest::new("a b c")).await.unwrap();
        let err = collect_fragments(s, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
