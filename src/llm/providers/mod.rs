//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod gemini;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and the optional API key.
///
/// `api_key` is sourced from `GOOGLE_API_KEY` (never TOML). The Gemini
/// backend refuses to build without it.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider::new())),
        "gemini" => {
            let key = api_key.ok_or(ProviderError::MissingApiKey)?;
            let p = gemini::GeminiProvider::new(&config.gemini, key)?;
            Ok(LlmProvider::Gemini(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn llm_config(provider: &str) -> LlmConfig {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp")).llm;
        cfg.provider = provider.to_string();
        cfg
    }

    #[test]
    fn builds_dummy_without_key() {
        assert!(matches!(build(&llm_config("dummy"), None), Ok(LlmProvider::Dummy(_))));
    }

    #[test]
    fn gemini_requires_key() {
        assert!(matches!(build(&llm_config("gemini"), None), Err(ProviderError::MissingApiKey)));
    }

    #[test]
    fn builds_gemini_with_key() {
        let p = build(&llm_config("gemini"), Some("k".into())).unwrap();
        assert_eq!(p.model_name(), "test-model");
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = build(&llm_config("openai"), None).unwrap_err();
        assert!(err.to_string().contains("openai"));
    }
}
