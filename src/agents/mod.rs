//! Section handlers.
//!
//! Each section is a module of free functions over a shared [`AgentsState`]
//! and the caller's [`SessionContext`]. [`respond`] routes a plain console
//! message to the active section.

pub mod chat;
pub mod core;
#[cfg(feature = "section-data")]
pub mod data;
#[cfg(feature = "section-docs")]
pub mod docs;
#[cfg(feature = "section-studio")]
pub mod studio;

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::InteractionError;
use crate::llm::LlmProvider;
use crate::prompts::Prompts;
use crate::session::{Section, SessionContext};

pub use self::core::{Ask, ChatCore};

/// Everything a section needs besides the session itself.
#[derive(Debug, Clone)]
pub struct AgentsState {
    pub provider: LlmProvider,
    pub prompts: Prompts,
    /// Base directory for relative upload, export and report paths.
    pub work_dir: PathBuf,
    /// Rows of the dataset sent as analyst context; `0` sends all of them.
    pub max_context_rows: usize,
}

impl AgentsState {
    pub fn new(config: &Config, provider: LlmProvider) -> Self {
        Self {
            provider,
            prompts: Prompts::new(&config.prompts_dir),
            work_dir: config.work_dir.clone(),
            max_context_rows: config.data.max_context_rows,
        }
    }

    /// Resolve a user-supplied path against the work directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.work_dir.join(path) }
    }
}

/// Send `input` to the active section.
pub async fn respond(
    state: &AgentsState,
    session: &mut SessionContext,
    input: &str,
    on_fragment: &mut dyn FnMut(&str),
) -> Result<String, InteractionError> {
    match session.active {
        Section::Chat => chat::ask(state, session, input, on_fragment).await,
        #[cfg(feature = "section-docs")]
        Section::Docs => docs::ask(state, session, input, on_fragment).await,
        #[cfg(feature = "section-data")]
        Section::Data => data::ask(state, session, input, on_fragment).await,
        #[cfg(feature = "section-studio")]
        Section::Studio => studio::run(state, session, input, on_fragment).await,
        #[allow(unreachable_patterns)]
        other => Err(InteractionError::SectionDisabled(other.as_str())),
    }
}

/// Load an uploaded file into whichever section handles its type.
/// Returns the section that took it and a message for the console.
pub async fn upload(
    state: &AgentsState,
    session: &mut SessionContext,
    path: &Path,
) -> Result<(Section, String), InteractionError> {
    let path = state.resolve(path);

    #[cfg(feature = "section-docs")]
    if crate::extract::is_document(&path) {
        let msg = docs::upload(state, session, &path).await?;
        return Ok((Section::Docs, msg));
    }

    #[cfg(feature = "section-data")]
    if crate::dataset::is_dataset(&path) {
        let msg = data::upload(state, session, &path).await?;
        return Ok((Section::Data, msg));
    }

    let _ = session;
    Err(InteractionError::UnsupportedUpload(path.display().to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;

    pub(crate) fn dummy_state() -> AgentsState {
        state_with(LlmProvider::Dummy(DummyProvider::new()))
    }

    pub(crate) fn failing_state(msg: &str) -> AgentsState {
        state_with(LlmProvider::Dummy(DummyProvider::failing(msg)))
    }

    fn state_with(provider: LlmProvider) -> AgentsState {
        let config = Config::test_default(&std::env::temp_dir());
        AgentsState::new(&config, provider)
    }

    #[tokio::test]
    async fn respond_routes_to_active_section() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        let reply = respond(&state, &mut session, "hi", &mut |_| {}).await.unwrap();
        assert_eq!(reply, "[echo] hi");
        assert_eq!(session.chat.len(), 3);
        assert_eq!(session.docs.len(), 1);
    }

    #[tokio::test]
    async fn unsupported_upload_is_rejected() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        let err = upload(&state, &mut session, Path::new("/tmp/picture.png")).await.unwrap_err();
        assert!(matches!(err, InteractionError::UnsupportedUpload(_)));
    }

    #[test]
    fn relative_paths_resolve_against_work_dir() {
        let state = dummy_state();
        assert_eq!(state.resolve(Path::new("/abs/x.csv")), PathBuf::from("/abs/x.csv"));
        assert_eq!(state.resolve(Path::new("x.csv")), state.work_dir.join("x.csv"));
    }
}
