//! Document Q/A: questions are answered against the extracted text of the
//! last uploaded PDF or DOCX.

use std::path::Path;

use tracing::{info, warn};

use crate::error::InteractionError;
use crate::extract;
use crate::session::{LoadedDocument, Section, SessionContext};

use super::{Ask, AgentsState, ChatCore};

/// Extract `path` off the async runtime and make it the current document.
/// A failed extraction keeps whatever was loaded before.
pub async fn upload(
    _state: &AgentsState,
    session: &mut SessionContext,
    path: &Path,
) -> Result<String, InteractionError> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract::extract_text(&owned))
        .await
        .map_err(|e| InteractionError::Io(std::io::Error::other(e)))?
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "document upload failed"))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let chars = text.chars().count();
    info!(document = %name, chars, "document loaded");

    session.document = Some(LoadedDocument { name: name.clone(), text });
    Ok(format!("Loaded `{name}` ({chars} characters extracted). Ask a question about the document."))
}

pub async fn ask(
    state: &AgentsState,
    session: &mut SessionContext,
    input: &str,
    on_fragment: &mut dyn FnMut(&str),
) -> Result<String, InteractionError> {
    let question = ChatCore::require_input(input)?;
    let document = match &session.document {
        Some(doc) if !doc.text.is_empty() => doc,
        _ => return Err(InteractionError::NoDocument),
    };

    let ask = Ask {
        section: Section::Docs,
        record: question.to_string(),
        request: crate::llm::LlmRequest::new(state.prompts.docs_qa(&document.text, question))
            .with_system(state.prompts.system()),
        include_history: true,
    };
    ChatCore::ask(state, session, ask, on_fragment).await
}
