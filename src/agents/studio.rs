//! Writing studio: rewrite or generate text for a chosen action, tone and
//! audience.
//!
//! Each run is a standalone editing task. The transcript keeps a short
//! record of the request; the model receives the full input with the editor
//! instruction and no earlier turns.

use tracing::debug;

use crate::error::InteractionError;
use crate::llm::LlmRequest;
use crate::session::{Section, SessionContext, StudioSettings, Turn};

use super::{Ask, AgentsState, ChatCore};

/// Characters of the input kept in the transcript record.
const RECORD_PREVIEW_CHARS: usize = 100;

/// `ACTION/TONE/AUDIENCE/INPUT` summary stored as the user turn.
pub fn request_record(settings: &StudioSettings, input: &str) -> String {
    let preview: String = input.chars().take(RECORD_PREVIEW_CHARS).collect();
    format!(
        "ACTION: {}\nTONE: {}\nAUDIENCE: {}\nINPUT: {preview}...",
        settings.action, settings.tone, settings.audience
    )
}

pub async fn run(
    state: &AgentsState,
    session: &mut SessionContext,
    input: &str,
    on_fragment: &mut dyn FnMut(&str),
) -> Result<String, InteractionError> {
    let input = ChatCore::require_input(input)?;
    let settings = &session.studio_settings;
    debug!(action = %settings.action, tone = %settings.tone, audience = %settings.audience, "studio run");

    let system = state.prompts.studio_editor(
        &settings.action.as_str().to_lowercase(),
        settings.tone.as_str(),
        &settings.audience,
    );
    let ask = Ask {
        section: Section::Studio,
        record: request_record(settings, input),
        request: LlmRequest::new(input).with_system(system),
        include_history: false,
    };
    ChatCore::ask(state, session, ask, on_fragment).await
}

/// Studio output is read newest first.
pub fn history(session: &SessionContext) -> impl Iterator<Item = &Turn> {
    session.studio.turns().iter().rev()
}
