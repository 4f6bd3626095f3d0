//! Shared ask flow used by every section.
//!
//! [`ChatCore::ask`] is the one place a transcript meets the model: it
//! snapshots history, records the user turn, streams the reply and records
//! the assistant turn on success.

use tracing::{info, warn};

use crate::error::InteractionError;
use crate::llm::LlmRequest;
use crate::session::{Role, Section, SessionContext};

use super::AgentsState;

/// One model interaction for a section.
#[derive(Debug)]
pub struct Ask {
    pub section: Section,
    /// Text recorded as the user turn (may differ from the prompt sent).
    pub record: String,
    /// Prompt and system instruction; history is filled in by [`ChatCore::ask`].
    pub request: LlmRequest,
    pub include_history: bool,
}

impl Ask {
    /// Record and send the same text.
    pub fn plain(section: Section, input: &str, system: String) -> Self {
        Self {
            section,
            record: input.to_string(),
            request: LlmRequest::new(input).with_system(system),
            include_history: true,
        }
    }
}

pub struct ChatCore;

impl ChatCore {
    /// Reject empty and whitespace-only input before anything is touched.
    pub fn require_input(input: &str) -> Result<&str, InteractionError> {
        if input.trim().is_empty() { Err(InteractionError::EmptyInput) } else { Ok(input) }
    }

    /// Run `ask` against the section's transcript.
    ///
    /// On failure the user turn stays recorded, no assistant turn is added,
    /// and the provider error is returned.
    pub async fn ask(
        state: &AgentsState,
        session: &mut SessionContext,
        ask: Ask,
        on_fragment: &mut dyn FnMut(&str),
    ) -> Result<String, InteractionError> {
        let Ask { section, record, request, include_history } = ask;

        let request = if include_history {
            request.with_history(session.transcript(section).turns())
        } else {
            request
        };
        session.transcript_mut(section).push(Role::User, record);

        info!(
            section = %section,
            model = state.provider.model_name(),
            history = request.history.len(),
            prompt_chars = request.prompt.len(),
            "sending model request"
        );

        match state.provider.complete(&request, on_fragment).await {
            Ok(reply) => {
                info!(section = %section, chars = reply.len(), "model reply received");
                session.transcript_mut(section).push(Role::Assistant, reply.clone());
                Ok(reply)
            }
            Err(e) => {
                warn!(section = %section, error = %e, "model request failed");
                Err(e.into())
            }
        }
    }

    /// Record a reply that did not come from the model (e.g. a calculation
    /// error) as if it had, and forward it to the sink.
    pub fn record_local_reply(
        session: &mut SessionContext,
        section: Section,
        user_text: &str,
        reply: String,
        on_fragment: &mut dyn FnMut(&str),
    ) -> String {
        let transcript = session.transcript_mut(section);
        transcript.push(Role::User, user_text);
        on_fragment(&reply);
        transcript.push(Role::Assistant, reply.clone());
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::tests::{dummy_state, failing_state};
    use crate::session::CHAT_GREETING;

    #[test]
    fn whitespace_input_rejected() {
        assert!(matches!(ChatCore::require_input("  \n\t"), Err(InteractionError::EmptyInput)));
        assert_eq!(ChatCore::require_input(" hi ").unwrap(), " hi ");
    }

    #[tokio::test]
    async fn history_excludes_current_turn() {
        let state = dummy_state();
        let mut session = SessionContext::new();
        let ask = Ask::plain(Section::Chat, "first", "sys".into());

        let mut seen = String::new();
        let reply = ChatCore::ask(&state, &mut session, ask, &mut |f| seen.push_str(f)).await.unwrap();
        assert_eq!(reply, "[echo] first");
        assert_eq!(seen, reply);

        let texts: Vec<&str> = session.chat.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec![CHAT_GREETING, "first", "[echo] first"]);
    }

    #[tokio::test]
    async fn failure_keeps_user_turn_only() {
        let state = failing_state("stream cut");
        let mut session = SessionContext::new();
        let ask = Ask::plain(Section::Chat, "hello world", "sys".into());

        let err = ChatCore::ask(&state, &mut session, ask, &mut |_| {}).await.unwrap_err();
        assert!(matches!(err, InteractionError::ModelRequestFailure(_)));
        assert_eq!(session.chat.len(), 2);
        assert_eq!(session.chat.last().unwrap().role, Role::User);
    }

    #[test]
    fn local_reply_is_recorded_and_forwarded() {
        let mut session = SessionContext::new();
        let mut seen = Vec::new();
        let out = ChatCore::record_local_reply(
            &mut session,
            Section::Data,
            "q",
            "no luck".into(),
            &mut |f| seen.push(f.to_string()),
        );
        assert_eq!(out, "no luck");
        assert_eq!(seen, vec!["no luck"]);
        assert_eq!(session.data.len(), 2);
    }
}
