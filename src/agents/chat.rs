//! Q/A chat: the user's message goes to the model as-is.

use crate::error::InteractionError;
use crate::session::{Section, SessionContext};

use super::{Ask, AgentsState, ChatCore};

pub async fn ask(
    state: &AgentsState,
    session: &mut SessionContext,
    input: &str,
    on_fragment: &mut dyn FnMut(&str),
) -> Result<String, InteractionError> {
    let input = ChatCore::require_input(input)?;
    let ask = Ask::plain(Section::Chat, input, state.prompts.system());
    ChatCore::ask(state, session, ask, on_fragment).await
}
