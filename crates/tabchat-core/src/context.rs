//! Conversation context assembly.
//!
//! Produces the exact ordered turn sequence submitted to the completion
//! endpoint: the recorded history plus one new user turn, with the current
//! data snapshot (if any) folded into that turn's text. Pure data
//! transformation; no network, no mutation of the caller's history.

use tabchat_types::{ConversationTurn, TabularSnapshot};

/// Assemble the turn sequence for one completion request.
///
/// With a snapshot present the new user content is the snapshot rendering
/// and the user text joined by exactly one newline; otherwise the user text
/// verbatim. The snapshot is never appended as its own turn.
///
/// The caller commits the returned sequence to history only after the
/// completion call succeeds.
pub fn assemble_turns(
    history: &[ConversationTurn],
    user_text: &str,
    snapshot: Option<&TabularSnapshot>,
) -> Vec<ConversationTurn> {
    let content = match snapshot {
        Some(snapshot) => format!("{}\n{}", snapshot.render(), user_text),
        None => user_text.to_string(),
    };

    let mut turns = Vec::with_capacity(history.len() + 1);
    turns.extend_from_slice(history);
    turns.push(ConversationTurn::user(content));
    turns
}
