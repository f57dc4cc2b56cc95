//! Turns client history into the message list sent to a provider

use crate::providers::ChatMessage;
use crate::types::HistoryEntry;

/// How many prior turns are forwarded with each request
pub const HISTORY_WINDOW: usize = 10;

/// The most recent [`HISTORY_WINDOW`] entries, oldest first
pub fn recent(history: &[HistoryEntry]) -> &[HistoryEntry] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Build the conversation for one call: the recent history followed by the new
/// user message. Any sender other than `"user"` becomes an assistant turn.
pub fn build_messages(history: &[HistoryEntry], message: &str) -> Vec<ChatMessage> {
    let recent = recent(history);
    let mut messages = Vec::with_capacity(recent.len() + 1);
    for entry in recent {
        if entry.is_user() {
            messages.push(ChatMessage::user(entry.text.clone()));
        } else {
            messages.push(ChatMessage::assistant(entry.text.clone()));
        }
    }
    messages.push(ChatMessage::user(message));
    messages
}
