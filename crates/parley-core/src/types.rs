use serde::{Deserialize, Deserializer, Serialize};

use crate::history::HISTORY_WINDOW;

/// Sender tag that marks a history entry as written by the user
pub const USER_SENDER: &str = "user";

/// Inbound chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Provider tag, validated by the relay rather than at deserialization
    pub provider: String,
    /// Only the last [`HISTORY_WINDOW`] entries are kept; older ones are
    /// dropped unread.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "recent_history"
    )]
    pub conversation_history: Option<Vec<HistoryEntry>>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: provider.into(),
            conversation_history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.conversation_history = Some(history);
        self
    }

    /// Prior turns, oldest first. Absent and `null` both read as empty.
    pub fn history(&self) -> &[HistoryEntry] {
        self.conversation_history.as_deref().unwrap_or_default()
    }
}

fn recent_history<'de, D>(deserializer: D) -> Result<Option<Vec<HistoryEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Vec<serde_json::Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let skip = raw.len().saturating_sub(HISTORY_WINDOW);
    raw.into_iter()
        .skip(skip)
        .map(|entry| serde_json::from_value(entry).map_err(serde::de::Error::custom))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// One prior turn of the conversation as the client recorded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == USER_SENDER
    }
}

/// Outbound chat response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Echo of the request's provider tag
    pub provider: String,
}
