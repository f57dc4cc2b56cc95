//! parley-core - provider relay for the parley chat gateway
//!
//! This crate provides:
//! - The request/response shapes exchanged with chat clients
//! - A provider catalog (ChatGPT, Groq-hosted Grok, OpenRouter) with overridable defaults
//! - One OpenAI-compatible chat-completions adapter shared by every provider
//! - History shaping (last 10 turns, user/assistant role mapping)
//! - [`ChatRelay`], which validates the provider tag and dispatches the call

pub mod catalog;
pub mod error;
pub mod history;
pub mod providers;
pub mod relay;
pub mod types;

pub use catalog::{DEFAULT_MAX_TOKENS, ProviderKind, ProviderSettings};
pub use error::RelayError;
pub use history::{HISTORY_WINDOW, build_messages};
pub use providers::{ChatMessage, ChatRole, Completion, LlmProvider, OpenAiProvider};
pub use relay::{ChatRelay, ProviderInfo};
pub use types::{ChatRequest, ChatResponse, HistoryEntry};
