//! Chat-completion provider layer
//!
//! Providers implement the [`LlmProvider`] trait. The relay only ever talks to
//! the trait; [`OpenAiProvider`] is the one concrete backend.

pub mod openai;
pub mod types;

pub use openai::OpenAiProvider;
pub use types::{ChatMessage, ChatRole, ChatUsage, Completion, LlmProvider, StopReason};
