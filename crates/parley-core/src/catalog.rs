//! Built-in provider catalog
//!
//! Every supported backend is a row in this table. Configuration may override
//! any field; the catalog only supplies defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::providers::OpenAiProvider;

/// Output token cap applied to every provider unless configured otherwise
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// A provider the relay knows how to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    ChatGpt,
    Grok,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::ChatGpt, Self::Grok, Self::OpenRouter];

    /// Request tag, as sent by clients
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Grok => "grok",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Name used in logs and error details
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ChatGpt => "ChatGPT",
            Self::Grok => "Grok",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Environment variable holding this provider's credential
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::ChatGpt => "OPENAI_API_KEY",
            Self::Grok => "GROQ_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Catalog defaults for this provider
    pub fn profile(&self) -> ProviderProfile {
        match self {
            Self::ChatGpt => ProviderProfile {
                base_url: "https://api.openai.com/v1",
                model: "gpt-4o",
                system_prompt: "You are a helpful assistant.",
                headers: &[],
            },
            Self::Grok => ProviderProfile {
                base_url: "https://api.groq.com/openai/v1",
                model: "llama-3.3-70b-versatile",
                system_prompt: "You are Grok, a chatbot inspired by the Hitchhiker's Guide to the Galaxy.",
                headers: &[],
            },
            Self::OpenRouter => ProviderProfile {
                base_url: "https://openrouter.ai/api/v1",
                model: "anthropic/claude-3.5-sonnet",
                system_prompt: "You are a helpful AI assistant.",
                headers: &[
                    ("HTTP-Referer", "http://localhost:3000"),
                    ("X-Title", "Multi-AI Chatbot"),
                ],
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when a tag names no known provider
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider '{0}'")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    /// Tags are matched exactly; `"ChatGPT"` is not a valid tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// Static defaults for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub base_url: &'static str,
    pub model: &'static str,
    pub system_prompt: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

/// Resolved settings for one provider: catalog defaults plus any overrides
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub headers: Vec<(String, String)>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("has_api_key", &!self.api_key.is_empty())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("headers", &self.headers)
            .finish()
    }
}

impl ProviderSettings {
    /// Catalog defaults with the given credential
    pub fn from_catalog(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            api_key: api_key.into(),
            base_url: profile.base_url.to_string(),
            model: profile.model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: profile.system_prompt.to_string(),
            headers: profile
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Build the adapter these settings describe
    pub fn build(&self) -> anyhow::Result<OpenAiProvider> {
        let provider = OpenAiProvider::new(
            self.kind.display_name(),
            self.api_key.clone(),
            self.model.clone(),
            self.base_url.clone(),
            self.max_tokens,
        )?
        .with_credential_env(self.kind.credential_env());

        Ok(self
            .headers
            .iter()
            .fold(provider, |p, (name, value)| p.with_header(name.clone(), value.clone())))
    }
}
