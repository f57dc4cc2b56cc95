//! OpenAI-compatible chat-completions adapter
//!
//! One adapter serves every backend that speaks the OpenAI wire format
//! (OpenAI itself, Groq, OpenRouter). Backends differ only in base URL,
//! model, credential and a few auxiliary headers.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::types::{ChatMessage, ChatRole, ChatUsage, Completion, LlmProvider, StopReason};

/// Transport timeout for a single completion call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    client: Client,
    name: String,
    api_key: String,
    credential_env: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    headers: Vec<(String, String)>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("headers", &self.headers)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new provider.
    ///
    /// - `name`: human-readable label used in error messages (e.g. "Grok")
    /// - `base_url`: the endpoint root including the version segment
    ///   (e.g. `https://api.groq.com/openai/v1`)
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        max_tokens: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            name: name.into(),
            api_key: api_key.into(),
            credential_env: None,
            base_url: base_url.into(),
            model: model.into(),
            max_tokens,
            headers: Vec::new(),
        })
    }

    /// Attach an extra header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Name the environment variable the key is read from, for error messages
    pub fn with_credential_env(mut self, var: impl Into<String>) -> Self {
        self.credential_env = Some(var.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Convert provider-agnostic messages to OpenAI wire format
    fn to_openai_messages(messages: &[ChatMessage], system: &str) -> Vec<OpenAiMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);
        result.push(OpenAiMessage {
            role: ChatRole::System.to_string(),
            content: system.to_string(),
        });

        for msg in messages {
            if msg.role == ChatRole::System {
                // Only the configured system prompt goes out
                continue;
            }
            result.push(OpenAiMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            });
        }

        result
    }

    /// Convert OpenAI response to provider-agnostic format
    fn from_openai_response(resp: OpenAiApiResponse) -> Result<Completion> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("response had no choices"))?;

        let usage = resp.usage.map_or(ChatUsage::default(), |u| ChatUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            stop_reason: StopReason::from_finish_reason(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage], system: &str) -> Result<Completion> {
        if !self.has_api_key() {
            match &self.credential_env {
                Some(var) => bail!("no API key configured (set {})", var),
                None => bail!("no API key configured"),
            }
        }

        let url = self.completions_url();
        let body = OpenAiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: Self::to_openai_messages(messages, system),
        };

        debug!(
            "{} request: model={}, messages={}",
            self.name,
            self.model,
            body.messages.len()
        );

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: OpenAiApiResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        debug!(
            "{} response: choices={}, finish_reason={:?}",
            self.name,
            api_response.choices.len(),
            api_response.choices.first().map(|c| &c.finish_reason)
        );

        Self::from_openai_response(api_response)
    }
}

// ── OpenAI wire types ──

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiApiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
