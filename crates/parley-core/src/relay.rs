//! Request router: picks the provider named by a request and relays the chat

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{ProviderKind, ProviderSettings};
use crate::error::RelayError;
use crate::history::build_messages;
use crate::providers::LlmProvider;
use crate::types::{ChatRequest, ChatResponse, HistoryEntry};

struct Route {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
}

/// Summary of a registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub kind: ProviderKind,
    pub name: String,
    pub model: String,
}

/// Dispatches chat requests to their provider adapter.
///
/// Immutable once built; clone the `Arc` to share it across requests.
#[derive(Default)]
pub struct ChatRelay {
    routes: BTreeMap<ProviderKind, Route>,
}

impl std::fmt::Debug for ChatRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelay")
            .field("providers", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ChatRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a relay with one OpenAI-compatible adapter per settings entry
    pub fn from_settings(settings: &[ProviderSettings]) -> Result<Self> {
        let mut relay = Self::new();
        for s in settings {
            if s.api_key.is_empty() {
                warn!(
                    "{} has no API key; set {} to enable it",
                    s.kind.display_name(),
                    s.kind.credential_env()
                );
            }
            relay = relay.with_provider(s.kind, Arc::new(s.build()?), s.system_prompt.clone());
        }
        Ok(relay)
    }

    /// Register (or replace) the adapter for a provider
    pub fn with_provider(
        mut self,
        kind: ProviderKind,
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
    ) -> Self {
        info!(
            "Registered provider {} ({}, model {})",
            kind,
            provider.provider_name(),
            provider.model()
        );
        self.routes.insert(
            kind,
            Route {
                provider,
                system_prompt: system_prompt.into(),
            },
        );
        self
    }

    /// Registered providers in tag order
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.routes
            .iter()
            .map(|(kind, route)| ProviderInfo {
                kind: *kind,
                name: route.provider.provider_name().to_string(),
                model: route.provider.model().to_string(),
            })
            .collect()
    }

    /// Relay a request and wrap the reply, echoing the request's provider tag
    pub async fn route(&self, request: &ChatRequest) -> Result<ChatResponse, RelayError> {
        let kind: ProviderKind = request
            .provider
            .parse()
            .map_err(|_| RelayError::InvalidProvider(request.provider.clone()))?;

        let response = self
            .complete(kind, request.history(), &request.message)
            .await?;

        Ok(ChatResponse {
            response,
            provider: request.provider.clone(),
        })
    }

    /// Send one message plus recent history to `kind` and return the reply text
    pub async fn complete(
        &self,
        kind: ProviderKind,
        history: &[HistoryEntry],
        message: &str,
    ) -> Result<String, RelayError> {
        let route = self.routes.get(&kind).ok_or_else(|| RelayError::Provider {
            provider: kind.display_name().to_string(),
            message: "provider is not configured".to_string(),
        })?;

        let messages = build_messages(history, message);
        debug!(
            "Relaying to {} (history={}, messages={})",
            kind,
            history.len(),
            messages.len()
        );

        match route.provider.chat(&messages, &route.system_prompt).await {
            Ok(completion) => {
                debug!(
                    "{} usage: input_tokens={}, output_tokens={}",
                    kind, completion.usage.input_tokens, completion.usage.output_tokens
                );
                if completion.stop_reason.is_truncated() {
                    debug!("{} reply hit the output token limit", kind);
                }
                Ok(completion.text)
            }
            Err(e) => {
                let err = RelayError::provider(kind.display_name(), &e);
                warn!("{}", err);
                Err(err)
            }
        }
    }
}
