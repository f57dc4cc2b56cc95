//! Shared fixtures for gateway integration tests.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use parley_core::providers::{ChatUsage, StopReason};
use parley_core::{ChatMessage, ChatRelay, Completion, LlmProvider, ProviderKind};
use parley_gateway::GatewayServer;

/// A recorded provider call: messages and system prompt
pub type Call = (Vec<ChatMessage>, String);

/// Provider double that records calls and returns a canned result
pub struct MockProvider {
    name: String,
    reply: std::result::Result<String, String>,
    calls: Mutex<Vec<Call>>,
}

impl MockProvider {
    pub fn ok(name: &str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &str, error: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Err(error.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn chat(&self, messages: &[ChatMessage], system: &str) -> Result<Completion> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), system.to_string()));
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                stop_reason: StopReason::EndTurn,
                usage: ChatUsage::default(),
            }),
            Err(e) => Err(anyhow!("{}", e)),
        }
    }
}

/// Router with the same mock behind every provider tag
pub fn test_app(mock: Arc<MockProvider>) -> Router {
    let relay = ProviderKind::ALL
        .into_iter()
        .fold(ChatRelay::new(), |relay, kind| {
            relay.with_provider(kind, mock.clone(), kind.profile().system_prompt)
        });
    GatewayServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(relay)).router()
}
