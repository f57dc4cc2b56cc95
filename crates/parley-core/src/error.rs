use thiserror::Error;

/// Failure of a single relayed chat request
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request named a provider tag the relay does not know
    #[error("Invalid provider")]
    InvalidProvider(String),

    /// The provider call failed; `provider` is the display name
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },
}

impl RelayError {
    pub fn provider(provider: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: format!("{:#}", err),
        }
    }

    /// Whether the caller sent bad input (as opposed to an upstream failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidProvider(_))
    }
}
