//! Error types for the gateway layer.

use thiserror::Error;

use crate::provider::ProviderError;

/// The three ways a gateway operation can fail.
///
/// The HTTP layer maps each variant onto one status; the message is sent to
/// the caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Caller input could not be parsed. Detected before any provider call.
    #[error("{0}")]
    BadRequest(String),
    /// The provider answered but had no bars for the request.
    #[error("{0}")]
    NotFound(String),
    /// The provider call failed; carries the provider's own message.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Internal(msg) => msg,
        }
    }
}

impl From<ProviderError> for GatewayError {
    fn from(e: ProviderError) -> Self {
        Self::Internal(e.to_string())
    }
}
