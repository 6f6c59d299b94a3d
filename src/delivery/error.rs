//! Delivery error taxonomy.

use std::path::PathBuf;

use reqwest::Method;
use thiserror::Error;

/// Failure reported by a [`Transport`](super::Transport) for a single attempt
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, timeout, DNS failure and similar. Retryable.
    #[error("{0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request could not be built (bad URL, bad header). Not retryable.
    #[error("invalid request: {0}")]
    Invalid(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An attachment could not be read. Not retryable.
    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn network(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Network(err.into())
    }
}

/// Classified error surfaced to the invoking command
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to encode payload: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("{method} {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        method: Method,
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("{method} {url} failed after {attempts} attempt(s) with status {status}: {message}")]
    Server {
        method: Method,
        url: String,
        status: u16,
        message: String,
        attempts: u32,
    },

    #[error("{method} {url} was rejected with status {status}: {message}")]
    ClientRejected {
        method: Method,
        url: String,
        status: u16,
        message: String,
    },

    #[error("failed to prepare attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeliveryError {
    /// Number of network attempts made before the error was surfaced
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } | Self::Server { attempts, .. } => *attempts,
            Self::ClientRejected { .. } => 1,
            Self::Serialization(_) | Self::Attachment { .. } => 0,
        }
    }
}

/// Pull a human readable message out of an error response body.
///
/// The service answers errors with `{"message": "..."}`; anything else is
/// returned as-is.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
