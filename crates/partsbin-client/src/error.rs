use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`crate::InventoryClient`].
///
/// `Display` is the message shown to the user; transport details stay in the
/// `source` chain.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("could not reach the server: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status. `message` comes from the
    /// JSON error body when there is one.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// HTTP 429. `retry_after` is the delay the server asked for, when it
    /// sent a `Retry-After` header in seconds.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("unexpected response for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },
}

impl ClientError {
    /// HTTP status of an API error, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::RateLimited { .. } => Some(429),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
