use thiserror::Error;

use crate::Endpoint;

/// Errors that can occur when talking to the marketplace.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("Transport error calling {endpoint}: {reason}")]
    Transport { endpoint: Endpoint, reason: String },

    /// The response body was not the JSON shape the call expects.
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    /// A request payload could not be serialized.
    #[error("Could not encode request for {endpoint}: {source}")]
    Encode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    /// The configured client settings or URLs are unusable.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

/// Result type for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketplaceError>;
