//! Domain error types.

use marketplace::{Endpoint, MarketplaceError};
use thiserror::Error;

/// Errors that can occur while resolving the facts a purchase needs.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A response body was not the JSON the call expects.
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    /// The credential is not accepted by the marketplace.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// The authenticated company has no supplier id.
    #[error("Supplier identity not found: {0}")]
    IdentityNotFound(String),

    /// The need could not be fetched or is unusable.
    #[error("Could not fetch need {need_id}: {reason}")]
    FetchFailure { need_id: String, reason: String },

    /// The marketplace could not be reached.
    #[error("Marketplace error: {0}")]
    Marketplace(MarketplaceError),
}

impl From<MarketplaceError> for DomainError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::Decode { endpoint, source } => DomainError::Decode { endpoint, source },
            other => DomainError::Marketplace(other),
        }
    }
}
