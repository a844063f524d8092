//! Saga error types.

use domain::DomainError;
use marketplace::{Endpoint, MarketplaceError};
use thiserror::Error;

use crate::state::Stage;

/// Errors that end a purchase attempt.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Identity or need resolution failed before the saga started.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A stage response body was not JSON.
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    /// The offer terms could not be built.
    #[error("Invalid offer terms: {0}")]
    InvalidTerms(String),

    /// A stage could not extract what the next stage needs.
    #[error("Saga stage '{stage}' failed: {reason}")]
    StageFailed { stage: Stage, reason: String },

    /// Finish answered HTTP 200 with something other than `{}`.
    #[error("Finish was not acknowledged, marketplace answered: {body}")]
    FinishMismatch { body: String },

    /// The marketplace could not be reached.
    #[error("Marketplace error: {0}")]
    Marketplace(MarketplaceError),
}

impl From<MarketplaceError> for SagaError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::Decode { endpoint, source } => SagaError::Decode { endpoint, source },
            other => SagaError::Marketplace(other),
        }
    }
}

/// Coarse classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Decode,
    Auth,
    IdentityNotFound,
    Fetch,
    Terms,
    Stage,
    FinishMismatch,
    Transport,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Decode => "decode",
            FailureKind::Auth => "auth",
            FailureKind::IdentityNotFound => "identity_not_found",
            FailureKind::Fetch => "fetch",
            FailureKind::Terms => "terms",
            FailureKind::Stage => "stage",
            FailureKind::FinishMismatch => "finish_mismatch",
            FailureKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SagaError {
    /// Classifies the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            SagaError::Domain(err) => match err {
                DomainError::Decode { .. } => FailureKind::Decode,
                DomainError::AuthFailure(_) => FailureKind::Auth,
                DomainError::IdentityNotFound(_) => FailureKind::IdentityNotFound,
                DomainError::FetchFailure { .. } => FailureKind::Fetch,
                DomainError::Marketplace(_) => FailureKind::Transport,
            },
            SagaError::Decode { .. } => FailureKind::Decode,
            SagaError::InvalidTerms(_) => FailureKind::Terms,
            SagaError::StageFailed { .. } => FailureKind::Stage,
            SagaError::FinishMismatch { .. } => FailureKind::FinishMismatch,
            SagaError::Marketplace(_) => FailureKind::Transport,
        }
    }

    pub(crate) fn stage(stage: Stage, reason: impl Into<String>) -> Self {
        SagaError::StageFailed {
            stage,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
