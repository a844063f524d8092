use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{Endpoint, MarketplaceError, Result};

/// Bearer token handed to the bid submission from outside.
///
/// Scoped to one attempt: it travels with every request instead of being
/// installed on a shared client, so concurrent attempts never see each
/// other's token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token. Returns `None` for a blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Returns the raw token.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Returns the value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// HTTP method of a marketplace call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully built marketplace request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a GET request.
    pub fn get(endpoint: Endpoint, url: impl Into<String>) -> Self {
        Self {
            endpoint,
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    /// Creates a POST request with a JSON body.
    pub fn post(endpoint: Endpoint, url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            endpoint,
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// Raw marketplace response: status code and body text.
///
/// Interpretation is left to the caller; several calls treat the status and
/// the body independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub endpoint: Endpoint,
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Returns true when the marketplace answered HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| MarketplaceError::Decode {
            endpoint: self.endpoint,
            source,
        })
    }

    /// Returns the body shortened for log lines and error messages.
    pub fn body_excerpt(&self) -> String {
        const LIMIT: usize = 200;
        if self.body.chars().count() <= LIMIT {
            self.body.clone()
        } else {
            let mut excerpt: String = self.body.chars().take(LIMIT).collect();
            excerpt.push('…');
            excerpt
        }
    }
}

/// Sends marketplace requests.
///
/// Implementations must be thread-safe; one transport is shared by every
/// concurrent attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and returns whatever the marketplace answered.
    ///
    /// Non-200 statuses are not errors at this level; only a missing
    /// response is.
    async fn send(&self, request: ApiRequest, credential: &Credential) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: ApiRequest, credential: &Credential) -> Result<ApiResponse> {
        (**self).send(request, credential).await
    }
}
