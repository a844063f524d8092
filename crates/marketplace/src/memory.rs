use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::{ApiRequest, ApiResponse, Credential, Endpoint, MarketplaceError, Result, Transport};

/// A request as the in-memory marketplace received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub authorization: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String },
    Fail(String),
}

#[derive(Debug, Default)]
struct InMemoryMarketplaceState {
    replies: HashMap<Endpoint, Reply>,
    requests: Vec<RecordedRequest>,
}

/// In-memory marketplace for testing.
///
/// Each endpoint answers with whatever was scripted for it, every time it is
/// called. Calls to an endpoint with nothing scripted fail as transport
/// errors. Every request is recorded in arrival order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplace {
    state: Arc<RwLock<InMemoryMarketplaceState>>,
}

impl InMemoryMarketplace {
    /// Creates a marketplace with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the raw status and body an endpoint answers with.
    pub fn reply(&self, endpoint: Endpoint, status: u16, body: impl Into<String>) -> &Self {
        self.write().replies.insert(
            endpoint,
            Reply::Respond {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Scripts an HTTP 200 answer with a JSON body.
    pub fn reply_json(&self, endpoint: Endpoint, body: serde_json::Value) -> &Self {
        self.reply(endpoint, 200, body.to_string())
    }

    /// Scripts a transport failure (no response at all).
    pub fn fail(&self, endpoint: Endpoint, reason: impl Into<String>) -> &Self {
        self.write()
            .replies
            .insert(endpoint, Reply::Fail(reason.into()));
        self
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.read().requests.clone()
    }

    /// Returns the endpoints called so far, in order.
    pub fn calls(&self) -> Vec<Endpoint> {
        self.read().requests.iter().map(|r| r.endpoint).collect()
    }

    /// Returns true if the endpoint was called at least once.
    pub fn was_called(&self, endpoint: Endpoint) -> bool {
        self.read().requests.iter().any(|r| r.endpoint == endpoint)
    }

    /// Returns the body of the most recent request to an endpoint.
    pub fn last_body(&self, endpoint: Endpoint) -> Option<serde_json::Value> {
        self.read()
            .requests
            .iter()
            .rev()
            .find(|r| r.endpoint == endpoint)
            .and_then(|r| r.body.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryMarketplaceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryMarketplaceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for InMemoryMarketplace {
    async fn send(&self, request: ApiRequest, credential: &Credential) -> Result<ApiResponse> {
        let mut state = self.write();
        let endpoint = request.endpoint;

        state.requests.push(RecordedRequest {
            endpoint,
            url: request.url,
            body: request.body,
            authorization: credential.bearer(),
        });

        match state.replies.get(&endpoint) {
            Some(Reply::Respond { status, body }) => Ok(ApiResponse {
                endpoint,
                status: *status,
                body: body.clone(),
            }),
            Some(Reply::Fail(reason)) => Err(MarketplaceError::Transport {
                endpoint,
                reason: reason.clone(),
            }),
            None => Err(MarketplaceError::Transport {
                endpoint,
                reason: "no reply scripted".to_string(),
            }),
        }
    }
}
