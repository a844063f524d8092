use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

use crate::{
    ApiRequest, ApiResponse, Credential, MarketplaceConfig, MarketplaceError, Method, Result,
    Transport,
};

/// HTTPS transport backed by `reqwest`.
///
/// Carries the headers the marketplace's own web client sends. The bearer
/// token is added per request.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Builds a transport from the marketplace configuration.
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| MarketplaceError::Configuration(format!("user agent: {e}")))?,
        );

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation is disabled for marketplace calls");
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| MarketplaceError::Configuration(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request, credential), fields(endpoint = %request.endpoint))]
    async fn send(&self, request: ApiRequest, credential: &Credential) -> Result<ApiResponse> {
        let endpoint = request.endpoint;
        let transport_error = |e: reqwest::Error| MarketplaceError::Transport {
            endpoint,
            reason: e.to_string(),
        };

        let builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };
        let mut builder = builder.header(AUTHORIZATION, credential.bearer());

        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|source| MarketplaceError::Encode { endpoint, source })?;
            tracing::debug!(url = %request.url, body = %body, "marketplace request");
            builder = builder.body(bytes);
        } else {
            tracing::debug!(url = %request.url, "marketplace request");
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!(status, body = %body, "marketplace response");

        Ok(ApiResponse {
            endpoint,
            status,
            body,
        })
    }
}
