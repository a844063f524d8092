//! Typed marketplace calls.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::{
    ApiRequest, ApiResponse, Credential, ENTITY_TYPE_ID, Endpoint, MarketplaceConfig,
    MarketplaceError, NeedId, OPERATION_ID, RemoteId, Result, Transport,
};

/// Marketplace client for one purchase attempt.
///
/// Builds the URL and payload for each call and sends it with the attempt's
/// credential. Responses come back raw; deciding what a status or body means
/// is up to the caller.
pub struct MarketplaceClient<T: Transport> {
    transport: T,
    config: Arc<MarketplaceConfig>,
    credential: Credential,
}

impl<T: Transport> MarketplaceClient<T> {
    /// Creates a client bound to one credential.
    pub fn new(transport: T, config: Arc<MarketplaceConfig>, credential: Credential) -> Self {
        Self {
            transport,
            config,
            credential,
        }
    }

    /// GET the legacy authentication check.
    pub async fn check_authentication(&self) -> Result<ApiResponse> {
        let url = format!(
            "{}/Authentication/CheckAuthentication",
            self.config.legacy_url
        );
        self.send(ApiRequest::get(Endpoint::CheckAuthentication, url))
            .await
    }

    /// GET the legacy company record for a company id.
    pub async fn company(&self, company_id: &RemoteId) -> Result<ApiResponse> {
        let url = with_query(
            &format!("{}/Company/GetFullEntity", self.config.legacy_url),
            "companyId",
            company_id,
        )?;
        self.send(ApiRequest::get(Endpoint::CompanyLookup, url)).await
    }

    /// GET a need with its items and proposal deadline.
    pub async fn need(&self, need_id: &NeedId) -> Result<ApiResponse> {
        let url = with_query(&self.config.need_url, "needId", need_id)?;
        self.send(ApiRequest::get(Endpoint::NeedLookup, url)).await
    }

    /// POST a new operation entity for the supplier against a need.
    pub async fn create_entity(
        &self,
        need_id: &NeedId,
        supplier_id: &RemoteId,
    ) -> Result<ApiResponse> {
        let body = json!({
            "creationData": { "needId": need_id, "supplierId": supplier_id }
        });
        self.post(Endpoint::CreateEntity, "CreateNewOperationEntity", "", body)
            .await
    }

    /// POST the start of the offer operation on an entity.
    pub async fn start_operation(&self, entity_id: &RemoteId) -> Result<ApiResponse> {
        let body = json!({ "entityId": entity_id, "operationId": OPERATION_ID });
        self.post(Endpoint::StartOperation, "StartOperation", "", body)
            .await
    }

    /// POST a read-back of the entity being edited by the started operation.
    pub async fn started_operation(&self, entity_id: &RemoteId) -> Result<ApiResponse> {
        let body = json!({ "entityId": entity_id });
        self.post(
            Endpoint::GetStartedOperation,
            "GetStartedOperation",
            "?query",
            body,
        )
        .await
    }

    /// POST the offer payload for the started operation.
    pub async fn save_started_operation<P: Serialize>(&self, payload: &P) -> Result<ApiResponse> {
        let endpoint = Endpoint::SaveStartedOperation;
        let body = serde_json::to_value(payload)
            .map_err(|source| MarketplaceError::Encode { endpoint, source })?;
        self.post(endpoint, "SaveStartedOperation", "", body).await
    }

    /// POST the finish of the started operation.
    pub async fn finish_operation(&self, started_operation_log_id: &RemoteId) -> Result<ApiResponse> {
        let body = json!({ "startedOperationLogId": started_operation_log_id });
        self.post(Endpoint::FinishOperation, "FinishOperation", "", body)
            .await
    }

    async fn post(
        &self,
        endpoint: Endpoint,
        action: &str,
        query: &str,
        body: serde_json::Value,
    ) -> Result<ApiResponse> {
        let url = format!(
            "{}/{action}/{ENTITY_TYPE_ID}{query}",
            self.config.base_url
        );
        self.send(ApiRequest::post(endpoint, url, body)).await
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        metrics::counter!("marketplace_requests_total", "endpoint" => request.endpoint.as_str())
            .increment(1);
        self.transport.send(request, &self.credential).await
    }
}

/// Appends one form-encoded query parameter to `base`.
fn with_query(base: &str, key: &str, value: impl std::fmt::Display) -> Result<String> {
    reqwest::Url::parse_with_params(base, &[(key, value.to_string())])
        .map(String::from)
        .map_err(|e| MarketplaceError::Configuration(format!("invalid url '{base}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryMarketplace;

    fn client(marketplace: &InMemoryMarketplace) -> MarketplaceClient<InMemoryMarketplace> {
        let config = MarketplaceConfig {
            base_url: "https://m.test/ops".to_string(),
            need_url: "https://m.test/need".to_string(),
            legacy_url: "https://legacy.test".to_string(),
            ..MarketplaceConfig::default()
        };
        MarketplaceClient::new(
            marketplace.clone(),
            Arc::new(config),
            Credential::new("abc").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_operation_urls_embed_entity_type() {
        let marketplace = InMemoryMarketplace::new();
        marketplace.reply_json(Endpoint::GetStartedOperation, json!({}));

        client(&marketplace)
            .started_operation(&RemoteId::from(42))
            .await
            .unwrap();

        let request = &marketplace.requests()[0];
        assert_eq!(
            request.url,
            format!("https://m.test/ops/GetStartedOperation/{ENTITY_TYPE_ID}?query")
        );
        assert_eq!(request.body, Some(json!({ "entityId": 42 })));
    }

    #[tokio::test]
    async fn test_identity_calls_use_legacy_host() {
        let marketplace = InMemoryMarketplace::new();
        marketplace
            .reply_json(Endpoint::CheckAuthentication, json!({}))
            .reply_json(Endpoint::CompanyLookup, json!({}));
        let client = client(&marketplace);

        client.check_authentication().await.unwrap();
        client.company(&RemoteId::from(7)).await.unwrap();

        let requests = marketplace.requests();
        assert_eq!(
            requests[0].url,
            "https://legacy.test/Authentication/CheckAuthentication"
        );
        assert_eq!(
            requests[1].url,
            "https://legacy.test/Company/GetFullEntity?companyId=7"
        );
    }

    #[tokio::test]
    async fn test_create_and_start_payloads() {
        let marketplace = InMemoryMarketplace::new();
        marketplace
            .reply_json(Endpoint::CreateEntity, json!({}))
            .reply_json(Endpoint::StartOperation, json!({}));
        let client = client(&marketplace);
        let need_id = NeedId::parse("9001").unwrap();

        client
            .create_entity(&need_id, &RemoteId::from("S-1"))
            .await
            .unwrap();
        client.start_operation(&RemoteId::from(42)).await.unwrap();

        assert_eq!(
            marketplace.last_body(Endpoint::CreateEntity),
            Some(json!({ "creationData": { "needId": 9001, "supplierId": "S-1" } }))
        );
        assert_eq!(
            marketplace.last_body(Endpoint::StartOperation),
            Some(json!({ "entityId": 42, "operationId": OPERATION_ID }))
        );
    }

    #[tokio::test]
    async fn test_need_url_carries_need_id() {
        let marketplace = InMemoryMarketplace::new();
        marketplace.reply_json(Endpoint::NeedLookup, json!({}));

        client(&marketplace)
            .need(&NeedId::parse("123").unwrap())
            .await
            .unwrap();

        assert_eq!(marketplace.requests()[0].url, "https://m.test/need?needId=123");
        assert_eq!(marketplace.requests()[0].authorization, "Bearer abc");
    }

    #[tokio::test]
    async fn test_query_ids_are_encoded() {
        let marketplace = InMemoryMarketplace::new();
        marketplace
            .reply_json(Endpoint::NeedLookup, json!({}))
            .reply_json(Endpoint::CompanyLookup, json!({}));
        let client = client(&marketplace);

        client
            .need(&NeedId::from(RemoteId::parse("1&needId=2#x")))
            .await
            .unwrap();
        client
            .company(&RemoteId::parse("7 & co"))
            .await
            .unwrap();

        let requests = marketplace.requests();
        assert_eq!(requests[0].url, "https://m.test/need?needId=1%26needId%3D2%23x");
        assert_eq!(
            requests[1].url,
            "https://legacy.test/Company/GetFullEntity?companyId=7+%26+co"
        );
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_configuration_error() {
        let marketplace = InMemoryMarketplace::new();
        let client = MarketplaceClient::new(
            marketplace.clone(),
            Arc::new(MarketplaceConfig {
                need_url: "not a url".to_string(),
                ..MarketplaceConfig::default()
            }),
            Credential::new("abc").unwrap(),
        );

        let err = client
            .need(&NeedId::parse("1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, MarketplaceError::Configuration(_)));
        assert!(marketplace.requests().is_empty());
    }
}
