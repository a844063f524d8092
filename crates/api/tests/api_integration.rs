//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use domain::{FixedClock, TimingMode, TimingPolicy};
use marketplace::{Credential, Endpoint, InMemoryMarketplace};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::OrchestratorSettings;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn test_config(default_token: Option<&str>) -> Config {
    Config {
        default_credential: default_token.and_then(Credential::new),
        timing: TimingPolicy {
            mode: TimingMode::Immediate,
            ..TimingPolicy::default()
        },
        orchestrator: OrchestratorSettings {
            pacing: Duration::ZERO,
            ..OrchestratorSettings::default()
        },
        ..Config::default()
    }
}

fn setup(marketplace: &InMemoryMarketplace, default_token: Option<&str>) -> axum::Router {
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap());
    let state = api::create_state(marketplace.clone(), clock, &test_config(default_token));
    api::create_app(state, get_metrics_handle())
}

fn script_happy_marketplace() -> InMemoryMarketplace {
    let marketplace = InMemoryMarketplace::new();
    marketplace
        .reply_json(
            Endpoint::CheckAuthentication,
            json!({ "isAuthenticated": true, "user": { "company": { "id": 7 } } }),
        )
        .reply_json(Endpoint::CompanyLookup, json!({ "supplierId": 77 }))
        .reply_json(
            Endpoint::NeedLookup,
            json!({
                "items": [{ "costPerUnit": 10 }],
                "proposalEndDate": "31.12.2025 23:59:00"
            }),
        )
        .reply_json(Endpoint::CreateEntity, json!({ "entityId": 42 }))
        .reply_json(
            Endpoint::StartOperation,
            json!({ "startedOperationLogId": "L1", "entityVersionId": "V1" }),
        )
        .reply_json(
            Endpoint::GetStartedOperation,
            json!({ "editingEntity": { "needItem": [{ "id": "I1" }] } }),
        )
        .reply_json(Endpoint::SaveStartedOperation, json!({}))
        .reply(Endpoint::FinishOperation, 200, "{}");
    marketplace
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/start_bot")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/start_bot")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup(&InMemoryMarketplace::new(), None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_start_bot_json_success() {
    let marketplace = script_happy_marketplace();
    let app = setup(&marketplace, None);

    let response = app
        .oneshot(post_json(json!({
            "need_id": 9001,
            "token": "request-token",
            "nds_rate_id": 2,
            "end_date": "30.01.2026 00:00:00"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "success", "{json}");
    assert!(json["attempt_id"].is_string());

    let save = marketplace
        .last_body(Endpoint::SaveStartedOperation)
        .unwrap();
    assert_eq!(save["editingEntity"]["needItemOffer"][0]["ndsRateId"], 2);
    assert_eq!(save["editingEntity"]["endDate"], "30.01.2026 00:00:00");
    assert!(
        marketplace
            .requests()
            .iter()
            .all(|r| r.authorization == "Bearer request-token")
    );
}

#[tokio::test]
async fn test_start_bot_json_content_type_is_case_insensitive() {
    let marketplace = script_happy_marketplace();
    let app = setup(&marketplace, Some("env-token"));

    let request = Request::builder()
        .method("POST")
        .uri("/start_bot")
        .header("content-type", "Application/JSON; charset=utf-8")
        .body(Body::from(json!({ "need_id": 9001 }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "success");
    assert_eq!(
        marketplace.last_body(Endpoint::SaveStartedOperation).unwrap()["editingEntity"]["needId"],
        9001
    );
}

#[tokio::test]
async fn test_start_bot_form_uses_configured_defaults() {
    let marketplace = script_happy_marketplace();
    let app = setup(&marketplace, Some("env-token"));

    let response = app.oneshot(post_form("need_id=9001")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "success");

    let save = marketplace
        .last_body(Endpoint::SaveStartedOperation)
        .unwrap();
    assert_eq!(save["editingEntity"]["needId"], 9001);
    assert_eq!(save["editingEntity"]["needItemOffer"][0]["ndsRateId"], 4);
    // Thirty days after 01.12.2025 12:00:00 market time.
    assert_eq!(save["editingEntity"]["endDate"], "31.12.2025 12:00:00");
    assert_eq!(marketplace.requests()[0].authorization, "Bearer env-token");
}

#[tokio::test]
async fn test_start_bot_failed_attempt_is_reported_with_200() {
    let marketplace = InMemoryMarketplace::new();
    marketplace.reply_json(
        Endpoint::CheckAuthentication,
        json!({ "isAuthenticated": false }),
    );
    let app = setup(&marketplace, Some("env-token"));

    let response = app
        .oneshot(post_json(json!({ "need_id": "9001" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "error");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .starts_with("Authentication failed")
    );
    assert_eq!(marketplace.calls(), vec![Endpoint::CheckAuthentication]);
}

#[tokio::test]
async fn test_start_bot_requires_need_id() {
    let marketplace = InMemoryMarketplace::new();
    let app = setup(&marketplace, Some("env-token"));

    let response = app.oneshot(post_form("need_id=++")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], "error");
    assert!(marketplace.calls().is_empty());
}

#[tokio::test]
async fn test_start_bot_requires_a_token() {
    let marketplace = InMemoryMarketplace::new();
    let app = setup(&marketplace, None);

    let response = app
        .oneshot(post_json(json!({ "need_id": 9001, "token": " " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(marketplace.calls().is_empty());
}

#[tokio::test]
async fn test_start_bot_rejects_malformed_end_date() {
    let marketplace = InMemoryMarketplace::new();
    let app = setup(&marketplace, Some("env-token"));

    let response = app
        .oneshot(post_json(json!({ "need_id": 9001, "end_date": "2026-01-30" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(marketplace.calls().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let marketplace = script_happy_marketplace();
    let app = setup(&marketplace, Some("env-token"));

    let response = app
        .clone()
        .oneshot(post_form("need_id=9001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("purchase_attempts_total"));
    assert!(text.contains("marketplace_requests_total"));
}
