//! The reqwest transport against a local HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use marketplace::{
    Credential, ENTITY_TYPE_ID, Endpoint, HttpTransport, MarketplaceClient, MarketplaceConfig,
    MarketplaceError, NeedId, OPERATION_ID, RemoteId,
};
use serde_json::{Value, json};

async fn echo(uri: Uri, headers: HeaderMap, body: String) -> axum::Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    axum::Json(json!({
        "uri": uri.to_string(),
        "authorization": header("authorization"),
        "requestedWith": header("x-requested-with"),
        "contentType": header("content-type"),
        "userAgent": header("user-agent"),
        "body": serde_json::from_str::<Value>(&body).unwrap_or(Value::Null),
    }))
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route(
            "/ops/FinishOperation/{entity_type}",
            post(|| async { (StatusCode::CONFLICT, "operation closed") }),
        )
        .fallback(echo);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> MarketplaceClient<HttpTransport> {
    let config = MarketplaceConfig {
        base_url: format!("http://{addr}/ops"),
        need_url: format!("http://{addr}/need"),
        legacy_url: format!("http://{addr}/legacy"),
        ..MarketplaceConfig::default()
    };
    let transport = HttpTransport::new(&config).unwrap();
    MarketplaceClient::new(
        transport,
        Arc::new(config),
        Credential::new("secret").unwrap(),
    )
}

#[tokio::test]
async fn test_post_carries_headers_and_json_body() {
    let addr = spawn_server().await;

    let response = client(addr)
        .start_operation(&RemoteId::from(42))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.endpoint, Endpoint::StartOperation);
    let echoed: Value = response.json().unwrap();
    assert_eq!(
        echoed["uri"],
        format!("/ops/StartOperation/{ENTITY_TYPE_ID}")
    );
    assert_eq!(echoed["authorization"], "Bearer secret");
    assert_eq!(echoed["requestedWith"], "XMLHttpRequest");
    assert_eq!(echoed["contentType"], "application/json; charset=utf-8");
    assert!(echoed["userAgent"].as_str().unwrap().starts_with("Mozilla/5.0"));
    assert_eq!(
        echoed["body"],
        json!({ "entityId": 42, "operationId": OPERATION_ID })
    );
}

#[tokio::test]
async fn test_get_carries_query() {
    let addr = spawn_server().await;

    let response = client(addr)
        .need(&NeedId::parse("9001").unwrap())
        .await
        .unwrap();

    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["uri"], "/need?needId=9001");
    assert_eq!(echoed["body"], Value::Null);
}

#[tokio::test]
async fn test_error_status_is_a_response_not_an_error() {
    let addr = spawn_server().await;

    let response = client(addr)
        .finish_operation(&RemoteId::from("L1"))
        .await
        .unwrap();

    assert_eq!(response.status, 409);
    assert!(!response.is_ok());
    assert_eq!(response.body, "operation closed");
    assert!(matches!(
        response.json::<Value>(),
        Err(MarketplaceError::Decode {
            endpoint: Endpoint::FinishOperation,
            ..
        })
    ));
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr).check_authentication().await.unwrap_err();

    assert!(matches!(
        err,
        MarketplaceError::Transport {
            endpoint: Endpoint::CheckAuthentication,
            ..
        }
    ));
}
