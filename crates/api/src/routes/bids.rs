//! Bid submission endpoint.

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use common::{NeedId, RemoteId};
use domain::{Clock, MarketTimestamp, TimingPolicy};
use marketplace::{Credential, Transport};
use saga::{PurchaseOrchestrator, PurchaseRequest};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<T, C>
where
    T: Transport + Clone,
    C: Clock,
{
    pub orchestrator: PurchaseOrchestrator<T, C>,
    /// Used when a request carries no token of its own.
    pub default_credential: Option<Credential>,
    pub default_nds_rate_id: i64,
    pub timing: TimingPolicy,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct StartBotRequest {
    pub need_id: Option<RemoteId>,
    pub token: Option<String>,
    pub nds_rate_id: Option<i64>,
    /// Offer validity end, `DD.MM.YYYY HH:MM:SS` in marketplace time.
    pub end_date: Option<String>,
}

/// Reads a [`StartBotRequest`] from a JSON body or an urlencoded form.
pub struct BidForm(pub StartBotRequest);

impl<S: Send + Sync> FromRequest<S> for BidForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_json_media_type);

        if is_json {
            let Json(body) = Json::<StartBotRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::UnprocessableBody(e.body_text()))?;
            Ok(Self(body))
        } else {
            let Form(body) = Form::<StartBotRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::UnprocessableBody(e.body_text()))?;
            Ok(Self(body))
        }
    }
}

/// True when a `Content-Type` value names `application/json`, ignoring case
/// and parameters.
fn is_json_media_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct StartBotResponse {
    pub status: &'static str,
    pub message: String,
    pub attempt_id: String,
}

// -- Handlers --

/// POST /start_bot: run one purchase attempt for a need.
///
/// Replies 200 whether or not the offer was placed; `status` tells which.
#[tracing::instrument(skip_all)]
pub async fn start_bot<T, C>(
    State(state): State<Arc<AppState<T, C>>>,
    BidForm(req): BidForm,
) -> Result<Json<StartBotResponse>, ApiError>
where
    T: Transport + Clone + 'static,
    C: Clock + 'static,
{
    let request = purchase_request(&state, req)?;
    tracing::info!(need_id = %request.need_id, "bid requested");

    let outcome = state.orchestrator.run(request, &state.timing).await;

    Ok(Json(StartBotResponse {
        status: outcome.status(),
        message: outcome.message,
        attempt_id: outcome.attempt_id.to_string(),
    }))
}

fn purchase_request<T, C>(
    state: &AppState<T, C>,
    req: StartBotRequest,
) -> Result<PurchaseRequest, ApiError>
where
    T: Transport + Clone,
    C: Clock,
{
    let need_id = req
        .need_id
        .and_then(|raw| NeedId::parse(&raw.to_string()))
        .ok_or_else(|| ApiError::BadRequest("need_id is required".to_string()))?;

    let credential = req
        .token
        .and_then(Credential::new)
        .or_else(|| state.default_credential.clone())
        .ok_or_else(|| ApiError::BadRequest("no marketplace token available".to_string()))?;

    let end_date = req
        .end_date
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| MarketTimestamp::parse(raw.trim()))
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(PurchaseRequest {
        need_id,
        credential,
        nds_rate_id: req.nds_rate_id.unwrap_or(state.default_nds_rate_id),
        end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_media_type_ignores_case_and_parameters() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("Application/JSON; charset=utf-8"));
        assert!(is_json_media_type(" APPLICATION/JSON"));
        assert!(!is_json_media_type("application/x-www-form-urlencoded"));
        assert!(!is_json_media_type("application/jsonp"));
        assert!(!is_json_media_type(""));
    }
}
