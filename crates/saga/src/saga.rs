//! The four-stage offer submission.

use std::future::Future;
use std::time::Duration;

use common::{NeedId, RemoteId};
use domain::{Identity, NeedDetails};
use marketplace::{ApiResponse, MarketplaceClient, Transport};
use serde_json::Value;

use crate::error::{Result, SagaError};
use crate::events::SagaEvent;
use crate::observer::SagaObserver;
use crate::offer::{EditingEntity, OfferTerms, SaveOfferRequest, price_items};
use crate::state::{Created, Finished, Saved, Stage, Started};

/// The only Finish body the marketplace sends when an offer is placed.
pub const FINISH_ACKNOWLEDGMENT: &str = "{}";

/// Returns true if a Finish response means the offer was placed.
pub fn finish_accepted(status: u16, body: &str) -> bool {
    status == 200 && body == FINISH_ACKNOWLEDGMENT
}

/// Drives one offer through create, start, save and finish.
///
/// Each stage consumes the previous stage's output. Nothing is retried or
/// compensated: the first failure ends the saga and whatever was created on
/// the marketplace stays there.
pub struct OperationSaga<'a, T: Transport> {
    client: &'a MarketplaceClient<T>,
    observer: &'a dyn SagaObserver,
    pacing: Duration,
}

impl<'a, T: Transport> OperationSaga<'a, T> {
    /// Creates a saga that pauses `pacing` between consecutive stages.
    pub fn new(
        client: &'a MarketplaceClient<T>,
        observer: &'a dyn SagaObserver,
        pacing: Duration,
    ) -> Self {
        Self {
            client,
            observer,
            pacing,
        }
    }

    /// Runs all four stages in order.
    #[tracing::instrument(skip_all, fields(%need_id, supplier_id = %identity.supplier_id))]
    pub async fn run(
        &self,
        need_id: &NeedId,
        identity: &Identity,
        need: &NeedDetails,
        terms: &OfferTerms,
    ) -> Result<Finished> {
        let created = self
            .observed(Stage::Create, self.create(need_id, identity))
            .await?;
        self.pace().await;
        let started = self.observed(Stage::Start, self.start(created)).await?;
        self.pace().await;
        let saved = self
            .observed(Stage::Save, self.save(started, need, terms))
            .await?;
        self.pace().await;
        self.observed(Stage::Finish, self.finish(saved)).await
    }

    /// Creates the operation entity the offer is built on.
    pub async fn create(&self, need_id: &NeedId, identity: &Identity) -> Result<Created> {
        let response = self
            .client
            .create_entity(need_id, &identity.supplier_id)
            .await?;
        let body = ok_json(Stage::Create, &response)?;

        let entity_id = match &body {
            Value::Object(fields) => fields.get("entityId").and_then(RemoteId::from_json),
            other => RemoteId::from_json(other),
        }
        .ok_or_else(|| SagaError::stage(Stage::Create, "response has no entityId"))?;

        tracing::info!(%entity_id, "operation entity created");
        Ok(Created {
            need_id: need_id.clone(),
            supplier_id: identity.supplier_id.clone(),
            entity_id,
        })
    }

    /// Opens the offer operation on the created entity.
    pub async fn start(&self, created: Created) -> Result<Started> {
        let response = self.client.start_operation(&created.entity_id).await?;
        let body = ok_json(Stage::Start, &response)?;

        let field = |name: &str| {
            body.get(name)
                .and_then(RemoteId::from_json)
                .ok_or_else(|| SagaError::stage(Stage::Start, format!("response has no {name}")))
        };
        let started_operation_log_id = field("startedOperationLogId")?;
        let entity_version_id = field("entityVersionId")?;

        tracing::info!(
            %started_operation_log_id,
            %entity_version_id,
            "offer operation started"
        );
        Ok(Started {
            need_id: created.need_id,
            supplier_id: created.supplier_id,
            entity_id: created.entity_id,
            started_operation_log_id,
            entity_version_id,
        })
    }

    /// Reads back the item ids and submits the priced offer.
    ///
    /// A failed read-back aborts before anything is submitted. The submit
    /// itself only has to reach the marketplace; an unexpected status or body
    /// is logged and the saga moves on to Finish.
    pub async fn save(
        &self,
        started: Started,
        need: &NeedDetails,
        terms: &OfferTerms,
    ) -> Result<Saved> {
        let response = self.client.started_operation(&started.entity_id).await?;
        let editing = ok_json(Stage::Save, &response)?;
        let item_ids = item_ids(&editing);
        if item_ids.is_empty() {
            return Err(SagaError::stage(
                Stage::Save,
                "started operation lists no need items",
            ));
        }

        let payload = SaveOfferRequest {
            started_operation_log_id: started.started_operation_log_id.clone(),
            editing_entity: EditingEntity {
                end_date: terms.end_date,
                need_id: started.need_id,
                supplier_id: started.supplier_id,
                need_item_offer: price_items(
                    &item_ids,
                    need,
                    &started.entity_id,
                    terms.nds_rate_id,
                ),
                entity_id: started.entity_id.clone(),
                signer: terms.signer.clone(),
            },
        };

        let response = self.client.save_started_operation(&payload).await?;
        if !response.is_ok() {
            tracing::warn!(
                status = response.status,
                body = %response.body_excerpt(),
                "save answered with unexpected status"
            );
        }
        let acknowledgment = match response.json::<Value>() {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(error = %err, "save acknowledgment is not JSON");
                None
            }
        };

        tracing::info!(items = item_ids.len(), "offer saved");
        Ok(Saved {
            entity_id: started.entity_id,
            started_operation_log_id: started.started_operation_log_id,
            item_ids,
            acknowledgment,
        })
    }

    /// Closes the operation, placing the offer.
    pub async fn finish(&self, saved: Saved) -> Result<Finished> {
        let response = self
            .client
            .finish_operation(&saved.started_operation_log_id)
            .await?;

        if !response.is_ok() {
            return Err(status_failure(Stage::Finish, &response));
        }
        if !finish_accepted(response.status, &response.body) {
            return Err(SagaError::FinishMismatch {
                body: response.body_excerpt(),
            });
        }

        tracing::info!(entity_id = %saved.entity_id, "offer operation finished");
        Ok(Finished {
            entity_id: saved.entity_id,
            started_operation_log_id: saved.started_operation_log_id,
            item_ids: saved.item_ids,
        })
    }

    async fn observed<O, F>(&self, stage: Stage, stage_future: F) -> Result<O>
    where
        F: Future<Output = Result<O>>,
    {
        self.observer.on_event(&SagaEvent::StageStarted(stage));
        match stage_future.await {
            Ok(output) => {
                self.observer.on_event(&SagaEvent::StageCompleted(stage));
                Ok(output)
            }
            Err(err) => {
                self.observer.on_event(&SagaEvent::StageFailed {
                    stage,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}

fn status_failure(stage: Stage, response: &ApiResponse) -> SagaError {
    SagaError::stage(
        stage,
        format!("status {}: {}", response.status, response.body_excerpt()),
    )
}

fn ok_json(stage: Stage, response: &ApiResponse) -> Result<Value> {
    if !response.is_ok() {
        return Err(status_failure(stage, response));
    }
    Ok(response.json()?)
}

fn item_ids(editing: &Value) -> Vec<RemoteId> {
    editing
        .pointer("/editingEntity/needItem")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(RemoteId::from_json))
                .collect()
        })
        .unwrap_or_default()
}
