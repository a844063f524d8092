//! Purchase orchestrator: one bid, end to end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use common::{AttemptId, NeedId};
use domain::{
    Clock, IdentityResolver, MarketTimestamp, NeedInspector, TimingGate, TimingPolicy,
};
use marketplace::{Credential, MarketplaceClient, MarketplaceConfig, Transport};
use serde::Serialize;

use crate::error::{Result, SagaError};
use crate::events::SagaEvent;
use crate::observer::{SagaObserver, TracingObserver};
use crate::offer::{OfferTerms, Signer};
use crate::saga::OperationSaga;
use crate::state::Finished;

/// What to bid on, and with whose credential.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub need_id: NeedId,
    pub credential: Credential,
    /// Tax (VAT) rate identifier applied to every item.
    pub nds_rate_id: i64,
    /// Offer validity end; defaults to `offer_validity_days` from now.
    pub end_date: Option<MarketTimestamp>,
}

/// Settings shared by every attempt an orchestrator runs.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Pause between consecutive saga stages.
    pub pacing: Duration,
    pub offer_validity_days: i64,
    pub signer: Signer,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            pacing: Duration::from_secs(2),
            offer_validity_days: 30,
            signer: Signer::default(),
        }
    }
}

/// Result of one purchase attempt, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SagaOutcome {
    pub attempt_id: AttemptId,
    pub success: bool,
    pub message: String,
}

impl SagaOutcome {
    /// Returns `"success"` or `"error"`.
    pub fn status(&self) -> &'static str {
        if self.success { "success" } else { "error" }
    }
}

/// Runs identity resolution, need inspection, the timing gate and the
/// operation saga in order, stopping at the first failure.
pub struct PurchaseOrchestrator<T, C>
where
    T: Transport + Clone,
    C: Clock,
{
    transport: T,
    config: Arc<MarketplaceConfig>,
    gate: TimingGate<C>,
    settings: OrchestratorSettings,
    observer: Arc<dyn SagaObserver>,
}

impl<T, C> PurchaseOrchestrator<T, C>
where
    T: Transport + Clone,
    C: Clock,
{
    /// Creates an orchestrator that reports progress to `tracing`.
    pub fn new(
        transport: T,
        config: Arc<MarketplaceConfig>,
        gate: TimingGate<C>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            transport,
            config,
            gate,
            settings,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn SagaObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Runs one attempt and folds any failure into the outcome.
    #[tracing::instrument(
        skip_all,
        fields(attempt_id = tracing::field::Empty, need_id = %request.need_id)
    )]
    pub async fn run(&self, request: PurchaseRequest, policy: &TimingPolicy) -> SagaOutcome {
        let attempt_id = AttemptId::new();
        tracing::Span::current().record("attempt_id", tracing::field::display(attempt_id));
        metrics::counter!("purchase_attempts_total").increment(1);
        let attempt_start = Instant::now();

        self.observer.on_event(&SagaEvent::AttemptStarted {
            attempt_id,
            need_id: request.need_id.clone(),
        });

        let outcome = match self.execute(&request, policy).await {
            Ok(finished) => {
                metrics::counter!("purchase_succeeded").increment(1);
                self.observer.on_event(&SagaEvent::AttemptSucceeded);
                SagaOutcome {
                    attempt_id,
                    success: true,
                    message: format!(
                        "Offer placed for need {} (entity {})",
                        request.need_id, finished.entity_id
                    ),
                }
            }
            Err(err) => {
                metrics::counter!("purchase_failed", "kind" => err.kind().as_str()).increment(1);
                let message = err.to_string();
                self.observer.on_event(&SagaEvent::AttemptFailed {
                    reason: message.clone(),
                });
                SagaOutcome {
                    attempt_id,
                    success: false,
                    message,
                }
            }
        };

        metrics::histogram!("purchase_duration_seconds")
            .record(attempt_start.elapsed().as_secs_f64());
        outcome
    }

    /// Runs one attempt, returning the first failure as an error.
    pub async fn execute(
        &self,
        request: &PurchaseRequest,
        policy: &TimingPolicy,
    ) -> Result<Finished> {
        let client = MarketplaceClient::new(
            self.transport.clone(),
            Arc::clone(&self.config),
            request.credential.clone(),
        );

        let identity = IdentityResolver::new(&client).resolve().await?;
        self.observer.on_event(&SagaEvent::IdentityResolved {
            supplier_id: identity.supplier_id.clone(),
        });

        let need = NeedInspector::new(&client, self.gate.offset())
            .fetch(&request.need_id)
            .await?;
        self.observer.on_event(&SagaEvent::NeedFetched {
            item_count: need.item_costs.len(),
            proposal_end_date: need.proposal_end_date,
        });

        let decision = self.gate.pass(need.proposal_end_date, policy).await;
        self.observer.on_event(&SagaEvent::GatePassed(decision));

        let end_date = match request.end_date {
            Some(end_date) => end_date,
            None => self.default_end_date()?,
        };
        let terms = OfferTerms {
            nds_rate_id: request.nds_rate_id,
            end_date,
            signer: self.settings.signer.clone(),
        };

        OperationSaga::new(&client, self.observer.as_ref(), self.settings.pacing)
            .run(&request.need_id, &identity, &need, &terms)
            .await
    }

    fn default_end_date(&self) -> Result<MarketTimestamp> {
        let days = self.settings.offer_validity_days;
        let end = TimeDelta::try_days(days)
            .and_then(|validity| self.gate.clock().now().checked_add_signed(validity))
            .ok_or_else(|| {
                SagaError::InvalidTerms(format!("offer validity of {days} days is out of range"))
            })?;
        Ok(MarketTimestamp::from_instant(end, self.gate.offset()))
    }
}
