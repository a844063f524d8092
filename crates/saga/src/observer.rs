//! Observers the saga reports its progress to.

use std::sync::{Arc, Mutex, PoisonError};

use crate::events::SagaEvent;

/// Receives progress events from a purchase attempt.
pub trait SagaObserver: Send + Sync {
    fn on_event(&self, event: &SagaEvent);
}

/// Writes every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SagaObserver for TracingObserver {
    fn on_event(&self, event: &SagaEvent) {
        match event {
            SagaEvent::AttemptStarted {
                attempt_id,
                need_id,
            } => tracing::info!(%attempt_id, %need_id, "purchase attempt started"),
            SagaEvent::IdentityResolved { supplier_id } => {
                tracing::info!(%supplier_id, "identity resolved")
            }
            SagaEvent::NeedFetched {
                item_count,
                proposal_end_date,
            } => tracing::info!(item_count, %proposal_end_date, "need fetched"),
            SagaEvent::GatePassed(decision) => tracing::info!(?decision, "timing gate passed"),
            SagaEvent::StageStarted(stage) => tracing::info!(%stage, "saga stage started"),
            SagaEvent::StageCompleted(stage) => tracing::info!(%stage, "saga stage completed"),
            SagaEvent::StageFailed { stage, error } => {
                tracing::warn!(%stage, %error, "saga stage failed")
            }
            SagaEvent::AttemptSucceeded => tracing::info!("offer placed"),
            SagaEvent::AttemptFailed { reason } => {
                tracing::warn!(%reason, "purchase attempt failed")
            }
        }
    }
}

/// Keeps every event in memory, for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<SagaEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    pub fn events(&self) -> Vec<SagaEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the names of the events recorded so far.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(SagaEvent::event_type).collect()
    }
}

impl SagaObserver for RecordingObserver {
    fn on_event(&self, event: &SagaEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Stage;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_event(&SagaEvent::StageStarted(Stage::Create));
        observer.on_event(&SagaEvent::StageCompleted(Stage::Create));

        assert_eq!(
            observer.events(),
            vec![
                SagaEvent::StageStarted(Stage::Create),
                SagaEvent::StageCompleted(Stage::Create)
            ]
        );
    }
}
