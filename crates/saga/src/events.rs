//! Progress events reported while a purchase attempt runs.

use common::{AttemptId, NeedId, RemoteId};
use domain::{GateDecision, MarketTimestamp};

use crate::state::Stage;

/// Events that can occur during a purchase attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaEvent {
    /// The attempt began.
    AttemptStarted { attempt_id: AttemptId, need_id: NeedId },

    /// The supplier behind the credential is known.
    IdentityResolved { supplier_id: RemoteId },

    /// Item costs and the proposal deadline are known.
    NeedFetched {
        item_count: usize,
        proposal_end_date: MarketTimestamp,
    },

    /// The timing gate let the attempt through.
    GatePassed(GateDecision),

    /// A saga stage is about to call the marketplace.
    StageStarted(Stage),

    /// A saga stage produced its output.
    StageCompleted(Stage),

    /// A saga stage failed; the attempt ends here.
    StageFailed { stage: Stage, error: String },

    /// The offer was placed.
    AttemptSucceeded,

    /// The attempt failed.
    AttemptFailed { reason: String },
}

impl SagaEvent {
    /// Returns the event name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::AttemptStarted { .. } => "AttemptStarted",
            SagaEvent::IdentityResolved { .. } => "IdentityResolved",
            SagaEvent::NeedFetched { .. } => "NeedFetched",
            SagaEvent::GatePassed(_) => "GatePassed",
            SagaEvent::StageStarted(_) => "StageStarted",
            SagaEvent::StageCompleted(_) => "StageCompleted",
            SagaEvent::StageFailed { .. } => "StageFailed",
            SagaEvent::AttemptSucceeded => "AttemptSucceeded",
            SagaEvent::AttemptFailed { .. } => "AttemptFailed",
        }
    }
}
