//! Bid submission saga.
//!
//! An offer is placed on the marketplace in four remote stages:
//! 1. Create the operation entity for the need
//! 2. Start the offer operation
//! 3. Save the priced offer
//! 4. Finish the operation
//!
//! The stages are not atomic. A failure part way through ends the attempt
//! and nothing already done is rolled back. [`PurchaseOrchestrator`] runs
//! identity resolution, need inspection and the timing gate before the saga
//! and turns the result into a [`SagaOutcome`].

pub mod error;
pub mod events;
pub mod observer;
pub mod offer;
pub mod orchestrator;
pub mod saga;
pub mod state;

pub use error::{FailureKind, SagaError};
pub use events::SagaEvent;
pub use observer::{RecordingObserver, SagaObserver, TracingObserver};
pub use offer::{NeedItemOffer, OfferTerms, PowerOfAttorney, SaveOfferRequest, Signer};
pub use orchestrator::{OrchestratorSettings, PurchaseOrchestrator, PurchaseRequest, SagaOutcome};
pub use saga::{OperationSaga, finish_accepted};
pub use state::{Created, Finished, Saved, Stage, Started};
