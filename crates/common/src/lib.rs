//! Shared identifier types used across the bid submission workspace.

pub mod types;

pub use types::{AttemptId, NeedId, RemoteId};
