//! Operation state accumulated stage by stage.
//!
//! Each stage of the saga consumes the previous stage's output and returns
//! the next one, so stages can only run in order:
//! ```text
//! Created ──► Started ──► Saved ──► Finished
//! ```

use common::{NeedId, RemoteId};

/// The stages of the offer submission, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Create,
    Start,
    Save,
    Finish,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Create, Stage::Start, Stage::Save, Stage::Finish];

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Create => "create",
            Stage::Start => "start",
            Stage::Save => "save",
            Stage::Finish => "finish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operation entity exists on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub need_id: NeedId,
    pub supplier_id: RemoteId,
    pub entity_id: RemoteId,
}

/// The offer operation is open for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub need_id: NeedId,
    pub supplier_id: RemoteId,
    pub entity_id: RemoteId,
    pub started_operation_log_id: RemoteId,
    pub entity_version_id: RemoteId,
}

/// The offer payload has been submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub entity_id: RemoteId,
    pub started_operation_log_id: RemoteId,
    pub item_ids: Vec<RemoteId>,
    /// Whatever JSON the marketplace acknowledged the save with, if any.
    pub acknowledgment: Option<serde_json::Value>,
}

/// The operation is closed and the offer is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub entity_id: RemoteId,
    pub started_operation_log_id: RemoteId,
    pub item_ids: Vec<RemoteId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let names: Vec<&str> = Stage::ALL.iter().map(Stage::as_str).collect();
        assert_eq!(names, vec!["create", "start", "save", "finish"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Stage::Create.to_string(), "create");
        assert_eq!(Stage::Start.to_string(), "start");
        assert_eq!(Stage::Save.to_string(), "save");
        assert_eq!(Stage::Finish.to_string(), "finish");
    }
}
