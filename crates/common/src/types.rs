use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one purchase attempt.
///
/// Wraps a UUID so attempt IDs show up in spans and outcomes without being
/// confused with identifiers issued by the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random attempt ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an attempt ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AttemptId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// An identifier issued by the marketplace.
///
/// The marketplace is inconsistent about whether ids are JSON numbers or
/// strings, and it expects them echoed back in the same shape, so the wire
/// type is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(i64),
    Text(String),
}

impl RemoteId {
    /// Reads an id out of an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not a non-blank string or a
    /// non-zero integer.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let id = match value {
            serde_json::Value::Number(n) => Self::Number(n.as_i64()?),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            _ => return None,
        };
        (!id.is_blank()).then_some(id)
    }

    /// Parses user input, keeping all-digit input numeric.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(input.to_string()),
        }
    }

    /// An empty string or zero is treated as no id at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RemoteId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Identifier of a bid opportunity ("need") on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeedId(RemoteId);

impl NeedId {
    /// Creates a need ID from user input such as a form field.
    pub fn parse(input: &str) -> Option<Self> {
        let id = RemoteId::parse(input);
        (!id.is_blank()).then_some(Self(id))
    }

    /// Returns the underlying marketplace id.
    pub fn as_remote(&self) -> &RemoteId {
        &self.0
    }
}

impl From<RemoteId> for NeedId {
    fn from(id: RemoteId) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attempt_id_new_creates_unique_ids() {
        let id1 = AttemptId::new();
        let id2 = AttemptId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn attempt_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AttemptId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn remote_id_keeps_wire_type() {
        let number: RemoteId = serde_json::from_value(json!(42)).unwrap();
        let text: RemoteId = serde_json::from_value(json!("L1")).unwrap();

        assert_eq!(number, RemoteId::Number(42));
        assert_eq!(text, RemoteId::Text("L1".to_string()));
        assert_eq!(serde_json::to_value(&number).unwrap(), json!(42));
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("L1"));
    }

    #[test]
    fn remote_id_from_json_rejects_blank_values() {
        assert_eq!(RemoteId::from_json(&json!("")), None);
        assert_eq!(RemoteId::from_json(&json!(0)), None);
        assert_eq!(RemoteId::from_json(&json!(null)), None);
        assert_eq!(RemoteId::from_json(&json!({"id": 1})), None);
        assert_eq!(RemoteId::from_json(&json!(7)), Some(RemoteId::Number(7)));
    }

    #[test]
    fn need_id_parse() {
        assert_eq!(
            NeedId::parse(" 9061234 ").unwrap().as_remote(),
            &RemoteId::Number(9061234)
        );
        assert_eq!(
            NeedId::parse("abc-1").unwrap().as_remote(),
            &RemoteId::Text("abc-1".to_string())
        );
        assert!(NeedId::parse("   ").is_none());
        assert!(NeedId::parse("0").is_none());
    }

    #[test]
    fn need_id_serializes_as_inner_id() {
        let id = NeedId::parse("15").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(15));
    }
}
