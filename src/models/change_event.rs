use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A "something changed" notice from the candidate table feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub op: Option<ChangeOp>,
    pub id: Option<Uuid>,
}

impl ChangeEvent {
    /// Payloads are informational only; anything unreadable still counts
    /// as a change.
    pub fn from_payload(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or(Self { op: None, id: None })
    }
}
