//! Persistence Snapshot for Conversation History

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serializable snapshot of a [`ContextBuffer`](super::ContextBuffer).
///
/// `entries` keeps the raw interleaved user/assistant lines rather than
/// paired records, so importing a snapshot reproduces buffer state exactly,
/// including any unpaired trailing entry. The JSON field names match the
/// historical wire format (`entries`, `maxLength`, `timestamp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    /// Alternating `User: ...` / `Assistant: ...` lines, oldest first
    pub entries: Vec<String>,
    /// Context character budget in effect when the snapshot was taken
    pub max_length: usize,
    /// When the snapshot was taken, milliseconds since the Unix epoch.
    /// Informational only; never restored on import.
    pub timestamp: i64,
}

impl MemorySnapshot {
    /// Serialize to JSON for storage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
