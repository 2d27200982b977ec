//! Conversation Session

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

use crate::error::Result;

use super::buffer::ContextBuffer;
use super::snapshot::MemorySnapshot;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Session is active
    Active,
    /// Session is paused (can be resumed)
    Paused,
    /// Session has ended
    Ended,
}

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session was created
    pub created_at: SystemTime,
    /// When the session was last updated
    pub updated_at: SystemTime,
    /// Total turn count
    pub turn_count: usize,
    /// Custom metadata
    pub custom: HashMap<String, String>,
}

impl SessionMetadata {
    /// Create new metadata
    pub fn new() -> Self {
        let now = SystemTime::now();
        Self {
            created_at: now,
            updated_at: now,
            turn_count: 0,
            custom: HashMap::new(),
        }
    }

    /// Update the metadata
    pub fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }

    /// Set a custom metadata field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.insert(key.into(), value.into());
        self.touch();
    }

    /// Get a custom metadata field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(|s| s.as_str())
    }
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A conversation session owning its own bounded memory.
///
/// Each session gets an independent, disposable [`ContextBuffer`]; there is
/// no process-wide shared history. The owning orchestration layer holds the
/// session and drives it from a single task; sessions are `Send`, so moving
/// one between tasks is fine as long as access stays serialized.
///
/// Recording a turn runs the buffer's FIFO eviction immediately, so the
/// prompt context a session hands out is always within budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Unique session ID
    id: String,
    /// Session state
    state: SessionState,
    /// Bounded conversation memory
    memory: ContextBuffer,
    /// Session metadata
    metadata: SessionMetadata,
}

impl ConversationSession {
    /// Create a new session with a generated ID and the given context budget
    pub fn new(max_context_length: usize) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), max_context_length)
    }

    /// Create a new session with an explicit ID
    pub fn with_id(id: impl Into<String>, max_context_length: usize) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Active,
            memory: ContextBuffer::with_max_length(max_context_length),
            metadata: SessionMetadata::new(),
        }
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if session is active
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Get the conversation memory
    pub fn memory(&self) -> &ContextBuffer {
        &self.memory
    }

    /// Get mutable access to the conversation memory
    pub fn memory_mut(&mut self) -> &mut ContextBuffer {
        &mut self.memory
    }

    /// Get session metadata
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Get mutable reference to metadata
    pub fn metadata_mut(&mut self) -> &mut SessionMetadata {
        &mut self.metadata
    }

    /// Get turn count
    pub fn turn_count(&self) -> usize {
        self.memory.turn_count()
    }

    /// Record one completed exchange.
    ///
    /// Ignored unless the session is active. Appends the turn and then
    /// evicts oldest turns as needed to keep the context within budget.
    /// Returns whether the turn was recorded.
    pub fn record_turn(
        &mut self,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> bool {
        if self.state != SessionState::Active {
            return false;
        }

        self.memory.append(user, assistant);
        self.memory.auto_manage();
        self.metadata.turn_count = self.memory.turn_count();
        self.metadata.touch();
        true
    }

    /// Context to prompt the downstream model with
    pub fn prompt_context(&self) -> String {
        self.memory.context()
    }

    /// Pause the session
    pub fn pause(&mut self) {
        if self.state == SessionState::Active {
            self.state = SessionState::Paused;
            self.metadata.touch();
        }
    }

    /// Resume the session
    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            self.state = SessionState::Active;
            self.metadata.touch();
        }
    }

    /// End the session
    pub fn end(&mut self) {
        self.state = SessionState::Ended;
        self.metadata.touch();
    }

    /// Clear the session history (keeps metadata)
    pub fn clear(&mut self) {
        self.memory.clear();
        self.metadata.turn_count = 0;
        self.metadata.touch();
    }

    /// Snapshot just the memory, for storage layers that persist history
    /// independently of session lifecycle
    pub fn export_memory(&self) -> MemorySnapshot {
        self.memory.export()
    }

    /// Restore the memory from a snapshot
    pub fn import_memory(&mut self, snapshot: MemorySnapshot) -> Result<()> {
        self.memory.import(snapshot)?;
        self.metadata.turn_count = self.memory.turn_count();
        self.metadata.touch();
        Ok(())
    }

    /// Serialize to JSON for persistence
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
