//! Conversation Memory
//!
//! Bounded multi-turn conversation history with FIFO eviction, session
//! ownership, and snapshot persistence.
//!
//! # Features
//!
//! - Whole-turn history with a character-bounded context view
//! - Lazy FIFO eviction of oldest turns
//! - Per-session ownership (no shared global history)
//! - Snapshot export/import for persistence layers
//!
//! # Example
//!
//! ```rust
//! use mneme_core::conversation::ConversationSession;
//!
//! let mut session = ConversationSession::with_id("session-1", 512);
//! session.record_turn("Hello!", "Hi there! How can I help?");
//!
//! let context = session.prompt_context();
//! assert!(context.starts_with("User: Hello!"));
//! ```

mod buffer;
mod session;
mod snapshot;

pub use buffer::{
    ContextBuffer, HistoryEntry, ASSISTANT_PREFIX, DEFAULT_MAX_CONTEXT_LENGTH,
    DEFAULT_RECENT_TURNS, USER_PREFIX,
};
pub use session::{ConversationSession, SessionMetadata, SessionState};
pub use snapshot::MemorySnapshot;
