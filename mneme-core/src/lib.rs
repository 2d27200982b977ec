//! # Mneme - Bounded Conversation Memory for Assistant Clients
//!
//! Mneme (Μνήμη) is the conversation-memory core of a real-time voice/chat
//! assistant client:
//! - Bounded conversation history with whole-turn FIFO eviction
//! - Character-budgeted context views for prompting a language model
//! - Per-session ownership instead of a shared global history
//! - Snapshot export/import for persistence layers
//! - Typed configuration for the surrounding voice client (servers,
//!   reconnect policy, VAD thresholds)
//!
//! ## Quick Start
//!
//! ```rust
//! use mneme_core::prelude::*;
//!
//! let config = MnemeConfig::default();
//! let mut session = ConversationSession::new(config.memory.max_context_length);
//!
//! session.record_turn("hi", "hello there");
//! let context = session.prompt_context();
//! assert_eq!(context, "User: hi\nAssistant: hello there");
//! ```
//!
//! ## Design
//!
//! The buffer never evicts on append; eviction is lazy, driven by context
//! queries and `auto_manage`. Sessions wrap one buffer each and apply
//! eviction after every recorded turn, so concurrent conversations keep
//! independent, disposable state. All operations are synchronous, in-memory,
//! and non-panicking.

pub mod config;
pub mod conversation;
pub mod error;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        MemoryConfig, MnemeConfig, RetryConfig, ServerConfig, VadConfig, VoiceConfig,
        WebSocketConfig,
    };
    pub use crate::conversation::{
        ContextBuffer, ConversationSession, HistoryEntry, MemorySnapshot, SessionMetadata,
        SessionState,
    };
    pub use crate::error::{MnemeError, Result};
}
