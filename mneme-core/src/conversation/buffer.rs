//! Bounded Conversation History

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{MnemeError, Result};

use super::snapshot::MemorySnapshot;

/// Line prefix for user entries
pub const USER_PREFIX: &str = "User: ";
/// Line prefix for assistant entries
pub const ASSISTANT_PREFIX: &str = "Assistant: ";
/// General-purpose default for the context character budget
pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 2048;
/// Default number of turns returned by recent-context queries
pub const DEFAULT_RECENT_TURNS: usize = 5;

/// One complete turn as seen by display/inspection consumers.
///
/// The timestamp is assigned when the history is read, not when the turn
/// was appended; callers that need creation time must track it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// User input, prefix stripped
    pub user: String,
    /// Assistant response, prefix stripped
    pub assistant: String,
    /// Read-time timestamp in milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Bounded conversation history for prompting a downstream language model.
///
/// Holds (user input, assistant response) turns in chronological order as raw
/// interleaved `User: ...` / `Assistant: ...` lines and produces a textual
/// context view that never exceeds `max_length` characters. Appending never
/// evicts; eviction is lazy, through [`ContextBuffer::auto_manage`] or the
/// truncation applied by the context queries.
///
/// Lengths are measured in characters (Unicode scalar values), not bytes, so
/// truncation never splits a multi-byte sequence.
///
/// No operation panics or blocks. The buffer is single-owner state: one
/// instance per conversation session, mutated from one task at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuffer {
    /// Alternating user/assistant lines, oldest first
    entries: Vec<String>,
    /// Maximum characters the serialized context may occupy
    max_length: usize,
}

impl ContextBuffer {
    /// Create a buffer with the default context budget
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_CONTEXT_LENGTH)
    }

    /// Create a buffer with a specific context budget in characters
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_length,
        }
    }

    /// Append one complete turn at the end of the history.
    ///
    /// Both sides land together; empty strings are accepted. No eviction
    /// happens here.
    pub fn append(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.entries.push(format!("{}{}", USER_PREFIX, user.into()));
        self.entries
            .push(format!("{}{}", ASSISTANT_PREFIX, assistant.into()));
        trace!(turns = self.turn_count(), "appended conversation turn");
    }

    /// Full serialization of the history, one line per entry, untruncated.
    fn raw_context(&self) -> String {
        self.entries.join("\n")
    }

    /// Serialized context, capped at `max_length` characters.
    ///
    /// When the history is over budget this returns the trailing
    /// `max_length` characters, which may cut the oldest surviving turn
    /// mid-line. Whole-turn eviction is available separately via
    /// [`ContextBuffer::auto_manage`].
    pub fn context(&self) -> String {
        tail_chars(&self.raw_context(), self.max_length)
    }

    /// Context restricted to at most the `turns` most recent turns, then
    /// capped like [`ContextBuffer::context`].
    pub fn recent_context(&self, turns: usize) -> String {
        let start = self.entries.len().saturating_sub(turns.saturating_mul(2));
        tail_chars(&self.entries[start..].join("\n"), self.max_length)
    }

    /// All complete turns in chronological order, prefixes stripped.
    ///
    /// A trailing unpaired entry (possible only via [`ContextBuffer::import`])
    /// is skipped.
    pub fn formatted_history(&self) -> Vec<HistoryEntry> {
        let now = Utc::now().timestamp_millis();
        self.entries
            .chunks_exact(2)
            .map(|pair| HistoryEntry {
                user: pair[0].strip_prefix(USER_PREFIX).unwrap_or(&pair[0]).to_string(),
                assistant: pair[1]
                    .strip_prefix(ASSISTANT_PREFIX)
                    .unwrap_or(&pair[1])
                    .to_string(),
                timestamp: now,
            })
            .collect()
    }

    /// Evict oldest turns (FIFO) until the untruncated serialization fits
    /// within `max_length` characters or no complete turn remains.
    ///
    /// Breaks out early if a removal fails to shorten the serialization, so
    /// the loop always terminates.
    pub fn auto_manage(&mut self) {
        let mut evicted = 0usize;
        let mut current = self.raw_context();
        while current.chars().count() > self.max_length && self.entries.len() >= 2 {
            self.remove_oldest_turn();
            let next = self.raw_context();
            if next == current {
                break;
            }
            current = next;
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                evicted,
                remaining = self.turn_count(),
                "evicted oldest turns to fit context budget"
            );
        }
    }

    /// Remove the earliest complete turn; no-op when none exists.
    pub fn remove_oldest_turn(&mut self) {
        if self.entries.len() >= 2 {
            self.entries.drain(..2);
        }
    }

    /// Remove all history
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Raw entry count (two entries per complete turn)
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of complete turns
    pub fn turn_count(&self) -> usize {
        self.entries.len() / 2
    }

    /// Whether any history is present
    pub fn has_history(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Set the context budget. Never evicts retroactively; the new budget
    /// takes effect on the next context query or `auto_manage` call.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.max_length = max_length;
    }

    /// Current context budget in characters
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Snapshot the buffer for persistence.
    ///
    /// The snapshot keeps the raw interleaved-line representation so a
    /// round trip through [`ContextBuffer::import`] is exact. Its timestamp
    /// records when the snapshot was taken and is informational only.
    pub fn export(&self) -> MemorySnapshot {
        MemorySnapshot {
            entries: self.entries.clone(),
            max_length: self.max_length,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Replace the buffer state wholesale from a snapshot.
    ///
    /// A snapshot with a zero `max_length` is rejected and the prior state
    /// is left untouched. The snapshot timestamp is not restored.
    pub fn import(&mut self, snapshot: MemorySnapshot) -> Result<()> {
        if snapshot.max_length == 0 {
            return Err(MnemeError::Snapshot(
                "snapshot max_length must be positive".to_string(),
            ));
        }
        self.entries = snapshot.entries;
        self.max_length = snapshot.max_length;
        trace!(
            entries = self.entries.len(),
            max_length = self.max_length,
            "imported conversation snapshot"
        );
        Ok(())
    }
}

impl Default for ContextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Trailing `n` characters of `s`, or all of `s` when it fits.
fn tail_chars(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if len <= n {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_counts() {
        let mut buffer = ContextBuffer::new();
        assert!(!buffer.has_history());
        assert_eq!(buffer.turn_count(), 0);

        buffer.append("Hello", "Hi there!");
        assert!(buffer.has_history());
        assert_eq!(buffer.turn_count(), 1);
        assert_eq!(buffer.history_len(), 2);

        buffer.append("How are you?", "Fine.");
        assert_eq!(buffer.turn_count(), 2);
        assert_eq!(buffer.history_len(), 4);
    }

    #[test]
    fn test_context_under_budget_is_verbatim() {
        let mut buffer = ContextBuffer::with_max_length(40);
        buffer.append("hi", "hello there");
        assert_eq!(buffer.context(), "User: hi\nAssistant: hello there");
        assert_eq!(buffer.context().len(), 31);
    }

    #[test]
    fn test_context_over_budget_is_trailing_suffix() {
        let mut buffer = ContextBuffer::with_max_length(40);
        buffer.append("hi", "hello there");
        buffer.append("how are you", "I am fine thanks");

        let full = "User: hi\nAssistant: hello there\nUser: how are you\nAssistant: I am fine thanks";
        assert!(full.len() > 40);

        let context = buffer.context();
        assert_eq!(context.len(), 40);
        assert_eq!(context, &full[full.len() - 40..]);
    }

    #[test]
    fn test_context_budget_counts_characters_not_bytes() {
        let mut buffer = ContextBuffer::with_max_length(4);
        buffer.append("héllo", "wörld");

        let context = buffer.context();
        assert_eq!(context.chars().count(), 4);
        assert_eq!(context, "örld");
    }

    #[test]
    fn test_recent_context_limits_turns() {
        let mut buffer = ContextBuffer::with_max_length(10_000);
        for i in 0..8 {
            buffer.append(format!("question {}", i), format!("answer {}", i));
        }

        let recent = buffer.recent_context(2);
        assert!(recent.starts_with("User: question 6"));
        assert!(recent.ends_with("Assistant: answer 7"));
        assert!(!recent.contains("question 5"));

        assert_eq!(buffer.recent_context(0), "");
    }

    #[test]
    fn test_recent_context_still_capped() {
        let mut buffer = ContextBuffer::with_max_length(10);
        buffer.append("a long question indeed", "a long answer indeed");
        assert_eq!(buffer.recent_context(DEFAULT_RECENT_TURNS).chars().count(), 10);
    }

    #[test]
    fn test_formatted_history_strips_prefixes() {
        let mut buffer = ContextBuffer::new();
        buffer.append("Hello", "Hi!");
        buffer.append("Bye", "See you");

        let history = buffer.formatted_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user, "Hello");
        assert_eq!(history[0].assistant, "Hi!");
        assert_eq!(history[1].user, "Bye");
        assert_eq!(history[1].assistant, "See you");
        assert!(history[0].timestamp > 0);
    }

    #[test]
    fn test_formatted_history_skips_unpaired_entry() {
        let mut buffer = ContextBuffer::new();
        buffer
            .import(MemorySnapshot {
                entries: vec![
                    "User: one".to_string(),
                    "Assistant: two".to_string(),
                    "User: dangling".to_string(),
                ],
                max_length: 100,
                timestamp: 0,
            })
            .unwrap();

        let history = buffer.formatted_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].assistant, "two");
        assert_eq!(buffer.turn_count(), 1);
        assert_eq!(buffer.history_len(), 3);
    }

    #[test]
    fn test_auto_manage_fifo_eviction() {
        let mut buffer = ContextBuffer::with_max_length(80);
        for i in 0..6 {
            buffer.append(format!("question number {}", i), format!("answer number {}", i));
        }

        buffer.auto_manage();

        assert!(buffer.context().chars().count() <= 80);
        assert!(buffer.turn_count() >= 1);

        // Whatever survived is a contiguous suffix of the appended turns.
        let history = buffer.formatted_history();
        let first_kept: usize = history[0].user.rsplit(' ').next().unwrap().parse().unwrap();
        for (offset, entry) in history.iter().enumerate() {
            assert_eq!(entry.user, format!("question number {}", first_kept + offset));
        }
        assert_eq!(history.last().unwrap().user, "question number 5");
    }

    #[test]
    fn test_auto_manage_evicts_single_oversized_turn() {
        let mut buffer = ContextBuffer::with_max_length(10);
        buffer.append("x".repeat(25), "y".repeat(25));
        assert!(buffer.has_history());

        buffer.auto_manage();

        assert_eq!(buffer.turn_count(), 0);
        assert_eq!(buffer.context(), "");
    }

    #[test]
    fn test_auto_manage_noop_when_under_budget() {
        let mut buffer = ContextBuffer::with_max_length(1000);
        buffer.append("hi", "hello");
        buffer.auto_manage();
        assert_eq!(buffer.turn_count(), 1);
    }

    #[test]
    fn test_remove_oldest_turn() {
        let mut buffer = ContextBuffer::new();
        buffer.append("first", "first reply");
        buffer.append("second", "second reply");

        buffer.remove_oldest_turn();
        assert_eq!(buffer.turn_count(), 1);
        assert_eq!(buffer.formatted_history()[0].user, "second");
    }

    #[test]
    fn test_remove_oldest_turn_on_empty_is_noop() {
        let mut buffer = ContextBuffer::new();
        buffer.remove_oldest_turn();
        assert_eq!(buffer.turn_count(), 0);
        assert_eq!(buffer.context(), "");
    }

    #[test]
    fn test_clear() {
        let mut buffer = ContextBuffer::new();
        buffer.append("Hello", "Hi!");
        buffer.clear();
        assert!(!buffer.has_history());
        assert_eq!(buffer.turn_count(), 0);
        assert_eq!(buffer.context(), "");
    }

    #[test]
    fn test_set_max_length_never_evicts_retroactively() {
        let mut buffer = ContextBuffer::with_max_length(1000);
        buffer.append("a fairly long question", "a fairly long answer");
        let stored = buffer.history_len();

        buffer.set_max_length(5);
        assert_eq!(buffer.history_len(), stored);
        assert_eq!(buffer.context().chars().count(), 5);

        buffer.auto_manage();
        assert_eq!(buffer.turn_count(), 0);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut buffer = ContextBuffer::with_max_length(256);
        buffer.append("Hello", "Hi!");
        buffer.append("Bye", "See you");
        let before = buffer.formatted_history();

        let snapshot = buffer.export();
        assert_eq!(snapshot.max_length, 256);
        assert!(snapshot.timestamp > 0);

        let mut restored = ContextBuffer::new();
        restored.import(snapshot).unwrap();

        assert_eq!(restored.max_length(), 256);
        let after = restored.formatted_history();
        assert_eq!(after.len(), before.len());
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.user, b.user);
            assert_eq!(a.assistant, b.assistant);
        }
    }

    #[test]
    fn test_import_rejects_zero_max_length() {
        // The source silently ignored malformed snapshots; here the caller
        // gets an explicit error and the buffer keeps its prior state.
        let mut buffer = ContextBuffer::with_max_length(64);
        buffer.append("kept", "still here");

        let result = buffer.import(MemorySnapshot {
            entries: vec![],
            max_length: 0,
            timestamp: 0,
        });

        assert!(result.is_err());
        assert_eq!(buffer.turn_count(), 1);
        assert_eq!(buffer.max_length(), 64);
    }

    #[test]
    fn test_append_accepts_empty_strings() {
        let mut buffer = ContextBuffer::new();
        buffer.append("", "");
        assert_eq!(buffer.turn_count(), 1);
        assert_eq!(buffer.context(), "User: \nAssistant: ");
    }
}
