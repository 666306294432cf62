// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request bounded chat memory.
//!
//! Reconstructs the tail of a conversation from the store into a bounded
//! deque, then grows with the in-flight tool exchange. Memory is never
//! shared across requests; persistence happens through the store at turn
//! end.

use std::collections::VecDeque;

use minerva_core::{MinervaError, Role};
use minerva_providers::ChatMessage;
use minerva_storage::Database;

/// Bounded, ordered list of messages presented to the model for one request.
pub struct ChatMemoryWindow {
    entries: VecDeque<ChatMessage>,
    max_entries: usize,
}

impl ChatMemoryWindow {
    /// Creates an empty window for a context of `window` prior turns.
    ///
    /// The deque holds at most `2 * window` entries (one user plus one
    /// assistant message per turn), with a floor of 2 so the in-flight turn
    /// always fits.
    pub fn new(window: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: (window * 2).max(2),
        }
    }

    /// Loads the last `window` persisted messages of a conversation.
    ///
    /// The tail is fetched newest-first and replayed in ascending order.
    /// Only user and assistant rows participate; tool exchanges are not
    /// persisted and therefore never reload.
    pub async fn load(
        window: usize,
        db: &Database,
        conversation_id: &str,
    ) -> Result<Self, MinervaError> {
        let mut memory = Self::new(window);
        if window == 0 {
            return Ok(memory);
        }

        let tail = minerva_storage::tail(db, conversation_id, window).await?;
        for msg in tail.into_iter().rev() {
            match msg.role {
                Role::User => memory.push(ChatMessage::user(msg.content)),
                Role::Assistant => memory.push(ChatMessage::assistant(msg.content)),
                _ => {}
            }
        }
        Ok(memory)
    }

    /// Appends a message, evicting the oldest non-system entry on overflow.
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.max_entries {
            let evict_at = self
                .entries
                .iter()
                .position(|m| m.role != Role::System)
                .unwrap_or(0);
            self.entries.remove(evict_at);
        }
    }

    /// The window contents, oldest first.
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_core::NewMessage;
    use tempfile::tempdir;

    #[test]
    fn push_keeps_at_most_two_per_window_turn() {
        let mut memory = ChatMemoryWindow::new(2);
        for i in 0..6 {
            memory.push(ChatMessage::user(format!("m{i}")));
        }
        assert_eq!(memory.len(), 4);
        assert_eq!(memory.to_vec()[0].content, "m2");
    }

    #[test]
    fn eviction_skips_system_preamble() {
        let mut memory = ChatMemoryWindow::new(1);
        memory.push(ChatMessage::system("preamble"));
        memory.push(ChatMessage::user("a"));
        memory.push(ChatMessage::assistant("b"));
        // Overflow: the user message goes, the system preamble stays.
        assert_eq!(memory.len(), 2);
        let messages = memory.to_vec();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "b");
    }

    #[test]
    fn zero_window_still_accepts_current_turn() {
        let mut memory = ChatMemoryWindow::new(0);
        memory.push(ChatMessage::user("hello"));
        memory.push(ChatMessage::assistant("world"));
        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn load_replays_tail_ascending() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();

        for (i, (role, text)) in [
            (Role::User, "q1"),
            (Role::Assistant, "a1"),
            (Role::User, "q2"),
            (Role::Assistant, "a2"),
        ]
        .into_iter()
        .enumerate()
        {
            minerva_storage::append(
                &db,
                &NewMessage {
                    conversation_id: "agent-c".into(),
                    user_id: Some("u1".into()),
                    role,
                    content: text.into(),
                    sources: None,
                    created_at: format!("2026-01-01T00:00:0{i}Z"),
                },
            )
            .await
            .unwrap();
        }

        let memory = ChatMemoryWindow::load(10, &db, "agent-c").await.unwrap();
        let messages = memory.to_vec();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].content, "q1");
        assert_eq!(messages[3].content, "a2");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn load_with_zero_window_skips_history() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        minerva_storage::append(
            &db,
            &NewMessage {
                conversation_id: "agent-c".into(),
                user_id: None,
                role: Role::User,
                content: "old".into(),
                sources: None,
                created_at: "2026-01-01T00:00:00Z".into(),
            },
        )
        .await
        .unwrap();

        let memory = ChatMemoryWindow::load(0, &db, "agent-c").await.unwrap();
        assert!(memory.is_empty());

        db.close().await.unwrap();
    }
}
