// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations over the append-only `messages` table.
//!
//! Ordering within a conversation is `created_at` ascending with ties broken
//! by row id. Messages are never updated or individually deleted; the only
//! delete is the conversation-level cascade.

use std::str::FromStr;

use minerva_core::{MinervaError, NewMessage, Role, StoredMessage};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

const SELECT_COLUMNS: &str =
    "id, conversation_id, user_id, role, content, sources, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<StoredMessage, rusqlite::Error> {
    let role_str: String = row.get(3)?;
    let role = Role::from_str(&role_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        user_id: row.get(2)?,
        role,
        content: row.get(4)?,
        sources: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Appends one message, returning its row id.
pub async fn append(db: &Database, msg: &NewMessage) -> Result<i64, MinervaError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (conversation_id, user_id, role, content, sources, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.conversation_id,
                    msg.user_id,
                    msg.role.to_string(),
                    msg.content,
                    msg.sources,
                    msg.created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Appends the two rows of a completed turn (user then assistant) in one
/// transaction.
///
/// Either both rows persist or neither does; a user-row-only turn cannot
/// exist. Returns the two row ids.
pub async fn append_turn(
    db: &Database,
    user: &NewMessage,
    assistant: &NewMessage,
) -> Result<(i64, i64), MinervaError> {
    let user = user.clone();
    let assistant = assistant.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (conversation_id, user_id, role, content, sources, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.conversation_id,
                    user.user_id,
                    user.role.to_string(),
                    user.content,
                    user.sources,
                    user.created_at,
                ],
            )?;
            let user_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO messages (conversation_id, user_id, role, content, sources, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    assistant.conversation_id,
                    assistant.user_id,
                    assistant.role.to_string(),
                    assistant.content,
                    assistant.sources,
                    assistant.created_at,
                ],
            )?;
            let assistant_id = tx.last_insert_rowid();
            tx.commit()?;
            Ok((user_id, assistant_id))
        })
        .await
        .map_err(map_tr_err)
}

/// Returns the last `n` messages of a conversation, newest first.
pub async fn tail(
    db: &Database,
    conversation_id: &str,
    n: usize,
) -> Result<Vec<StoredMessage>, MinervaError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![conversation_id, n as i64], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Returns all messages of a conversation, oldest first.
pub async fn history(
    db: &Database,
    conversation_id: &str,
) -> Result<Vec<StoredMessage>, MinervaError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Distinct conversation ids with at least one message for `user_id`, whose
/// id starts with `prefix`, ordered by most-recent activity descending.
pub async fn conversations_for(
    db: &Database,
    user_id: &str,
    prefix: &str,
) -> Result<Vec<String>, MinervaError> {
    let user_id = user_id.to_string();
    let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT conversation_id, MAX(created_at) AS last_activity
                 FROM messages
                 WHERE user_id = ?1 AND conversation_id LIKE ?2 ESCAPE '\\'
                 GROUP BY conversation_id
                 ORDER BY last_activity DESC",
            )?;
            let rows = stmt.query_map(params![user_id, pattern], |row| row.get::<_, String>(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}

/// Removes every message of the conversation. Returns the number of rows
/// deleted.
pub async fn delete_conversation(
    db: &Database,
    conversation_id: &str,
) -> Result<usize, MinervaError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_msg(conversation: &str, role: Role, content: &str, at: &str) -> NewMessage {
        NewMessage {
            conversation_id: conversation.to_string(),
            user_id: Some("u1".to_string()),
            role,
            content: content.to_string(),
            sources: None,
            created_at: at.to_string(),
        }
    }

    #[tokio::test]
    async fn history_preserves_append_order() {
        let (db, _dir) = setup_db().await;

        let m1 = make_msg("agent-c1", Role::User, "hello", "2026-01-01T00:00:01Z");
        let m2 = make_msg("agent-c1", Role::Assistant, "hi", "2026-01-01T00:00:02Z");
        append(&db, &m1).await.unwrap();
        append(&db, &m2).await.unwrap();

        let messages = history(&db, "agent-c1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[1].role, Role::Assistant);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn equal_timestamps_break_ties_by_id() {
        let (db, _dir) = setup_db().await;

        let at = "2026-01-01T00:00:01Z";
        append(&db, &make_msg("agent-c1", Role::User, "first", at))
            .await
            .unwrap();
        append(&db, &make_msg("agent-c1", Role::Assistant, "second", at))
            .await
            .unwrap();

        let messages = history(&db, "agent-c1").await.unwrap();
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn tail_returns_newest_first() {
        let (db, _dir) = setup_db().await;

        for i in 0..5 {
            let msg = make_msg(
                "agent-c1",
                Role::User,
                &format!("msg {i}"),
                &format!("2026-01-01T00:00:0{i}Z"),
            );
            append(&db, &msg).await.unwrap();
        }

        let messages = tail(&db, "agent-c1", 3).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "msg 4");
        assert_eq!(messages[2].content, "msg 2");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_turn_writes_both_rows() {
        let (db, _dir) = setup_db().await;

        let user = make_msg("agent-c1", Role::User, "question", "2026-01-01T00:00:01Z");
        let assistant = make_msg("agent-c1", Role::Assistant, "answer", "2026-01-01T00:00:02Z");
        let (uid, aid) = append_turn(&db, &user, &assistant).await.unwrap();
        assert!(aid > uid);

        let messages = history(&db, "agent-c1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_then_history_is_empty() {
        let (db, _dir) = setup_db().await;

        append(&db, &make_msg("agent-c1", Role::User, "x", "2026-01-01T00:00:01Z"))
            .await
            .unwrap();
        append(&db, &make_msg("agent-c2", Role::User, "y", "2026-01-01T00:00:02Z"))
            .await
            .unwrap();

        let deleted = delete_conversation(&db, "agent-c1").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(history(&db, "agent-c1").await.unwrap().is_empty());
        // Unrelated conversation untouched.
        assert_eq!(history(&db, "agent-c2").await.unwrap().len(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversations_for_filters_by_user_and_prefix() {
        let (db, _dir) = setup_db().await;

        append(&db, &make_msg("agent-a", Role::User, "1", "2026-01-01T00:00:01Z"))
            .await
            .unwrap();
        append(&db, &make_msg("agent-b", Role::User, "2", "2026-01-01T00:00:03Z"))
            .await
            .unwrap();
        append(&db, &make_msg("chat-c", Role::User, "3", "2026-01-01T00:00:02Z"))
            .await
            .unwrap();
        let other_user = NewMessage {
            user_id: Some("u2".to_string()),
            ..make_msg("agent-z", Role::User, "4", "2026-01-01T00:00:04Z")
        };
        append(&db, &other_user).await.unwrap();

        let ids = conversations_for(&db, "u1", "agent-").await.unwrap();
        assert_eq!(ids, vec!["agent-b".to_string(), "agent-a".to_string()]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conversations_ordered_by_latest_activity() {
        let (db, _dir) = setup_db().await;

        append(&db, &make_msg("agent-a", Role::User, "1", "2026-01-01T00:00:01Z"))
            .await
            .unwrap();
        append(&db, &make_msg("agent-b", Role::User, "2", "2026-01-01T00:00:02Z"))
            .await
            .unwrap();
        // New activity bumps agent-a above agent-b.
        append(&db, &make_msg("agent-a", Role::Assistant, "3", "2026-01-01T00:00:05Z"))
            .await
            .unwrap();

        let ids = conversations_for(&db, "u1", "agent-").await.unwrap();
        assert_eq!(ids, vec!["agent-a".to_string(), "agent-b".to_string()]);

        db.close().await.unwrap();
    }
}
