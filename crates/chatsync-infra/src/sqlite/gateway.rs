//! SQLite conversation store.
//!
//! Implements `PersistenceGateway` from `chatsync-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, owner scoping in every
//! statement. Message content is stored as JSON (`{"parts":[...]}`) with an
//! explicit position so a transcript reads back in the order it was written.

use chatsync_core::gateway::PersistenceGateway;
use chatsync_types::conversation::ConversationSummary;
use chatsync_types::error::GatewayError;
use chatsync_types::message::{Message, MessageContent, MessageRole};
use chatsync_types::owner::OwnerId;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `PersistenceGateway`.
#[derive(Clone)]
pub struct SqliteGateway {
    pool: DatabasePool,
}

impl SqliteGateway {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Fail with `NotFound` unless `owner` owns `conversation_id`.
    async fn ensure_owned(&self, conversation_id: &str, owner: &OwnerId) -> Result<(), GatewayError> {
        let row = sqlx::query("SELECT 1 FROM conversations WHERE id = ? AND owner_id = ?")
            .bind(conversation_id)
            .bind(owner.as_str())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(transient)?;

        row.map(|_| ()).ok_or(GatewayError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            message_count: row.try_get("message_count")?,
        })
    }

    fn into_summary(self) -> Result<ConversationSummary, GatewayError> {
        Ok(ConversationSummary {
            id: self.id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            message_count: self.message_count as u32,
        })
    }
}

struct MessageRow {
    id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, GatewayError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(GatewayError::Transient)?;
        let content: MessageContent = serde_json::from_str(&self.content)
            .map_err(|e| GatewayError::Transient(format!("invalid message content: {e}")))?;

        Ok(Message {
            id: self.id,
            role,
            parts: content.parts,
            created_at: parse_datetime(&self.created_at)?,
            streaming: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn transient(e: sqlx::Error) -> GatewayError {
    GatewayError::Transient(e.to_string())
}

fn partial(e: sqlx::Error) -> GatewayError {
    GatewayError::PartialFailure(e.to_string())
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, GatewayError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| GatewayError::Transient(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// PersistenceGateway implementation
// ---------------------------------------------------------------------------

impl PersistenceGateway for SqliteGateway {
    async fn list_conversations(&self, owner: &OwnerId) -> Result<Vec<ConversationSummary>, GatewayError> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.title, c.created_at, c.updated_at,
                      (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count
               FROM conversations c
               WHERE c.owner_id = ?
               ORDER BY c.created_at DESC, c.id DESC"#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(transient)?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation_row = ConversationRow::from_row(row).map_err(transient)?;
            conversations.push(conversation_row.into_summary()?);
        }

        Ok(conversations)
    }

    async fn create_conversation(&self, owner: &OwnerId, title: &str) -> Result<ConversationSummary, GatewayError> {
        let now = Utc::now();
        let summary = ConversationSummary {
            id: Uuid::now_v7().to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            message_count: 0,
        };

        sqlx::query(
            r#"INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&summary.id)
        .bind(owner.as_str())
        .bind(&summary.title)
        .bind(format_datetime(&summary.created_at))
        .bind(format_datetime(&summary.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(transient)?;

        tracing::debug!(conversation_id = %summary.id, "inserted conversation");
        Ok(summary)
    }

    async fn update_conversation_title(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        title: &str,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(title)
        .bind(format_datetime(&Utc::now()))
        .bind(conversation_id)
        .bind(owner.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(transient)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }

        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: &str, owner: &OwnerId) -> Result<(), GatewayError> {
        // Messages go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM conversations WHERE id = ? AND owner_id = ?")
            .bind(conversation_id)
            .bind(owner.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(transient)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }

        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str, owner: &OwnerId) -> Result<Vec<Message>, GatewayError> {
        self.ensure_owned(conversation_id, owner).await?;

        let rows = sqlx::query(
            "SELECT id, role, content, created_at FROM messages WHERE conversation_id = ? ORDER BY position ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(transient)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row = MessageRow::from_row(row).map_err(transient)?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn replace_messages(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        transcript: &[Message],
    ) -> Result<(), GatewayError> {
        self.ensure_owned(conversation_id, owner).await?;

        // Encode before touching anything so a bad message has no effect.
        let mut encoded = Vec::with_capacity(transcript.len());
        for message in transcript {
            let content = serde_json::to_string(&message.content())
                .map_err(|e| GatewayError::Transient(format!("failed to encode message: {e}")))?;
            encoded.push((message, content));
        }

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool.writer)
            .await
            .map_err(transient)?;

        // From here on the old transcript is gone; failures are partial.
        let mut tx = self.pool.writer.begin().await.map_err(partial)?;
        for (position, (message, content)) in encoded.iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO messages (id, conversation_id, role, content, position, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&message.id)
            .bind(conversation_id)
            .bind(message.role.to_string())
            .bind(content)
            .bind(position as i64)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(partial)?;
        }
        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(partial)?;
        tx.commit().await.map_err(partial)?;

        tracing::debug!(conversation_id, count = transcript.len(), "replaced transcript");
        Ok(())
    }
}
