//! Conversation summary type.
//!
//! A `ConversationSummary` is what the directory caches and what the
//! gateway lists. `message_count` is derived by the store and may lag the
//! resident transcript until the next save or refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation as listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u32,
}

impl ConversationSummary {
    /// Whether the store reports no persisted messages for this conversation.
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }
}
