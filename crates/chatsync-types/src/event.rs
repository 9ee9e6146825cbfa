//! Event types for the coordinator event bus.
//!
//! `SyncEvent` is broadcast whenever presentation-visible state changes.
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

/// Events emitted by the sync coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The cached conversation list changed (refresh, create, delete, title).
    ConversationsChanged { count: usize },

    /// A different conversation became active.
    ActiveChanged { conversation_id: String },

    /// The resident transcript changed (append, delta, fetch arrival, clear).
    TranscriptChanged {
        conversation_id: String,
        message_count: usize,
    },

    /// A full-replace save completed.
    SaveCompleted {
        conversation_id: String,
        message_count: usize,
    },

    /// A full-replace save failed.
    SaveFailed {
        conversation_id: String,
        error: String,
    },

    /// A title was derived from the first user message.
    TitleDerived {
        conversation_id: String,
        title: String,
    },

    /// Non-fatal failure; cached state was retained.
    Warning { message: String },
}
