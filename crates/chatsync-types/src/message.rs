//! Message types for chat transcripts.
//!
//! A `Message` carries an ordered list of typed content parts. The store
//! only knows `text` parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Role of the message author.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant', 'system'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One typed content part of a message.
///
/// Serialized as `{"type": "text", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    /// The text payload, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text } => Some(text),
        }
    }
}

/// Persisted message content: `{"parts": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// A single message within a conversation transcript.
///
/// Order within a transcript is insertion order. `streaming` is transient
/// client state and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub streaming: bool,
}

impl Message {
    /// Create a user message with a single text part and a fresh id.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, text)
    }

    /// Create a finished assistant message with a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, text)
    }

    /// Empty assistant message used as the target of a response stream.
    pub fn assistant_placeholder() -> Self {
        Self {
            streaming: true,
            ..Self::with_role(MessageRole::Assistant, String::new())
        }
    }

    fn with_role(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role,
            parts: vec![MessagePart::text(text)],
            created_at: Utc::now(),
            streaming: false,
        }
    }

    /// Text of the first text part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(MessagePart::as_text)
    }

    /// All text parts concatenated.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(MessagePart::as_text).collect()
    }

    /// Append a streamed delta to the last text part, creating one if needed.
    pub fn push_text(&mut self, delta: &str) {
        match self.parts.iter_mut().rev().find_map(|p| match p {
            MessagePart::Text { text } => Some(text),
        }) {
            Some(text) => text.push_str(delta),
            None => self.parts.push(MessagePart::text(delta)),
        }
    }

    pub fn content(&self) -> MessageContent {
        MessageContent {
            parts: self.parts.clone(),
        }
    }
}
