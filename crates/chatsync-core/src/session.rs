//! The active conversation session.
//!
//! `ConversationSession` pairs the active conversation id with its resident
//! transcript. Switching conversations replaces the session wholesale: the
//! old transcript is dropped, the generation advances, and any in-flight
//! stream bound to the old session is cancelled. Async results carry the
//! generation they were issued for and are applied only if it still matches.

use chatsync_types::error::SyncError;
use chatsync_types::message::{Message, MessageRole};
use tokio_util::sync::CancellationToken;

use crate::sync::save::SaveFingerprint;

/// Active conversation id plus its resident transcript.
#[derive(Debug, Default)]
pub struct ConversationSession {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    generation: u64,
    loaded: bool,
    stream: Option<StreamSlot>,
    next_stream_id: u64,
}

#[derive(Debug)]
struct StreamSlot {
    id: u64,
    cancel: CancellationToken,
}

/// Handle for the stream currently writing into this session.
#[derive(Debug, Clone)]
pub struct StreamTicket {
    pub id: u64,
    pub cancel: CancellationToken,
}

/// A copy of one conversation's transcript taken for a save.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSnapshot {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

impl TranscriptSnapshot {
    pub fn fingerprint(&self) -> SaveFingerprint {
        SaveFingerprint::of(&self.conversation_id, &self.messages)
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == MessageRole::User)
    }
}

impl ConversationSession {
    /// A session with no active conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace this session with an empty one for `conversation_id`.
    ///
    /// Returns the new generation. Cancels any stream owned by the old session.
    /// The transcript counts as loading until [`Self::load`] or
    /// [`Self::mark_loaded`] is called.
    pub fn activate(&mut self, conversation_id: &str) -> u64 {
        self.cancel_stream();
        *self = Self {
            conversation_id: Some(conversation_id.to_string()),
            messages: Vec::new(),
            generation: self.generation + 1,
            loaded: false,
            stream: None,
            next_stream_id: self.next_stream_id,
        };
        self.generation
    }

    /// Activate a conversation known to have no stored messages.
    pub fn activate_empty(&mut self, conversation_id: &str) -> u64 {
        let generation = self.activate(conversation_id);
        self.loaded = true;
        generation
    }

    /// Leave no conversation active. Pending results for the old session
    /// become stale and its stream is cancelled.
    pub fn deactivate(&mut self) {
        self.cancel_stream();
        self.conversation_id = None;
        self.messages.clear();
        self.loaded = false;
        self.generation += 1;
    }

    /// Whether the stored transcript has arrived (or is known to be empty).
    ///
    /// Saving before that would replace stored messages with a partial set.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Stop waiting for the stored transcript, keeping whatever is resident.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_active(&self, conversation_id: &str) -> bool {
        self.conversation_id.as_deref() == Some(conversation_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Install a fetched transcript.
    ///
    /// Messages appended locally after the switch are kept after the fetched
    /// ones unless the store already has them.
    pub fn load(&mut self, fetched: Vec<Message>) {
        self.loaded = true;
        let local = std::mem::replace(&mut self.messages, fetched);
        for message in local {
            if !self.contains(&message.id) {
                self.messages.push(message);
            }
        }
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.messages.iter().any(|m| m.id == message_id)
    }

    /// Append a message at the end of the transcript.
    pub fn append(&mut self, message: Message) -> Result<(), SyncError> {
        if self.conversation_id.is_none() {
            return Err(SyncError::NoActiveConversation);
        }
        if self.contains(&message.id) {
            return Err(SyncError::DuplicateMessage(message.id));
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Claim the stream slot, cancelling any stream already running.
    pub fn begin_stream(&mut self) -> StreamTicket {
        self.cancel_stream();
        self.next_stream_id += 1;
        let cancel = CancellationToken::new();
        self.stream = Some(StreamSlot {
            id: self.next_stream_id,
            cancel: cancel.clone(),
        });
        StreamTicket {
            id: self.next_stream_id,
            cancel,
        }
    }

    /// Cancel the running stream, if any. Returns whether one was running.
    pub fn cancel_stream(&mut self) -> bool {
        match self.stream.take() {
            Some(slot) => {
                slot.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Release the stream slot if `ticket` still holds it.
    pub fn end_stream(&mut self, ticket: &StreamTicket) {
        if self.stream.as_ref().is_some_and(|slot| slot.id == ticket.id) {
            self.stream = None;
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Copy of the transcript for saving; `None` when there is nothing to save.
    pub fn snapshot(&self) -> Option<TranscriptSnapshot> {
        let conversation_id = self.conversation_id.clone()?;
        if self.messages.is_empty() {
            return None;
        }
        Some(TranscriptSnapshot {
            conversation_id,
            messages: self.messages.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_discards_previous_transcript() {
        let mut session = ConversationSession::new();
        let g1 = session.activate("a");
        session.append(Message::user("hello")).unwrap();

        let g2 = session.activate("b");
        assert!(g2 > g1);
        assert!(session.messages().is_empty());
        assert_eq!(session.conversation_id(), Some("b"));
        assert!(!session.is_current(g1));
    }

    #[test]
    fn test_append_rejects_duplicate_ids() {
        let mut session = ConversationSession::new();
        session.activate("a");
        let msg = Message::user("once");
        session.append(msg.clone()).unwrap();

        let err = session.append(msg.clone()).unwrap_err();
        assert_eq!(err, SyncError::DuplicateMessage(msg.id));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_append_without_active_conversation_fails() {
        let mut session = ConversationSession::new();
        let err = session.append(Message::user("x")).unwrap_err();
        assert_eq!(err, SyncError::NoActiveConversation);
    }

    #[test]
    fn test_load_keeps_local_appends_after_fetched() {
        let mut session = ConversationSession::new();
        session.activate("a");
        let local = Message::user("typed before fetch arrived");
        session.append(local.clone()).unwrap();

        let stored = vec![Message::user("old"), Message::assistant("reply")];
        session.load(stored.clone());

        let ids: Vec<&str> = session.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![stored[0].id.as_str(), stored[1].id.as_str(), local.id.as_str()]);
    }

    #[test]
    fn test_loaded_flag_follows_activation() {
        let mut session = ConversationSession::new();
        session.activate("a");
        assert!(!session.is_loaded());
        session.load(Vec::new());
        assert!(session.is_loaded());

        session.activate_empty("b");
        assert!(session.is_loaded());
        session.activate("c");
        assert!(!session.is_loaded());
        session.mark_loaded();
        assert!(session.is_loaded());
    }

    #[test]
    fn test_deactivate_drops_transcript_and_stream() {
        let mut session = ConversationSession::new();
        let generation = session.activate("a");
        session.append(Message::user("x")).unwrap();
        let ticket = session.begin_stream();

        session.deactivate();

        assert!(session.conversation_id().is_none());
        assert!(session.messages().is_empty());
        assert!(session.snapshot().is_none());
        assert!(!session.is_current(generation));
        assert!(ticket.cancel.is_cancelled());
    }

    #[test]
    fn test_snapshot_none_when_empty() {
        let mut session = ConversationSession::new();
        assert!(session.snapshot().is_none());
        session.activate("a");
        assert!(session.snapshot().is_none());
        session.append(Message::user("x")).unwrap();
        let snap = session.snapshot().unwrap();
        assert_eq!(snap.conversation_id, "a");
        assert!(snap.has_user_message());
    }

    #[test]
    fn test_activate_cancels_running_stream() {
        let mut session = ConversationSession::new();
        session.activate("a");
        let ticket = session.begin_stream();
        session.activate("b");
        assert!(ticket.cancel.is_cancelled());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_begin_stream_cancels_previous() {
        let mut session = ConversationSession::new();
        session.activate("a");
        let first = session.begin_stream();
        let second = session.begin_stream();
        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        // A finished stream that lost the slot does not release the new one.
        session.end_stream(&first);
        assert!(session.is_streaming());

        assert!(session.cancel_stream());
        assert!(second.cancel.is_cancelled());
        assert!(!session.cancel_stream());
    }

    #[test]
    fn test_end_stream_releases_own_slot() {
        let mut session = ConversationSession::new();
        session.activate("a");
        let ticket = session.begin_stream();
        session.end_stream(&ticket);
        assert!(!session.is_streaming());
        assert!(!ticket.cancel.is_cancelled());
    }
}
