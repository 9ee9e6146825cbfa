//! Save-lifecycle bookkeeping.
//!
//! `SaveTracker` decides whether a debounce firing turns into a write:
//! it is dropped while another save is in flight, skipped when the
//! transcript fingerprint equals the last completed save, and started
//! otherwise.

use chatsync_types::message::Message;

/// Cheap summary of a transcript used to detect no-op saves.
///
/// An edit that keeps the length and the last id unchanged produces the
/// same fingerprint and is not written until something else changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFingerprint {
    pub conversation_id: String,
    pub message_count: usize,
    pub last_message_id: Option<String>,
}

impl SaveFingerprint {
    pub fn of(conversation_id: &str, messages: &[Message]) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            message_count: messages.len(),
            last_message_id: messages.last().map(|m| m.id.clone()),
        }
    }
}

/// Observable save lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    PendingDebounce,
    Saving,
    Failed,
}

/// Outcome of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The transcript was written.
    Saved,
    /// Fingerprint matched the last completed save; nothing written.
    Unchanged,
    /// Another save was in flight; this attempt was dropped.
    Dropped,
    /// No active conversation or an empty transcript.
    NothingToSave,
}

/// Save decision state for one coordinator.
#[derive(Debug, Default)]
pub struct SaveTracker {
    pending: bool,
    in_flight: bool,
    failed: bool,
    last_saved: Option<SaveFingerprint>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SaveState {
        if self.in_flight {
            SaveState::Saving
        } else if self.pending {
            SaveState::PendingDebounce
        } else if self.failed {
            SaveState::Failed
        } else {
            SaveState::Idle
        }
    }

    /// A mutation scheduled a debounce.
    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    /// The pending debounce was cancelled without firing.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    /// A debounce fired for `fingerprint`. Returns `Saved` when the caller
    /// should write, in which case it must later call [`Self::finish`].
    pub fn begin(&mut self, fingerprint: &SaveFingerprint) -> SaveOutcome {
        self.pending = false;
        if self.in_flight {
            return SaveOutcome::Dropped;
        }
        if self.last_saved.as_ref() == Some(fingerprint) {
            return SaveOutcome::Unchanged;
        }
        self.in_flight = true;
        SaveOutcome::Saved
    }

    /// Record the result of a write started by [`Self::begin`].
    pub fn finish(&mut self, fingerprint: SaveFingerprint, succeeded: bool) {
        self.in_flight = false;
        self.failed = !succeeded;
        if succeeded {
            self.last_saved = Some(fingerprint);
        }
    }

    pub fn last_saved(&self) -> Option<&SaveFingerprint> {
        self.last_saved.as_ref()
    }
}
