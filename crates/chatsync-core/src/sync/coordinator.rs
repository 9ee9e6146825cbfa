//! SyncCoordinator: keeps the resident transcript and the conversation
//! directory consistent with the durable store.
//!
//! All shared state sits behind one `std::sync::Mutex` that is only held for
//! short, synchronous sections and never across an `.await`. Gateway calls
//! happen outside the lock; their results are applied afterwards only if the
//! session (or directory) generation they were issued for is still current.
//!
//! Saves are debounced: every transcript mutation restarts the save timer,
//! and at most one full-replace write is in flight at a time. A mutation also
//! restarts a longer settle timer that re-pulls the conversation list so
//! derived titles and message counts show up.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chatsync_types::config::SyncConfig;
use chatsync_types::conversation::ConversationSummary;
use chatsync_types::error::{GatewayError, SyncError};
use chatsync_types::event::SyncEvent;
use chatsync_types::message::Message;
use chatsync_types::owner::OwnerId;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::debounce::DebounceTimer;
use crate::directory::ConversationDirectory;
use crate::event::bus::EventBus;
use crate::gateway::PersistenceGateway;
use crate::session::{ConversationSession, TranscriptSnapshot};
use crate::stream::{DeltaStream, MessageStreamAdapter};
use crate::title::{derive_title, needs_derived_title};

use super::save::{SaveOutcome, SaveState, SaveTracker};

struct SyncState {
    directory: ConversationDirectory,
    session: ConversationSession,
    save: SaveTracker,
    is_loading: bool,
    healing: bool,
}

struct Inner<G> {
    gateway: G,
    owner: OwnerId,
    config: SyncConfig,
    state: Mutex<SyncState>,
    save_timer: DebounceTimer,
    refresh_timer: DebounceTimer,
    events: EventBus,
    stream_adapter: Option<Arc<dyn MessageStreamAdapter>>,
}

/// What to do with the active session after a delete.
enum AfterDelete {
    Keep,
    Promote(String),
    Recreate,
}

/// Coordinates one owner's conversations against a [`PersistenceGateway`].
///
/// Cheap to clone; clones share state. Must be used from within a tokio
/// runtime because mutations schedule timers.
pub struct SyncCoordinator<G: PersistenceGateway + 'static> {
    inner: Arc<Inner<G>>,
}

impl<G: PersistenceGateway + 'static> Clone for SyncCoordinator<G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<G: PersistenceGateway + 'static> SyncCoordinator<G> {
    pub fn new(gateway: G, owner: OwnerId, config: SyncConfig) -> Self {
        Self::build(gateway, owner, config, None)
    }

    /// Like [`Self::new`], with an adapter for [`Self::request_reply`].
    pub fn with_stream_adapter(
        gateway: G,
        owner: OwnerId,
        config: SyncConfig,
        adapter: Arc<dyn MessageStreamAdapter>,
    ) -> Self {
        Self::build(gateway, owner, config, Some(adapter))
    }

    fn build(
        gateway: G,
        owner: OwnerId,
        config: SyncConfig,
        stream_adapter: Option<Arc<dyn MessageStreamAdapter>>,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                gateway,
                owner,
                config,
                state: Mutex::new(SyncState {
                    directory: ConversationDirectory::new(),
                    session: ConversationSession::new(),
                    save: SaveTracker::new(),
                    is_loading: true,
                    healing: false,
                }),
                save_timer: DebounceTimer::new("save"),
                refresh_timer: DebounceTimer::new("refresh"),
                events,
                stream_adapter,
            }),
        }
    }

    // --- Read side ---

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    pub fn owner(&self) -> &OwnerId {
        &self.inner.owner
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Cached conversation list, newest first.
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.state().directory.list().to_vec()
    }

    pub fn current_conversation_id(&self) -> Option<String> {
        self.state().session.conversation_id().map(str::to_string)
    }

    pub fn current_conversation(&self) -> Option<ConversationSummary> {
        let state = self.state();
        let id = state.session.conversation_id()?;
        state.directory.get(id).cloned()
    }

    /// Copy of the resident transcript.
    pub fn transcript(&self) -> Vec<Message> {
        self.state().session.messages().to_vec()
    }

    /// True until the first bootstrap completes.
    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    /// True while the active conversation's stored transcript is being fetched.
    pub fn is_transcript_loading(&self) -> bool {
        let state = self.state();
        state.session.conversation_id().is_some() && !state.session.is_loaded()
    }

    pub fn save_state(&self) -> SaveState {
        self.state().save.state()
    }

    pub fn is_streaming(&self) -> bool {
        self.state().session.is_streaming()
    }

    // --- Lifecycle ---

    /// Load the conversation list and activate the newest conversation,
    /// creating a default one when the owner has none.
    ///
    /// Only an unauthorized list is fatal; any other list failure is logged
    /// and treated as an empty store.
    #[tracing::instrument(skip(self), fields(owner = %self.inner.owner))]
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        self.state().is_loading = true;
        let result = self.bootstrap_inner().await;
        self.state().is_loading = false;
        result
    }

    async fn bootstrap_inner(&self) -> Result<(), SyncError> {
        let listed = match self.inner.gateway.list_conversations(&self.inner.owner).await {
            Ok(listed) => listed,
            Err(GatewayError::Unauthorized) => return Err(GatewayError::Unauthorized.into()),
            Err(e) => {
                warn!(error = %e, "failed to list conversations, starting with a fresh one");
                self.warn_event(format!("failed to list conversations: {e}"));
                Vec::new()
            }
        };

        let Some(first_id) = listed.first().map(|c| c.id.clone()) else {
            let created = self
                .inner
                .gateway
                .create_conversation(&self.inner.owner, &self.inner.config.default_title)
                .await?;
            info!(conversation_id = %created.id, "created initial conversation");
            let id = created.id.clone();
            {
                let mut state = self.state();
                state.directory.replace_all(vec![created]);
                state.session.activate_empty(&id);
            }
            self.emit(SyncEvent::ConversationsChanged { count: 1 });
            self.announce_activation(&id, None);
            return Ok(());
        };

        let count = listed.len();
        let generation = {
            let mut state = self.state();
            state.directory.replace_all(listed);
            state.session.activate(&first_id)
        };
        debug!(count, conversation_id = %first_id, "bootstrapped conversation list");
        self.emit(SyncEvent::ConversationsChanged { count });
        self.announce_activation(&first_id, None);
        self.load_transcript(&first_id, generation).await;
        Ok(())
    }

    // --- Switching ---

    /// Make `conversation_id` active and fetch its transcript.
    ///
    /// A save still waiting on its debounce is flushed for the outgoing
    /// conversation first. Switching to the active conversation is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn switch_to(&self, conversation_id: &str) {
        self.switch_inner(conversation_id, true).await;
    }

    async fn switch_inner(&self, conversation_id: &str, flush_outgoing: bool) {
        let (generation, outgoing) = {
            let mut state = self.state();
            if state.session.is_active(conversation_id) {
                return;
            }
            self.activate(&mut state, conversation_id, flush_outgoing, false)
        };
        self.announce_activation(conversation_id, outgoing);
        self.load_transcript(conversation_id, generation).await;
    }

    /// Replace the session under the lock.
    ///
    /// Cancels the save debounce; when one was waiting and `flush_outgoing`
    /// is set, returns a snapshot of the outgoing transcript to save.
    fn activate(
        &self,
        state: &mut SyncState,
        conversation_id: &str,
        flush_outgoing: bool,
        known_empty: bool,
    ) -> (u64, Option<TranscriptSnapshot>) {
        let was_pending = self.inner.save_timer.cancel();
        state.save.clear_pending();
        let outgoing = if was_pending && flush_outgoing && state.session.is_loaded() {
            state.session.snapshot()
        } else {
            None
        };
        let generation = if known_empty {
            state.session.activate_empty(conversation_id)
        } else {
            state.session.activate(conversation_id)
        };
        (generation, outgoing)
    }

    fn announce_activation(&self, conversation_id: &str, outgoing: Option<TranscriptSnapshot>) {
        if let Some(snapshot) = outgoing {
            debug!(
                conversation_id = %snapshot.conversation_id,
                "flushing pending save of outgoing conversation"
            );
            let this = self.clone();
            tokio::spawn(async move {
                let _ = this.run_save(snapshot).await;
            });
        }
        self.emit(SyncEvent::ActiveChanged {
            conversation_id: conversation_id.to_string(),
        });
        self.emit(SyncEvent::TranscriptChanged {
            conversation_id: conversation_id.to_string(),
            message_count: 0,
        });
    }

    async fn load_transcript(&self, conversation_id: &str, generation: u64) {
        let result = self
            .inner
            .gateway
            .list_messages(conversation_id, &self.inner.owner)
            .await;

        let mut state = self.state();
        if !state.session.is_current(generation) {
            debug!(conversation_id, "discarding transcript fetched for a superseded session");
            return;
        }
        let had_local = !state.session.messages().is_empty();
        match result {
            Ok(messages) => {
                debug!(conversation_id, count = messages.len(), "transcript loaded");
                state.session.load(messages);
            }
            Err(e) => {
                warn!(conversation_id, error = %e, "failed to fetch transcript");
                state.session.mark_loaded();
                self.warn_event(format!("failed to load messages: {e}"));
            }
        }
        if had_local {
            // Appends made while the fetch was in flight still need a save.
            self.after_mutation(&mut state);
        } else {
            self.emit(SyncEvent::TranscriptChanged {
                conversation_id: conversation_id.to_string(),
                message_count: state.session.messages().len(),
            });
        }
    }

    // --- Directory operations ---

    /// Open an empty conversation, reusing one if the owner already has it.
    ///
    /// Returns the id of the conversation that is active afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn new_chat(&self) -> Result<String, SyncError> {
        let reusable = {
            let state = self.state();
            state
                .directory
                .find_empty()
                .map(|c| (c.id.clone(), state.session.is_active(&c.id)))
        };
        match reusable {
            Some((id, true)) => {
                debug!(conversation_id = %id, "already on an empty conversation");
                Ok(id)
            }
            Some((id, false)) => {
                debug!(conversation_id = %id, "reusing empty conversation");
                self.switch_inner(&id, true).await;
                Ok(id)
            }
            None => self.create_and_activate(true).await.inspect_err(|e| {
                warn!(error = %e, "failed to create conversation");
            }),
        }
    }

    async fn create_and_activate(&self, flush_outgoing: bool) -> Result<String, SyncError> {
        let created = self
            .inner
            .gateway
            .create_conversation(&self.inner.owner, &self.inner.config.default_title)
            .await?;
        info!(conversation_id = %created.id, "created conversation");
        let id = created.id.clone();
        let (count, outgoing) = {
            let mut state = self.state();
            state.directory.prepend(created);
            let (_, outgoing) = self.activate(&mut state, &id, flush_outgoing, true);
            (state.directory.len(), outgoing)
        };
        self.emit(SyncEvent::ConversationsChanged { count });
        self.announce_activation(&id, outgoing);
        Ok(id)
    }

    /// Delete a conversation.
    ///
    /// If it was the last one a fresh default conversation is created; if it
    /// was active the newest remaining conversation becomes active. A gateway
    /// error leaves local state untouched. If the replacement cannot be
    /// created, no conversation stays active until a refresh heals the
    /// empty directory.
    #[tracing::instrument(skip(self))]
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), SyncError> {
        self.inner
            .gateway
            .delete_conversation(conversation_id, &self.inner.owner)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to delete conversation"))?;
        info!("deleted conversation");

        let (next, count) = {
            let mut state = self.state();
            state.directory.remove(conversation_id);
            if state.session.is_active(conversation_id) {
                // Nothing may be written back to the deleted conversation.
                self.inner.save_timer.cancel();
                state.save.clear_pending();
                state.session.deactivate();
            }
            let next = if state.directory.is_empty() {
                AfterDelete::Recreate
            } else if state.session.conversation_id().is_none() {
                match state.directory.first() {
                    Some(first) => AfterDelete::Promote(first.id.clone()),
                    None => AfterDelete::Recreate,
                }
            } else {
                AfterDelete::Keep
            };
            (next, state.directory.len())
        };
        self.emit(SyncEvent::ConversationsChanged { count });

        match next {
            AfterDelete::Keep => {}
            AfterDelete::Promote(id) => self.switch_inner(&id, false).await,
            AfterDelete::Recreate => {
                // The refresh below heals the empty directory if this fails.
                if let Err(e) = self.create_and_activate(false).await {
                    warn!(error = %e, "failed to create replacement conversation");
                    self.warn_event(format!("failed to create conversation: {e}"));
                }
            }
        }
        self.refresh_conversations().await;
        Ok(())
    }

    /// Set a conversation's title. Blank titles are ignored (returns false).
    #[tracing::instrument(skip(self))]
    pub async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<bool, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        self.inner
            .gateway
            .update_conversation_title(conversation_id, &self.inner.owner, title)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to rename conversation"))?;

        let count = {
            let mut state = self.state();
            state.directory.set_title(conversation_id, title);
            state.directory.len()
        };
        self.emit(SyncEvent::ConversationsChanged { count });
        self.refresh_conversations().await;
        Ok(true)
    }

    /// Re-pull the conversation list.
    ///
    /// Failures keep the cached list. A result overtaken by a local edit is
    /// discarded. An empty store is healed by creating a default conversation.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_conversations(&self) {
        let generation = self.state().directory.begin_refresh();
        let listed = match self.inner.gateway.list_conversations(&self.inner.owner).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!(error = %e, "conversation refresh failed, keeping cached list");
                self.warn_event(format!("failed to refresh conversations: {e}"));
                return;
            }
        };

        if listed.is_empty() {
            let heal = {
                let mut state = self.state();
                let heal = state.directory.is_current_refresh(generation) && !state.healing;
                state.healing |= heal;
                heal
            };
            if heal {
                warn!("store has no conversations, creating a default one");
                self.heal_empty_directory().await;
                self.state().healing = false;
            }
            return;
        }

        let count = listed.len();
        if self.state().directory.apply_refresh(generation, listed) {
            self.emit(SyncEvent::ConversationsChanged { count });
        } else {
            debug!("discarding superseded conversation refresh");
        }
    }

    async fn heal_empty_directory(&self) {
        let created = match self
            .inner
            .gateway
            .create_conversation(&self.inner.owner, &self.inner.config.default_title)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "failed to create replacement conversation");
                self.warn_event(format!("failed to create conversation: {e}"));
                return;
            }
        };
        let id = created.id.clone();
        let switched = {
            let mut state = self.state();
            state.directory.replace_all(vec![created]);
            if state.session.is_active(&id) {
                false
            } else {
                self.activate(&mut state, &id, false, true);
                true
            }
        };
        self.emit(SyncEvent::ConversationsChanged { count: 1 });
        if switched {
            self.announce_activation(&id, None);
        }
    }

    // --- Transcript mutations ---

    /// Append a user message to the active transcript.
    pub fn append_user_message(&self, text: impl Into<String>) -> Result<Message, SyncError> {
        let message = Message::user(text);
        self.append_message(message.clone())?;
        Ok(message)
    }

    /// Append a message to the active transcript and schedule a save.
    pub fn append_message(&self, message: Message) -> Result<(), SyncError> {
        let mut state = self.state();
        state.session.append(message)?;
        self.after_mutation(&mut state);
        Ok(())
    }

    /// Stream an assistant reply to the current transcript from the
    /// configured adapter. Returns the id of the assistant message.
    pub async fn request_reply(&self) -> Result<String, SyncError> {
        let adapter = self
            .inner
            .stream_adapter
            .clone()
            .ok_or(SyncError::NoStreamAdapter)?;
        let transcript = self.transcript();
        self.consume_stream(adapter.stream_reply(&transcript)).await
    }

    /// Apply a delta stream to a new assistant message in the active
    /// transcript. Returns the assistant message id.
    ///
    /// Ends early, keeping the partial message, when the stream errors or is
    /// cancelled. Switching conversations cancels the stream and discards any
    /// further deltas.
    pub async fn consume_stream(&self, mut stream: DeltaStream) -> Result<String, SyncError> {
        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        let (generation, ticket) = {
            let mut state = self.state();
            state.session.append(placeholder)?;
            let ticket = state.session.begin_stream();
            let generation = state.session.generation();
            self.after_mutation(&mut state);
            (generation, ticket)
        };

        let mut deltas = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = ticket.cancel.cancelled() => {
                    debug!(message_id, deltas, "stream cancelled");
                    break;
                }
                next = stream.next() => next,
            };
            let delta = match next {
                None => break,
                Some(Ok(delta)) => delta,
                Some(Err(e)) => {
                    warn!(message_id, deltas, error = %e, "reply stream failed, keeping partial message");
                    self.warn_event(format!("reply stream failed: {e}"));
                    break;
                }
            };
            let applied = {
                let mut state = self.state();
                let current = state.session.is_current(generation);
                match state.session.message_mut(&message_id) {
                    Some(message) if current => {
                        message.push_text(&delta);
                        self.after_mutation(&mut state);
                        true
                    }
                    _ => false,
                }
            };
            if !applied {
                break;
            }
            deltas += 1;
        }

        let mut state = self.state();
        state.session.end_stream(&ticket);
        if state.session.is_current(generation) {
            if let Some(message) = state.session.message_mut(&message_id) {
                message.streaming = false;
            }
            self.after_mutation(&mut state);
        }
        debug!(message_id, deltas, "reply stream finished");
        Ok(message_id)
    }

    /// Stop the running reply stream, keeping what has arrived.
    pub fn cancel_stream(&self) -> bool {
        self.state().session.cancel_stream()
    }

    fn after_mutation(&self, state: &mut SyncState) {
        let Some(conversation_id) = state.session.conversation_id().map(str::to_string) else {
            return;
        };
        state.save.mark_pending();
        self.schedule_save();
        self.schedule_refresh();
        self.emit(SyncEvent::TranscriptChanged {
            conversation_id,
            message_count: state.session.messages().len(),
        });
    }

    fn schedule_save(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .save_timer
            .schedule(self.inner.config.save_debounce(), async move {
                if let Some(coordinator) = Self::upgrade(&weak) {
                    let _ = coordinator.fire_save().await;
                }
            });
    }

    fn schedule_refresh(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .refresh_timer
            .schedule(self.inner.config.refresh_settle(), async move {
                if let Some(coordinator) = Self::upgrade(&weak) {
                    coordinator.refresh_conversations().await;
                }
            });
    }

    fn upgrade(weak: &Weak<Inner<G>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // --- Saving ---

    /// Save the active transcript now instead of waiting for the debounce.
    pub async fn flush_now(&self) -> Result<SaveOutcome, SyncError> {
        self.inner.save_timer.cancel();
        self.fire_save().await
    }

    async fn fire_save(&self) -> Result<SaveOutcome, SyncError> {
        let snapshot = {
            let mut state = self.state();
            if !state.session.is_loaded() {
                state.save.clear_pending();
                debug!("transcript still loading, save deferred");
                return Ok(SaveOutcome::NothingToSave);
            }
            let snapshot = state.session.snapshot();
            if snapshot.is_none() {
                state.save.clear_pending();
            }
            snapshot
        };
        match snapshot {
            Some(snapshot) => self.run_save(snapshot).await,
            None => Ok(SaveOutcome::NothingToSave),
        }
    }

    #[tracing::instrument(
        skip(self, snapshot),
        fields(conversation_id = %snapshot.conversation_id, messages = snapshot.messages.len())
    )]
    async fn run_save(&self, snapshot: TranscriptSnapshot) -> Result<SaveOutcome, SyncError> {
        let fingerprint = snapshot.fingerprint();
        let decision = self.state().save.begin(&fingerprint);
        match decision {
            SaveOutcome::Saved => {}
            SaveOutcome::Dropped => {
                debug!("save already in flight, dropping this one");
                return Ok(decision);
            }
            _ => {
                debug!("transcript unchanged since last save");
                return Ok(decision);
            }
        }

        let conversation_id = snapshot.conversation_id.as_str();
        let result = self
            .inner
            .gateway
            .replace_messages(conversation_id, &self.inner.owner, &snapshot.messages)
            .await;

        let title = {
            let mut state = self.state();
            state.save.finish(fingerprint, result.is_ok());
            if result.is_ok() {
                let count = u32::try_from(snapshot.messages.len()).unwrap_or(u32::MAX);
                state.directory.set_message_count(conversation_id, count);
                self.title_to_derive(&state.directory, &snapshot)
            } else {
                None
            }
        };

        if let Err(e) = result {
            match &e {
                GatewayError::PartialFailure(_) => {
                    error!(error = %e, "save deleted the stored transcript but did not rewrite it")
                }
                _ => warn!(error = %e, "save failed"),
            }
            self.emit(SyncEvent::SaveFailed {
                conversation_id: conversation_id.to_string(),
                error: e.to_string(),
            });
            return Err(e.into());
        }

        debug!("transcript saved");
        self.emit(SyncEvent::SaveCompleted {
            conversation_id: conversation_id.to_string(),
            message_count: snapshot.messages.len(),
        });
        if let Some(title) = title {
            self.apply_derived_title(conversation_id, &title).await;
        }
        Ok(SaveOutcome::Saved)
    }

    fn title_to_derive(&self, directory: &ConversationDirectory, snapshot: &TranscriptSnapshot) -> Option<String> {
        if !snapshot.has_user_message() {
            return None;
        }
        let current = directory.get(&snapshot.conversation_id)?;
        let config = &self.inner.config;
        if !needs_derived_title(&current.title, &config.default_title) {
            return None;
        }
        derive_title(&snapshot.messages, config.title_max_chars, &config.title_ellipsis)
    }

    async fn apply_derived_title(&self, conversation_id: &str, title: &str) {
        if let Err(e) = self
            .inner
            .gateway
            .update_conversation_title(conversation_id, &self.inner.owner, title)
            .await
        {
            warn!(conversation_id, error = %e, "failed to store derived title");
            return;
        }
        let count = {
            let mut state = self.state();
            state.directory.set_title(conversation_id, title);
            state.directory.len()
        };
        info!(conversation_id, title, "derived conversation title");
        self.emit(SyncEvent::TitleDerived {
            conversation_id: conversation_id.to_string(),
            title: title.to_string(),
        });
        self.emit(SyncEvent::ConversationsChanged { count });
    }

    // --- Helpers ---

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state.lock().expect("sync state lock poisoned")
    }

    fn emit(&self, event: SyncEvent) {
        self.inner.events.publish(event);
    }

    fn warn_event(&self, message: String) {
        self.emit(SyncEvent::Warning { message });
    }
}

impl<G: PersistenceGateway + 'static> std::fmt::Debug for SyncCoordinator<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SyncCoordinator")
            .field("owner", &self.inner.owner)
            .field("conversations", &state.directory.len())
            .field("active", &state.session.conversation_id())
            .field("messages", &state.session.messages().len())
            .field("save_state", &state.save.state())
            .finish()
    }
}
