//! In-memory `PersistenceGateway` used by the coordinator tests.
//!
//! Counts every call, and can be told to slow down or fail individual
//! operations so tests can drive races with a paused clock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chatsync_types::conversation::ConversationSummary;
use chatsync_types::error::GatewayError;
use chatsync_types::message::Message;
use chatsync_types::owner::OwnerId;
use chrono::Utc;

use crate::gateway::PersistenceGateway;

#[derive(Default)]
struct Store {
    /// (owner, summary), newest first.
    conversations: Vec<(String, ConversationSummary)>,
    messages: HashMap<String, Vec<Message>>,
    next_id: usize,
    fetch_delays: HashMap<String, Duration>,
    replace_delay: Duration,
    create_delay: Duration,
    list_failure: Option<GatewayError>,
    create_failure: Option<GatewayError>,
    replace_failure: Option<GatewayError>,
    title_failure: Option<GatewayError>,
}

#[derive(Default)]
pub(crate) struct MockGateway {
    store: Mutex<Store>,
    pub lists: AtomicUsize,
    pub creates: AtomicUsize,
    pub title_updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fetches: AtomicUsize,
    pub replaces: AtomicUsize,
}

pub(crate) fn summary(id: &str, title: &str) -> ConversationSummary {
    ConversationSummary {
        id: id.to_string(),
        title: title.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        message_count: 0,
    }
}

pub(crate) fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a conversation. Seeds are listed in the order they are added.
    pub fn with_conversation(self, owner: &str, id: &str, title: &str, messages: Vec<Message>) -> Self {
        {
            let mut store = self.lock();
            store.conversations.push((owner.to_string(), summary(id, title)));
            store.messages.insert(id.to_string(), messages);
        }
        self
    }

    pub fn set_fetch_delay(&self, conversation_id: &str, delay: Duration) {
        self.lock().fetch_delays.insert(conversation_id.to_string(), delay);
    }

    pub fn set_replace_delay(&self, delay: Duration) {
        self.lock().replace_delay = delay;
    }

    pub fn set_create_delay(&self, delay: Duration) {
        self.lock().create_delay = delay;
    }

    pub fn fail_list(&self, error: Option<GatewayError>) {
        self.lock().list_failure = error;
    }

    pub fn fail_create(&self, error: Option<GatewayError>) {
        self.lock().create_failure = error;
    }

    pub fn fail_replace(&self, error: Option<GatewayError>) {
        self.lock().replace_failure = error;
    }

    pub fn fail_title(&self, error: Option<GatewayError>) {
        self.lock().title_failure = error;
    }

    pub fn stored_messages(&self, conversation_id: &str) -> Vec<Message> {
        self.lock()
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stored_title(&self, conversation_id: &str) -> Option<String> {
        self.lock()
            .conversations
            .iter()
            .find(|(_, c)| c.id == conversation_id)
            .map(|(_, c)| c.title.clone())
    }

    pub fn conversation_ids(&self) -> Vec<String> {
        self.lock()
            .conversations
            .iter()
            .map(|(_, c)| c.id.clone())
            .collect()
    }

    /// Remove a conversation behind the coordinator's back.
    pub fn remove_externally(&self, conversation_id: &str) {
        let mut store = self.lock();
        store.conversations.retain(|(_, c)| c.id != conversation_id);
        store.messages.remove(conversation_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("mock store lock poisoned")
    }
}

fn check_owner(store: &Store, conversation_id: &str, owner: &OwnerId) -> Result<(), GatewayError> {
    store
        .conversations
        .iter()
        .any(|(o, c)| c.id == conversation_id && o == owner.as_str())
        .then_some(())
        .ok_or(GatewayError::NotFound)
}

impl PersistenceGateway for MockGateway {
    async fn list_conversations(&self, owner: &OwnerId) -> Result<Vec<ConversationSummary>, GatewayError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let store = self.lock();
        if let Some(error) = &store.list_failure {
            return Err(error.clone());
        }
        Ok(store
            .conversations
            .iter()
            .filter(|(o, _)| o == owner.as_str())
            .map(|(_, c)| {
                let mut c = c.clone();
                c.message_count = store.messages.get(&c.id).map_or(0, |m| m.len() as u32);
                c
            })
            .collect())
    }

    async fn create_conversation(&self, owner: &OwnerId, title: &str) -> Result<ConversationSummary, GatewayError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let delay = self.lock().create_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut store = self.lock();
        if let Some(error) = &store.create_failure {
            return Err(error.clone());
        }
        store.next_id += 1;
        let created = summary(&format!("new-{}", store.next_id), title);
        store
            .conversations
            .insert(0, (owner.as_str().to_string(), created.clone()));
        store.messages.insert(created.id.clone(), Vec::new());
        Ok(created)
    }

    async fn update_conversation_title(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        title: &str,
    ) -> Result<(), GatewayError> {
        self.title_updates.fetch_add(1, Ordering::SeqCst);
        let mut store = self.lock();
        if let Some(error) = &store.title_failure {
            return Err(error.clone());
        }
        check_owner(&store, conversation_id, owner)?;
        if let Some((_, c)) = store
            .conversations
            .iter_mut()
            .find(|(_, c)| c.id == conversation_id)
        {
            c.title = title.to_string();
        }
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: &str, owner: &OwnerId) -> Result<(), GatewayError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut store = self.lock();
        check_owner(&store, conversation_id, owner)?;
        store.conversations.retain(|(_, c)| c.id != conversation_id);
        store.messages.remove(conversation_id);
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str, owner: &OwnerId) -> Result<Vec<Message>, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = self.lock().fetch_delays.get(conversation_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let store = self.lock();
        check_owner(&store, conversation_id, owner)?;
        Ok(store.messages.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn replace_messages(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        transcript: &[Message],
    ) -> Result<(), GatewayError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        let delay = self.lock().replace_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut store = self.lock();
        check_owner(&store, conversation_id, owner)?;
        match store.replace_failure.clone() {
            Some(GatewayError::PartialFailure(reason)) => {
                store.messages.insert(conversation_id.to_string(), Vec::new());
                Err(GatewayError::PartialFailure(reason))
            }
            Some(error) => Err(error),
            None => {
                let stored = transcript
                    .iter()
                    .cloned()
                    .map(|mut m| {
                        m.streaming = false;
                        m
                    })
                    .collect();
                store.messages.insert(conversation_id.to_string(), stored);
                Ok(())
            }
        }
    }
}
