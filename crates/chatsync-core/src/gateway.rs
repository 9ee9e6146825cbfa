//! PersistenceGateway trait definition.
//!
//! The durable conversation store as seen by the sync engine: CRUD over
//! conversations plus a full-replace write of one conversation's messages.
//! Follows the RPITIT repository pattern (native async fn in traits).

use chatsync_types::conversation::ConversationSummary;
use chatsync_types::error::GatewayError;
use chatsync_types::message::Message;
use chatsync_types::owner::OwnerId;

/// Owner-scoped access to the conversation store.
///
/// Every call is independently atomic. A call naming a conversation that
/// does not exist or belongs to another owner fails with
/// [`GatewayError::NotFound`], never revealing that the id exists.
///
/// Implementations live in chatsync-infra (e.g., `SqliteGateway`).
pub trait PersistenceGateway: Send + Sync {
    /// List the owner's conversations, newest first, with message counts.
    fn list_conversations(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, GatewayError>> + Send;

    /// Create an empty conversation with the given title.
    fn create_conversation(
        &self,
        owner: &OwnerId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<ConversationSummary, GatewayError>> + Send;

    /// Set a conversation's title.
    fn update_conversation_title(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Delete a conversation and all of its messages.
    fn delete_conversation(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Fetch a conversation's transcript in insertion order.
    fn list_messages(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, GatewayError>> + Send;

    /// Replace a conversation's stored transcript with `transcript`.
    ///
    /// Delete-all-then-insert-all. If the delete lands and the insert does
    /// not, the result is [`GatewayError::PartialFailure`] and nothing is
    /// rolled back; the next successful replace rewrites the full set.
    fn replace_messages(
        &self,
        conversation_id: &str,
        owner: &OwnerId,
        transcript: &[Message],
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}
