//! Core sync engine for chatsync.
//!
//! Defines the `PersistenceGateway` and `MessageStreamAdapter` traits that
//! the infrastructure layer implements, plus the in-memory pieces that keep
//! a streaming chat transcript consistent with the durable store:
//! the conversation directory, the active session, title derivation,
//! debounce timers, and the `SyncCoordinator` that ties them together.

pub mod debounce;
pub mod directory;
pub mod event;
pub mod gateway;
pub mod session;
pub mod stream;
pub mod sync;
pub mod title;

#[cfg(test)]
pub(crate) mod testing;

pub use sync::{SaveOutcome, SaveState, SyncCoordinator};
