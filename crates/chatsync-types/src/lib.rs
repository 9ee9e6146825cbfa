//! Shared domain types for chatsync.
//!
//! Conversations, messages, caller identity, configuration, coordinator
//! events, and the error taxonomy shared by the core and infra crates.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod message;
pub mod owner;
