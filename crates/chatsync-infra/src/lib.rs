//! Infrastructure layer for chatsync.
//!
//! Contains the SQLite implementation of the `PersistenceGateway` trait
//! defined in `chatsync-core`, plus config loading and data-directory
//! resolution.

pub mod config;
pub mod filesystem;
pub mod sqlite;
