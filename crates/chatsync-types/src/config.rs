//! Configuration types for the sync engine.
//!
//! `SyncConfig` represents `config.toml` in the data directory and controls
//! debounce timing, the default conversation title, and title derivation.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Tunables for the sync coordinator.
///
/// All fields have defaults, so an empty `config.toml` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay after the last transcript mutation before a save fires.
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    /// Delay after the last transcript mutation before the directory refreshes.
    #[serde(default = "default_refresh_settle_ms")]
    pub refresh_settle_ms: u64,

    /// Title given to newly created conversations.
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Maximum characters kept when deriving a title from the first user message.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Marker appended to a derived title that was truncated.
    #[serde(default = "default_title_ellipsis")]
    pub title_ellipsis: String,

    /// Capacity of the coordinator event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_save_debounce_ms() -> u64 {
    1_000
}

fn default_refresh_settle_ms() -> u64 {
    1_500
}

fn default_title() -> String {
    "新しいチャット".to_string()
}

fn default_title_max_chars() -> usize {
    30
}

fn default_title_ellipsis() -> String {
    "...".to_string()
}

fn default_event_capacity() -> usize {
    256
}

impl SyncConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn refresh_settle(&self) -> Duration {
        Duration::from_millis(self.refresh_settle_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: default_save_debounce_ms(),
            refresh_settle_ms: default_refresh_settle_ms(),
            default_title: default_title(),
            title_max_chars: default_title_max_chars(),
            title_ellipsis: default_title_ellipsis(),
            event_capacity: default_event_capacity(),
        }
    }
}
