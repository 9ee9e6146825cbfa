//! Sync configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.chatsync/` in production)
//! and deserializes it into [`SyncConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use chatsync_types::config::SyncConfig;

/// Load sync configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`SyncConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_sync_config(data_dir: &Path) -> SyncConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return SyncConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return SyncConfig::default();
        }
    };

    match toml::from_str::<SyncConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            SyncConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_sync_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_sync_config(tmp.path()).await;
        assert_eq!(config, SyncConfig::default());
    }

    #[tokio::test]
    async fn load_sync_config_partial_toml_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
save_debounce_ms = 250
default_title = "New chat"
"#,
        )
        .await
        .unwrap();

        let config = load_sync_config(tmp.path()).await;
        assert_eq!(config.save_debounce_ms, 250);
        assert_eq!(config.default_title, "New chat");
        assert_eq!(config.refresh_settle_ms, 1_500);
        assert_eq!(config.title_max_chars, 30);
    }

    #[tokio::test]
    async fn load_sync_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_sync_config(tmp.path()).await;
        assert_eq!(config, SyncConfig::default());
    }
}
