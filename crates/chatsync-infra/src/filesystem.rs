//! Data directory resolution.

use std::path::{Path, PathBuf};

/// Resolve the chatsync data directory.
///
/// `CHATSYNC_DATA_DIR` wins; otherwise `~/.chatsync`, or `./.chatsync` when
/// no home directory is known.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATSYNC_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".chatsync");
    }

    PathBuf::from(".chatsync")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir(data_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(data_dir).await
}
