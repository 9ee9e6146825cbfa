//! Application state wiring the store and the sync coordinator together.

use std::sync::Arc;

use anyhow::Context;
use chatsync_core::sync::SyncCoordinator;
use chatsync_infra::config::load_sync_config;
use chatsync_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use chatsync_infra::sqlite::gateway::SqliteGateway;
use chatsync_infra::sqlite::pool::{DatabasePool, database_url_in};
use chatsync_types::owner::OwnerId;

use crate::cli::stdin_stream::LineStreamAdapter;

/// The coordinator pinned to the SQLite store.
pub type ConcreteCoordinator = SyncCoordinator<SqliteGateway>;

/// Shared state for CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: ConcreteCoordinator,
}

impl AppState {
    /// Open the store, load config, and bootstrap the coordinator for `owner`.
    pub async fn init(owner: Option<&str>) -> anyhow::Result<Self> {
        let owner = OwnerId::new(owner.unwrap_or_default())
            .context("no owner given; pass --owner or set CHATSYNC_OWNER")?;

        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_sync_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url_in(&data_dir))
            .await
            .context("failed to open conversation store")?;

        let coordinator = SyncCoordinator::with_stream_adapter(
            SqliteGateway::new(db_pool),
            owner,
            config,
            Arc::new(LineStreamAdapter::stdin()),
        );
        coordinator
            .bootstrap()
            .await
            .context("failed to load conversations")?;

        tracing::debug!(data_dir = %data_dir.display(), "application state ready");
        Ok(Self { coordinator })
    }
}
