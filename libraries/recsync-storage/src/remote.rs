//! Registry of remote servers
//!
//! Each remote is reached through its own `SQLite` URL (typically a file on
//! a network mount). Pools are opened read-only on first use and cached for
//! the rest of the run. A server that fails to connect stays unreachable
//! for the registry's lifetime, so it is not retried on every item.

use crate::context::RemoteRecordSource;
use async_trait::async_trait;
use recsync_core::types::ServerId;
use recsync_core::{RecordSource, RemoteServers};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Connection slot of one remote; `None` once a connect attempt failed
type Slot = OnceCell<Option<Arc<RemoteRecordSource>>>;

/// Lazily connecting registry of remote record sources
pub struct SqliteRemoteRegistry {
    urls: HashMap<ServerId, String>,
    connect_timeout: Duration,
    // One cell per server: connecting to one remote never waits on another
    slots: HashMap<ServerId, Slot>,
}

impl SqliteRemoteRegistry {
    pub fn new(urls: HashMap<ServerId, String>, connect_timeout: Duration) -> Self {
        let slots = urls.keys().map(|id| (*id, OnceCell::new())).collect();
        Self {
            urls,
            connect_timeout,
            slots,
        }
    }

    /// Ids of every configured remote, ascending
    pub fn server_ids(&self) -> Vec<ServerId> {
        let mut ids: Vec<ServerId> = self.urls.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Remotes whose connect attempt failed, ascending
    pub fn unreachable_servers(&self) -> Vec<ServerId> {
        let mut ids: Vec<ServerId> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot.get(), Some(None)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    async fn connect(&self, url: &str) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .read_only(true)
            .busy_timeout(self.connect_timeout);

        SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(self.connect_timeout)
            .connect_with(options)
            .await
    }

    async fn open(&self, server_id: ServerId, url: &str) -> Option<Arc<RemoteRecordSource>> {
        match tokio::time::timeout(self.connect_timeout, self.connect(url)).await {
            Ok(Ok(pool)) => {
                tracing::debug!(server_id, "Connected to remote server");
                Some(Arc::new(RemoteRecordSource::new(server_id, pool)))
            }
            Ok(Err(e)) => {
                tracing::warn!(server_id, error = %e, "Failed to connect to remote server");
                None
            }
            Err(_) => {
                tracing::warn!(server_id, timeout = ?self.connect_timeout, "Connecting to remote server timed out");
                None
            }
        }
    }
}

#[async_trait]
impl RemoteServers for SqliteRemoteRegistry {
    async fn source(&self, server_id: ServerId) -> Option<Arc<dyn RecordSource>> {
        let (Some(url), Some(slot)) = (self.urls.get(&server_id), self.slots.get(&server_id))
        else {
            tracing::warn!(server_id, "No database configured for remote server");
            return None;
        };

        slot.get_or_init(|| self.open(server_id, url))
            .await
            .clone()
            .map(|source| source as Arc<dyn RecordSource>)
    }
}
