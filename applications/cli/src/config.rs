/// Record sync configuration
use crate::error::{CliError, Result};
use recsync_core::types::ServerId;
use recsync_engine::SyncSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "recsync.toml";

/// Placeholder replaced by the server number in remote roots
const SERVER_PLACEHOLDER: &str = "{server}";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecSyncConfig {
    #[serde(default = "default_database")]
    pub database: DatabaseSettings,

    /// Remote database URL per server number
    #[serde(default)]
    pub remotes: HashMap<String, String>,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_sync")]
    pub sync: SyncTuning,

    #[serde(default = "default_logging")]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,

    /// Mount point of a peer's recording root, with `{server}` in it
    #[serde(default = "default_remote_root_template")]
    pub remote_root_template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncTuning {
    #[serde(default = "default_remote_query_timeout_secs")]
    pub remote_query_timeout_secs: u64,

    #[serde(default = "default_min_gap_seconds")]
    pub min_gap_seconds: u64,

    #[serde(default)]
    pub start_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for RecSyncConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            remotes: HashMap::new(),
            storage: default_storage(),
            sync: default_sync(),
            logging: default_logging(),
        }
    }
}

impl RecSyncConfig {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    /// Environment variables override the file, e.g.
    /// `RECSYNC_DATABASE__URL` or `RECSYNC_REMOTES__2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("RECSYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(CliError::Config("database.url is required".to_string()));
        }

        if !self
            .storage
            .remote_root_template
            .contains(SERVER_PLACEHOLDER)
        {
            return Err(CliError::Config(format!(
                "storage.remote_root_template must contain {}, got {:?}",
                SERVER_PLACEHOLDER, self.storage.remote_root_template
            )));
        }

        if self.sync.remote_query_timeout_secs == 0 {
            return Err(CliError::Config(
                "sync.remote_query_timeout_secs must be positive".to_string(),
            ));
        }

        self.remote_urls().map(|_| ())
    }

    /// Remote database URLs keyed by server number
    pub fn remote_urls(&self) -> Result<HashMap<ServerId, String>> {
        self.remotes
            .iter()
            .map(|(key, url)| {
                let id = key
                    .trim()
                    .parse::<ServerId>()
                    .ok()
                    .filter(|id| *id > 0)
                    .ok_or_else(|| {
                        CliError::Config(format!("remotes.{} is not a server number", key))
                    })?;
                Ok((id, url.clone()))
            })
            .collect()
    }

    pub fn remote_query_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.remote_query_timeout_secs)
    }

    /// Engine settings derived from this configuration
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            remote_query_timeout: self.remote_query_timeout(),
            min_gap: Duration::from_secs(self.sync.min_gap_seconds),
            start_delay: Duration::from_secs(self.sync.start_delay_secs),
            local_root: self.storage.local_root.clone(),
            remote_root_template: self.storage.remote_root_template.clone(),
        }
    }
}

// Default values
fn default_database() -> DatabaseSettings {
    DatabaseSettings {
        url: default_database_url(),
        run_migrations: default_run_migrations(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/records.db".to_string()
}

fn default_run_migrations() -> bool {
    true
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        local_root: default_local_root(),
        remote_root_template: default_remote_root_template(),
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from("/home/neurotime/stream_analyse/recording")
}

fn default_remote_root_template() -> String {
    "/mnt/fs_svr{server}/recording".to_string()
}

fn default_sync() -> SyncTuning {
    SyncTuning {
        remote_query_timeout_secs: default_remote_query_timeout_secs(),
        min_gap_seconds: default_min_gap_seconds(),
        start_delay_secs: 0,
    }
}

fn default_remote_query_timeout_secs() -> u64 {
    30
}

fn default_min_gap_seconds() -> u64 {
    20
}

fn default_logging() -> LoggingSettings {
    LoggingSettings {
        filter: default_log_filter(),
    }
}

fn default_log_filter() -> String {
    "recsync=info,recsync_engine=info".to_string()
}
