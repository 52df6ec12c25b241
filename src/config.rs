//! Configuration loading and management
//!
//! Handles parsing of the optional `config.toml` file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::model::{TaskPriority, TaskStatus};
use crate::storage;

/// File name looked up next to the snapshot when no config path is given
pub const CONFIG_FILE: &str = "config.toml";

/// Upper bound for `dashboard.trend_days`
pub use crate::stats::MAX_TREND_DAYS;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Defaults for new tasks
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Dashboard configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Snapshot storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file; the platform data dir is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long to wait for the snapshot lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Pretty-print the snapshot JSON
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            pretty: default_true(),
        }
    }
}

/// Defaults applied by `task add` when flags are omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_task_status")]
    pub default_status: String,

    #[serde(default = "default_task_priority")]
    pub default_priority: String,
}

fn default_task_status() -> String {
    TaskStatus::Todo.as_str().to_string()
}

fn default_task_priority() -> String {
    TaskPriority::Medium.as_str().to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_status: default_task_status(),
            default_priority: default_task_priority(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Days covered by `trend` when `--days` is omitted
    #[serde(default = "default_trend_days")]
    pub trend_days: u32,
}

fn default_trend_days() -> u32 {
    7
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            trend_days: default_trend_days(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or return defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Snapshot path: explicit override, then `storage.path`, then the platform default
    pub fn snapshot_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.storage.path.clone())
            .unwrap_or_else(storage::default_snapshot_path)
    }

    fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.tasks.validate()?;
        self.dashboard.validate()?;
        Ok(())
    }
}

/// Config file location: explicit path, else `config.toml` beside the snapshot
pub fn config_path(explicit: Option<&Path>, snapshot: &Path) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => snapshot
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| parent.join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(Error::InvalidConfig(
                "storage.path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl TasksConfig {
    pub fn default_status(&self) -> Result<TaskStatus> {
        TaskStatus::from_str(&self.default_status).map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_status '{}' is not a known status",
                self.default_status
            ))
        })
    }

    pub fn default_priority(&self) -> Result<TaskPriority> {
        TaskPriority::from_str(&self.default_priority).map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_priority '{}' is not a known priority",
                self.default_priority
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        self.default_status()?;
        self.default_priority()?;
        Ok(())
    }
}

impl DashboardConfig {
    fn validate(&self) -> Result<()> {
        if self.trend_days == 0 || self.trend_days > MAX_TREND_DAYS {
            return Err(Error::InvalidConfig(format!(
                "dashboard.trend_days must be between 1 and {MAX_TREND_DAYS}"
            )));
        }
        Ok(())
    }
}
