//! Storage layer for taskdeck
//!
//! The whole store is persisted as one JSON snapshot:
//!
//! ```text
//! <data dir>/
//!   task-manager-storage.json        # {"state": {...}, "version": 0}
//!   task-manager-storage.json.lock   # advisory lock held during reads/writes
//!   config.toml                      # optional, see `config`
//! ```
//!
//! Backends implement [`SnapshotStore`]; the store never touches the
//! filesystem directly.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{SmartFolder, Tag, Task, Theme, View};

/// File name of the persisted snapshot
pub const SNAPSHOT_FILE: &str = "task-manager-storage.json";

/// Snapshot format version. Written, never migrated.
pub const SNAPSHOT_VERSION: u32 = 0;

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
    #[serde(default)]
    pub tags: BTreeMap<String, Tag>,
    #[serde(default)]
    pub smart_folders: BTreeMap<String, SmartFolder>,
    #[serde(default)]
    pub current_view: View,
    #[serde(default)]
    pub selected_task_id: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<BTreeMap<String, String>>,
}

/// On-disk wrapper around [`PersistedState`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

impl Snapshot {
    pub fn new(state: PersistedState) -> Self {
        Self {
            state,
            version: SNAPSHOT_VERSION,
        }
    }
}

/// Where snapshots are read from and written to.
pub trait SnapshotStore: fmt::Debug {
    /// Load the last snapshot, `None` if nothing has been saved yet
    fn load(&self) -> Result<Option<PersistedState>>;

    /// Replace the stored snapshot
    fn save(&self, state: &PersistedState) -> Result<()>;
}

/// File-backed snapshot storage
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    lock_timeout_ms: u64,
    pretty: bool,
}

impl Storage {
    /// Create storage for the snapshot at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            pretty: true,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn encode(&self, state: &PersistedState) -> Result<Vec<u8>> {
        let snapshot = Snapshot::new(state.clone());
        let json = if self.pretty {
            serde_json::to_vec_pretty(&snapshot)?
        } else {
            serde_json::to_vec(&snapshot)?
        };
        Ok(json)
    }
}

impl SnapshotStore for Storage {
    fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = lock::read_locked(&self.path, self.lock_timeout_ms)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                version = snapshot.version,
                "snapshot version differs; loading as is"
            );
        }
        Ok(Some(snapshot.state))
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let bytes = self.encode(state)?;
        lock::write_atomic_locked(&self.path, &bytes, self.lock_timeout_ms)
    }
}

/// In-memory snapshot storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<PersistedState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved snapshot
    pub fn saved(&self) -> Option<PersistedState> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SnapshotStore for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| Error::OperationFailed("memory storage poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::OperationFailed("memory storage poisoned".to_string()))?;
        *slot = Some(state.clone());
        Ok(())
    }
}

/// Platform data directory for taskdeck (e.g. `~/.local/share/taskdeck`)
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "taskdeck").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Default snapshot path, falling back to the working directory
pub fn default_snapshot_path() -> PathBuf {
    default_data_dir()
        .map(|dir| dir.join(SNAPSHOT_FILE))
        .unwrap_or_else(|| PathBuf::from(SNAPSHOT_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskPriority, TaskStatus};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_state() -> PersistedState {
        let at = NaiveDate::from_ymd_opt(2024, 4, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        let mut state = PersistedState::default();
        state.tags.insert(
            "tag-1".to_string(),
            Tag {
                id: "tag-1".to_string(),
                name: "Work".to_string(),
                color: "#2563eb".to_string(),
            },
        );
        state.tasks.insert(
            "task-1".to_string(),
            Task {
                id: "task-1".to_string(),
                title: "Draft plan".to_string(),
                description: Some("first pass".to_string()),
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                tags: vec!["tag-1".to_string()],
                due_date: Some(at),
                estimated_time: Some(30),
                assignee: None,
                parent_id: None,
                children: Vec::new(),
                created_at: at,
                updated_at: at,
                completed_at: None,
                repeat_type: None,
                repeat_config: None,
                reminder_config: None,
                focus_sessions: None,
            },
        );
        state.selected_task_id = Some("task-1".to_string());
        state.current_view = View::Kanban;
        state
    }

    #[test]
    fn missing_file_loads_as_none() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().join(SNAPSHOT_FILE));
        assert!(!storage.exists());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_round_trip_uses_state_envelope() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().join("nested").join(SNAPSHOT_FILE)).with_pretty(false);
        let state = sample_state();

        storage.save(&state).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 0);
        assert_eq!(raw["state"]["currentView"], "KANBAN");
        assert_eq!(raw["state"]["selectedTaskId"], "task-1");
        assert_eq!(raw["state"]["tasks"]["task-1"]["dueDate"], "2024-04-02T09:15");
        assert!(raw["state"]["smartFolders"].is_object());

        assert_eq!(storage.load().unwrap(), Some(state));
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SNAPSHOT_FILE);
        std::fs::write(&path, "{not json").unwrap();
        let err = Storage::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn empty_file_loads_as_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SNAPSHOT_FILE);
        std::fs::write(&path, "\n").unwrap();
        assert!(Storage::new(&path).load().unwrap().is_none());
    }

    #[test]
    fn memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        assert!(handle.saved().is_none());
        storage.save(&sample_state()).unwrap();
        assert_eq!(handle.load().unwrap(), Some(sample_state()));
    }
}
