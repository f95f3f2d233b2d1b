// State persistence: the tree and prompts stored as one JSON document.
// Uses the platform data dir: e.g. ~/.local/share/prompt-builder/state.json on Linux.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use prompt_core::{Folder, NodeId, Prompt};
use serde::{Deserialize, Serialize};

/// Quiet period before a scheduled snapshot is written.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not determine the platform config/data directory")]
    NoConfigDir,
}

// ──────────────────────────────────────────────
// Stored document
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<Folder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<Prompt>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_prompt_id: Option<NodeId>,
}

pub trait StateStore {
    fn load(&self) -> Result<StoredState, PersistenceError>;
    fn save(&self, state: &StoredState) -> Result<(), PersistenceError>;
}

// ──────────────────────────────────────────────
// JSON file store
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/prompt-builder/state.json`
    pub fn default_location() -> Result<Self, PersistenceError> {
        let data_dir = dirs::data_dir().ok_or(PersistenceError::NoConfigDir)?;
        Ok(Self::new(data_dir.join("prompt-builder").join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    /// A missing file is an empty state, not an error.
    fn load(&self) -> Result<StoredState, PersistenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No state at {}, starting fresh", self.path.display());
                return Ok(StoredState::default());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, state: &StoredState) -> Result<(), PersistenceError> {
        write_json(&self.path, state)
    }
}

/// Pretty-print `value` to `path`, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ──────────────────────────────────────────────
// Debounced persister
// ──────────────────────────────────────────────

/// Coalesces bursts of changes into one write after a quiet period.
/// Only the latest scheduled snapshot is ever written.
pub struct DebouncedPersister<S: StateStore> {
    store: S,
    quiet_period: Duration,
    pending: Option<StoredState>,
    last_change: Option<Instant>,
    auto_flush: bool,
}

impl<S: StateStore> DebouncedPersister<S> {
    pub fn new(store: S) -> Self {
        Self::with_quiet_period(store, DEFAULT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(store: S, quiet_period: Duration) -> Self {
        Self {
            store,
            quiet_period,
            pending: None,
            last_change: None,
            auto_flush: true,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// With auto flush off, `poll` never writes; only `flush` does.
    pub fn set_auto_flush(&mut self, enabled: bool) {
        self.auto_flush = enabled;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace any pending snapshot and restart the quiet period.
    pub fn schedule(&mut self, snapshot: StoredState, now: Instant) {
        self.pending = Some(snapshot);
        self.last_change = Some(now);
    }

    /// Write the pending snapshot if the quiet period has elapsed.
    /// Returns true if a write succeeded.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.auto_flush {
            return false;
        }
        match self.last_change {
            Some(t) if self.pending.is_some() && now.duration_since(t) >= self.quiet_period => {
                self.write()
            }
            _ => false,
        }
    }

    /// Write the pending snapshot now, if any.
    pub fn flush(&mut self) -> bool {
        self.write()
    }

    fn write(&mut self) -> bool {
        let Some(snapshot) = self.pending.take() else {
            return false;
        };
        self.last_change = None;
        match self.store.save(&snapshot) {
            Ok(()) => {
                log::debug!("Persisted state");
                true
            }
            Err(e) => {
                // Dropped; the next change schedules a fresh snapshot.
                log::error!("Failed to persist state: {}", e);
                false
            }
        }
    }
}
