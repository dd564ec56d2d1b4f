//! # tlog-storage
//!
//! why: keep the coordinated core state durable across coordinator restarts
//! relations: persists tlog-core's CoreState, read back at the start of every recovery
//! what: CoreStateStore trait, FileStorage implementation, InMemoryStorage for testing

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;

use tlog_core::CoreState;
use tracing::{debug, info, warn};

/// errors from persisting or loading core state
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// recovery counts must strictly increase between writes
    #[error("stale recovery count {attempted}, stored state is at {stored}")]
    StaleRecoveryCount { stored: u64, attempted: u64 },
}

/// trait for durable storage of the coordinated core state
///
/// this abstraction allows the same code to work with:
/// - real filesystem (native)
/// - in-memory (testing)
pub trait CoreStateStore {
    /// persist a new core state; its recovery count must exceed the stored one
    fn save(&mut self, state: &CoreState) -> Result<(), StorageError>;

    /// load the persisted core state, if any was written
    fn load(&self) -> Result<Option<CoreState>, StorageError>;

    /// clear all persisted state (for testing)
    fn clear(&mut self) -> Result<(), StorageError>;
}

fn check_recovery_count(stored: Option<&CoreState>, next: &CoreState) -> Result<(), StorageError> {
    match stored {
        Some(stored) if next.recovery_count <= stored.recovery_count => {
            warn!(
                stored = stored.recovery_count,
                attempted = next.recovery_count,
                "rejecting stale core state"
            );
            Err(StorageError::StaleRecoveryCount {
                stored: stored.recovery_count,
                attempted: next.recovery_count,
            })
        }
        _ => Ok(()),
    }
}

// -- file storage implementation --

/// file-based storage implementation using std::fs
///
/// stores the core state as core_state.json in the given directory
pub struct FileStorage {
    /// directory path for storing state files
    dir: PathBuf,
}

impl FileStorage {
    /// create a new filestorage at the given directory
    /// creates the directory if it doesn't exist
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join("core_state.json")
    }
}

impl CoreStateStore for FileStorage {
    fn save(&mut self, state: &CoreState) -> Result<(), StorageError> {
        check_recovery_count(self.load()?.as_ref(), state)?;

        let json = serde_json::to_string_pretty(state)?;

        // atomic write: write to temp file then rename
        let temp_path = self.dir.join("core_state.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, self.state_path())?;

        info!(
            recovery_count = state.recovery_count,
            log_groups = state.log_groups.len(),
            old_generations = state.old_generations.len(),
            "persisted core state"
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<CoreState>, StorageError> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None); // nothing recovered yet
        }

        let mut file = File::open(&path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let state: CoreState = serde_json::from_str(&contents)?;
        debug!(recovery_count = state.recovery_count, "loaded core state");
        Ok(Some(state))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(self.state_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // already clear
            Err(e) => Err(e.into()),
        }
    }
}

// -- in-memory storage implementation --

/// in-memory storage for testing
///
/// stores all state in memory, no persistence across restarts
#[derive(Default)]
pub struct InMemoryStorage {
    state: Option<CoreState>,
}

impl InMemoryStorage {
    /// create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl CoreStateStore for InMemoryStorage {
    fn save(&mut self, state: &CoreState) -> Result<(), StorageError> {
        check_recovery_count(self.state.as_ref(), state)?;
        self.state = Some(state.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<CoreState>, StorageError> {
        Ok(self.state.clone())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.state = None;
        Ok(())
    }
}
