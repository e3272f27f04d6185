//! Key-value namespace shared by every execution context of the client
//! family (the app-group equivalent).
//!
//! One JSON file under the shared directory holds the whole namespace. There
//! is no cross-process notification channel and no cross-process transaction:
//! every interaction is "write, then later/elsewhere read" with eventual
//! consistency. Readers load the file on every access instead of caching
//! across suspension points.
//!
//! Key ownership:
//! - `isAuthenticated`, `userId`, `authTimestamp` - written only by the
//!   primary-context auth service, read-only everywhere else.
//! - `items` - written by the ingestion listener and the action handler.
//!
//! Writes go through a read-modify-write serialized by a sidecar lock file:
//! the updater atomically creates `shared_state.lock`, applies its change,
//! renames the new snapshot into place and releases. Acquisition retries a
//! bounded number of times, so a lock that never clears (e.g. left behind by
//! a crashed process) fails the update with `Timeout` instead of hanging.
//! Each snapshot carries a `version` token bumped on every write, usable as a
//! cheap change marker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    SHARED_STATE_FILE, STORE_LOCK_MAX_ATTEMPTS, STORE_LOCK_RETRY_INTERVAL_MS,
};
use crate::error::CoreError;
use crate::models::InboxItem;

/// Full persisted snapshot of the shared namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub user_id: String,
    /// Epoch seconds of the last successful sign-in.
    #[serde(default)]
    pub auth_timestamp: u64,
    /// Inbox items, insertion-ordered newest-first.
    #[serde(default)]
    pub items: Vec<InboxItem>,
}

#[derive(Debug, Clone)]
pub struct SharedStorage {
    /// None when the shared directory could not be set up. Every write then
    /// no-ops and every read returns defaults (never "authenticated").
    path: Option<PathBuf>,
}

impl SharedStorage {
    /// Open the shared namespace under `shared_dir`. Never fails: an
    /// unusable directory degrades to the safe no-op mode.
    pub fn new<P: AsRef<Path>>(shared_dir: P) -> Self {
        let dir = shared_dir.as_ref();
        match fs::create_dir_all(dir) {
            Ok(()) => Self {
                path: Some(dir.join(SHARED_STATE_FILE)),
            },
            Err(e) => {
                tracing::warn!("shared storage unavailable at {}: {}", dir.display(), e);
                Self { path: None }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }

    /// Read the current snapshot. Missing or unreadable state yields the
    /// default (not authenticated, empty inbox).
    pub fn load(&self) -> SharedState {
        let Some(ref path) = self.path else {
            return SharedState::default();
        };
        fs::read_to_string(path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default()
    }

    /// Apply `f` to the current snapshot and persist the result, waiting a
    /// bounded time for concurrent writers to release the lock. The write is
    /// flushed before this returns, so a read in the same context immediately
    /// afterwards observes it.
    pub fn update<F>(&self, mut f: F) -> Result<(), CoreError>
    where
        F: FnMut(&mut SharedState),
    {
        let Some(ref path) = self.path else {
            // Unavailable storage no-ops; callers must not treat this as done
            // in any way that could claim "authenticated".
            return Ok(());
        };

        let _lock = Self::acquire_lock(path)?;
        let mut state = self.load();
        f(&mut state);
        state.version += 1;
        self.write(&state)
    }

    fn acquire_lock(path: &Path) -> Result<LockFile, CoreError> {
        let lock_path = path.with_extension("lock");
        for _ in 0..STORE_LOCK_MAX_ATTEMPTS {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(LockFile { path: lock_path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    thread::sleep(Duration::from_millis(STORE_LOCK_RETRY_INTERVAL_MS));
                }
                Err(e) => {
                    tracing::warn!("shared state lock failed: {}", e);
                    return Err(CoreError::StorageUnavailable);
                }
            }
        }
        tracing::warn!("shared storage update contended past retry bound");
        Err(CoreError::Timeout)
    }

    fn write(&self, state: &SharedState) -> Result<(), CoreError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(state).map_err(|_| CoreError::StorageUnavailable)?;

        // Atomic replace: temp file in the same directory, then rename.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            tracing::warn!("shared state write failed: {}", e);
            CoreError::StorageUnavailable
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            tracing::warn!("shared state rename failed: {}", e);
            CoreError::StorageUnavailable
        })?;
        Ok(())
    }
}

/// Held for the duration of one update; releases on drop.
struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("failed to release shared state lock: {}", e);
        }
    }
}
