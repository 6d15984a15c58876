//! Storage location shared between the app and its companion processes.
//!
//! Files here are only ever replaced whole: each write goes to a temporary
//! file in the same directory and is then renamed over the target, so a
//! reader sees either the previous file or the new one, never a mix.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct SharedContainer {
    dir: PathBuf,
    shared: bool,
}

impl SharedContainer {
    /// Resolve the directory used by the writing side.
    ///
    /// Prefers the configured shared container. When it is not configured or
    /// cannot be created, falls back to the process-local data directory;
    /// companions then simply see no data.
    pub fn resolve(config: &StorageConfig) -> Result<Self> {
        if let Some(container) = Self::create_shared(config) {
            return Ok(container);
        }

        let dir = config.local_data_dir()?;
        warn!(
            path = %dir.display(),
            "shared container unavailable, using local storage"
        );
        Ok(Self { dir, shared: false })
    }

    /// Open the shared container for reading. Nothing is created: a
    /// container the app has never written to is treated as absent.
    pub fn open_existing(config: &StorageConfig) -> Option<Self> {
        let dir = config.shared_dir.as_ref()?;
        if !dir.is_dir() {
            debug!(path = %dir.display(), "shared container does not exist");
            return None;
        }
        Some(Self {
            dir: dir.clone(),
            shared: true,
        })
    }

    fn create_shared(config: &StorageConfig) -> Option<Self> {
        let dir = config.shared_dir.as_ref()?;
        match std::fs::create_dir_all(dir) {
            Ok(()) => Some(Self {
                dir: dir.clone(),
                shared: true,
            }),
            Err(e) => {
                warn!(
                    path = %dir.display(),
                    error = %e,
                    "cannot open shared container"
                );
                None
            }
        }
    }

    /// Use an explicit directory.
    pub fn at(dir: impl Into<PathBuf>, shared: bool) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, shared })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether this is the real shared container rather than the local
    /// fallback.
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Atomically replace `name` with the JSON form of `value`.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let target = self.path_of(name);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %target.display(), size = bytes.len(), "replaced shared file");
        Ok(())
    }

    /// Read `name` as JSON. Missing or unreadable files give `None`.
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path_of(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "shared file not written yet");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read shared file");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to decode shared file");
                None
            }
        }
    }

    /// Read `name` as a JSON array, empty on any failure.
    pub fn read_list<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        self.read_json(name).unwrap_or_default()
    }
}
