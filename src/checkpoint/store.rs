//! File-backed checkpoint store
//!
//! Writes go to `<file>.tmp` first and are then renamed over the checkpoint,
//! so an interrupted write leaves the previous checkpoint intact.

use crate::checkpoint::CheckpointError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Loads and saves one checkpoint document of type `T`
#[derive(Debug, Clone)]
pub struct CheckpointStore<T> {
    path: PathBuf,
    _state: PhantomData<T>,
}

impl<T> CheckpointStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _state: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last saved state
    ///
    /// A missing file yields the empty state. So does a file that cannot be
    /// read or parsed; that case is logged and the crawl starts over.
    pub fn load(&self) -> T {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No checkpoint at {}, starting empty", self.path.display());
                return T::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Checkpoint {} is unreadable ({}), starting empty",
                    self.path.display(),
                    e
                );
                return T::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Checkpoint {} is corrupt ({}), starting empty",
                    self.path.display(),
                    e
                );
                T::default()
            }
        }
    }

    /// Overwrites the checkpoint with `state`
    pub fn save(&self, state: &T) -> Result<(), CheckpointError> {
        let contents = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, contents).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Deletes the checkpoint file if present
    pub fn reset(&self) -> Result<(), CheckpointError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Discarded checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("checkpoint"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
