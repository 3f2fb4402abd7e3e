//! File system and path abstractions
//!
//! The model manager only touches the disk through these traits so tests can
//! point it at a scratch directory.

use std::path::{Path, PathBuf};

use crate::error::ModelError;

/// Blocking file system primitives used by the model manager
pub trait FileSystemOperations: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<(), ModelError>;

    fn remove_dir_all(&self, path: &Path) -> Result<(), ModelError>;

    /// Copy `from` to `to`, replacing any existing file
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, ModelError>;

    /// File length in bytes, `None` if the file is missing
    fn file_len(&self, path: &Path) -> Option<u64>;
}

/// [`FileSystemOperations`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystemOperations for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::create_dir_all(path).map_err(|e| ModelError::io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), ModelError> {
        std::fs::remove_dir_all(path).map_err(|e| ModelError::io(path, e))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, ModelError> {
        std::fs::copy(from, to).map_err(|e| ModelError::io(from, e))
    }

    fn file_len(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }
}

/// Where models and scratch files live
pub trait PathProvider: Send + Sync {
    /// Root data directory, models go under `{data_dir}/models`
    fn data_dir(&self) -> PathBuf;

    /// Scratch root for downloads in progress
    fn tmp_dir(&self) -> PathBuf;

    fn models_dir(&self) -> PathBuf {
        self.data_dir().join("models")
    }
}

/// Environment-resolved directories from [`sotto_core::paths`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathProvider;

impl PathProvider for DefaultPathProvider {
    fn data_dir(&self) -> PathBuf {
        sotto_core::paths::data_dir()
    }

    fn tmp_dir(&self) -> PathBuf {
        sotto_core::paths::tmp_dir()
    }
}

/// Paths rooted at an explicit directory
#[derive(Debug, Clone)]
pub struct FixedPathProvider {
    root: PathBuf,
}

impl FixedPathProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathProvider for FixedPathProvider {
    fn data_dir(&self) -> PathBuf {
        self.root.clone()
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }
}
