//! Model management error types

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sotto_core::ErrorKind;
use thiserror::Error;

/// Model management errors
///
/// `Clone` so the same error can be returned to the caller and carried on a
/// broadcast [`ModelManagerEvent`](crate::ModelManagerEvent).
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// Model not found in the catalog
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Catalog entry has no downloadable archive
    #[error("Model {0} does not have a downloadable archive")]
    NoArchive(String),

    /// Download failed
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Connect, read or total timeout elapsed
    #[error("Download timed out: {0}")]
    Timeout(String),

    /// Verification failed
    #[error("SHA256 checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// Archive did not unpack into a `{model_id}/` directory
    #[error("Expected directory not found in archive: {0}")]
    MissingDirectory(String),

    /// Archive is missing a declared component
    #[error("Required file not found in archive: {model_id}/{file_name}")]
    MissingComponent { model_id: String, file_name: String },

    /// Bundled resource missing
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Archive could not be decompressed or unpacked
    #[error("Failed to extract {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// IO error
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Blocking worker panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ModelError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.as_ref().to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::ModelNotFound(_)
            | ModelError::NoArchive(_)
            | ModelError::ResourceNotFound(_) => ErrorKind::NotFound,
            ModelError::DownloadFailed(_) | ModelError::Timeout(_) => ErrorKind::TransportFailure,
            ModelError::ChecksumMismatch { .. } => ErrorKind::IntegrityFailure,
            ModelError::MissingDirectory(_)
            | ModelError::MissingComponent { .. }
            | ModelError::Extraction { .. } => ErrorKind::StructuralFailure,
            ModelError::Io { .. } | ModelError::Task(_) => ErrorKind::ResourceFailure,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout(err.to_string())
        } else {
            ModelError::DownloadFailed(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for ModelError {
    fn from(err: tokio::task::JoinError) -> Self {
        ModelError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ModelError::ModelNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            ModelError::ChecksumMismatch {
                file: "a".into(),
                expected: "1".into(),
                actual: "2".into(),
            }
            .kind(),
            ErrorKind::IntegrityFailure
        );
        assert_eq!(
            ModelError::MissingComponent {
                model_id: "m".into(),
                file_name: "f".into(),
            }
            .kind(),
            ErrorKind::StructuralFailure
        );
        let io = ModelError::io("/tmp/x", std::io::Error::other("boom"));
        assert_eq!(io.kind(), ErrorKind::ResourceFailure);
        assert!(io.to_string().contains("/tmp/x"));
    }
}
