//! Streaming SHA256 verification

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ModelError;

/// Read buffer used while hashing
pub const BUFFER_SIZE: usize = 8192;

/// Hashes downloaded archives without loading them into memory
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the lowercase hex SHA256 of a file
    pub fn compute_sha256(&self, path: &Path) -> Result<String, ModelError> {
        let mut file = File::open(path).map_err(|e| ModelError::io(path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            let read = file.read(&mut buffer).map_err(|e| ModelError::io(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Compare a file's hash against `expected`, ignoring case
    pub fn verify_sha256(&self, path: &Path, expected: &str) -> Result<(), ModelError> {
        let actual = self.compute_sha256(path)?;
        let expected = expected.to_lowercase();
        if actual != expected {
            return Err(ModelError::ChecksumMismatch {
                file: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                expected,
                actual,
            });
        }
        debug!("Checksum verified for {}", path.display());
        Ok(())
    }
}
