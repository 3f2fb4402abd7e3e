//! tar.bz2 extraction

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bzip2::read::BzDecoder;
use tracing::info;

use crate::error::ModelError;

/// Unpacks downloaded model archives
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Decompress and unpack `archive` into `dest_dir`
    pub fn extract_tar_bz2(&self, archive: &Path, dest_dir: &Path) -> Result<(), ModelError> {
        info!("Extracting {} to {}", archive.display(), dest_dir.display());

        let file = File::open(archive).map_err(|e| ModelError::io(archive, e))?;
        let decoder = BzDecoder::new(BufReader::new(file));
        let mut tar = tar::Archive::new(decoder);
        tar.set_preserve_permissions(false);

        std::fs::create_dir_all(dest_dir).map_err(|e| ModelError::io(dest_dir, e))?;
        tar.unpack(dest_dir).map_err(|e| ModelError::Extraction {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })
    }
}
