//! Installed model layout on disk

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::VoiceModel;
use crate::error::ModelError;
use crate::fs::{FileSystemOperations, PathProvider};
use crate::resources::{asr_resource_path, ResourceLoader};

/// Reads and writes `{data_dir}/models/{model_id}` directories
#[derive(Clone)]
pub struct ModelFileManager {
    fs: Arc<dyn FileSystemOperations>,
    paths: Arc<dyn PathProvider>,
}

impl ModelFileManager {
    pub fn new(fs: Arc<dyn FileSystemOperations>, paths: Arc<dyn PathProvider>) -> Self {
        Self { fs, paths }
    }

    /// Install directory of a model. Does not create it.
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.paths.models_dir().join(model_id)
    }

    /// True when every component is present and non-empty
    pub fn is_model_downloaded(&self, model: &VoiceModel) -> bool {
        let dir = self.model_path(&model.id);
        !model.components.is_empty()
            && model
                .components
                .iter()
                .all(|c| self.fs.file_len(&dir.join(&c.file_name)).unwrap_or(0) > 0)
    }

    /// Copy components from `{extraction_root}/{model_id}/` into the install directory.
    ///
    /// All components are checked before anything is copied.
    pub fn copy_model_files(&self, extraction_root: &Path, model: &VoiceModel) -> Result<(), ModelError> {
        let source_dir = extraction_root.join(&model.id);
        if !self.fs.is_dir(&source_dir) {
            return Err(ModelError::MissingDirectory(model.id.clone()));
        }

        for component in &model.components {
            if !self.fs.exists(&source_dir.join(&component.file_name)) {
                return Err(ModelError::MissingComponent {
                    model_id: model.id.clone(),
                    file_name: component.file_name.clone(),
                });
            }
        }

        let target_dir = self.model_path(&model.id);
        self.install_into(&target_dir, || {
            for component in &model.components {
                let copied = self.fs.copy_file(
                    &source_dir.join(&component.file_name),
                    &target_dir.join(&component.file_name),
                )?;
                debug!("Copied {} ({} bytes)", component.file_name, copied);
            }
            Ok(())
        })?;

        info!("Installed {} into {}", model.id, target_dir.display());
        Ok(())
    }

    /// Install a model from bundled resources at `models/asr/{file_name}`
    pub fn extract_from_resources(&self, model: &VoiceModel, loader: &dyn ResourceLoader) -> Result<(), ModelError> {
        let mut sources = Vec::with_capacity(model.components.len());
        for component in &model.components {
            let resource = asr_resource_path(&component.file_name);
            let reader = loader
                .load(&resource)
                .ok_or(ModelError::ResourceNotFound(resource))?;
            sources.push((component, reader));
        }

        let target_dir = self.model_path(&model.id);
        self.install_into(&target_dir, || {
            for (component, mut reader) in sources {
                let target = target_dir.join(&component.file_name);
                let mut file = std::fs::File::create(&target).map_err(|e| ModelError::io(&target, e))?;
                let written = io::copy(&mut reader, &mut file).map_err(|e| ModelError::io(&target, e))?;
                debug!("Extracted {} ({} bytes)", component.file_name, written);
            }
            Ok(())
        })?;

        info!("Installed bundled model {}", model.id);
        Ok(())
    }

    /// Run `write` against the install directory, creating it first.
    ///
    /// A directory created here is removed again when `write` fails.
    fn install_into(
        &self,
        target_dir: &Path,
        write: impl FnOnce() -> Result<(), ModelError>,
    ) -> Result<(), ModelError> {
        let created = !self.fs.exists(target_dir);
        self.fs.create_dir_all(target_dir)?;

        let result = write();
        if result.is_err() && created {
            if let Err(e) = self.fs.remove_dir_all(target_dir) {
                warn!("Failed to remove partial install {}: {}", target_dir.display(), e);
            }
        }
        result
    }

    /// Remove a model's install directory. Returns false if it did not exist.
    pub fn delete_model(&self, model_id: &str) -> Result<bool, ModelError> {
        let dir = self.model_path(model_id);
        if !self.fs.exists(&dir) {
            return Ok(false);
        }
        self.fs.remove_dir_all(&dir)?;
        info!("Deleted model {}", model_id);
        Ok(true)
    }

    /// Total size of all files under a model's install directory
    pub fn installed_size(&self, model_id: &str) -> u64 {
        WalkDir::new(self.model_path(model_id))
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    }
}

/// Model ids become directory names; reject anything that could escape the models root
pub(crate) fn is_safe_model_id(model_id: &str) -> bool {
    !model_id.is_empty()
        && model_id != "."
        && model_id != ".."
        && !model_id.contains(['/', '\\'])
}
