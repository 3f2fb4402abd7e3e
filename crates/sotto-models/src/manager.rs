//! Model download and install manager

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::archive::ArchiveExtractor;
use crate::catalog::{BuiltinCatalog, ModelCatalog, VoiceModel};
use crate::checksum::ChecksumVerifier;
use crate::downloader::{DownloadProgress, HttpTransport, ModelDownloader, Transport};
use crate::error::ModelError;
use crate::events::{ModelManagerEvent, ModelOperation, ProgressOperation};
use crate::files::{is_safe_model_id, ModelFileManager};
use crate::fs::{DefaultPathProvider, FileSystemOperations, PathProvider, StdFileSystem};
use crate::resources::ResourceLoader;

const EVENT_CAPACITY: usize = 1024;

/// Catalog entry with its install state
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model: VoiceModel,
    pub downloaded: bool,
    pub path: PathBuf,
}

/// Downloads, verifies, extracts and installs voice models
pub struct ModelManager<T = HttpTransport> {
    catalog: Arc<dyn ModelCatalog>,
    fs: Arc<dyn FileSystemOperations>,
    paths: Arc<dyn PathProvider>,
    resources: Arc<dyn ResourceLoader>,
    files: ModelFileManager,
    downloader: ModelDownloader<T>,
    verifier: ChecksumVerifier,
    extractor: ArchiveExtractor,
    events: broadcast::Sender<ModelManagerEvent>,
}

impl ModelManager<HttpTransport> {
    /// Create a manager over the built-in catalog and the platform data directory
    pub fn new(resources: Arc<dyn ResourceLoader>) -> Result<Self, ModelError> {
        Ok(Self::with_components(
            Arc::new(BuiltinCatalog),
            Arc::new(StdFileSystem),
            Arc::new(DefaultPathProvider),
            resources,
            HttpTransport::new()?,
        ))
    }
}

impl<T: Transport + Sync> ModelManager<T> {
    pub fn with_components(
        catalog: Arc<dyn ModelCatalog>,
        fs: Arc<dyn FileSystemOperations>,
        paths: Arc<dyn PathProvider>,
        resources: Arc<dyn ResourceLoader>,
        transport: T,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            files: ModelFileManager::new(fs.clone(), paths.clone()),
            catalog,
            fs,
            paths,
            resources,
            downloader: ModelDownloader::new(transport),
            verifier: ChecksumVerifier,
            extractor: ArchiveExtractor,
            events,
        }
    }

    /// Receive events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ModelManagerEvent> {
        self.events.subscribe()
    }

    pub fn catalog(&self) -> &dyn ModelCatalog {
        self.catalog.as_ref()
    }

    /// Install directory of a model
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.files.model_path(model_id)
    }

    /// Check if a model is installed. Unknown ids are never installed.
    pub async fn is_model_downloaded(&self, model_id: &str) -> bool {
        let Some(model) = self.catalog.get_model(model_id) else {
            return false;
        };
        let files = self.files.clone();
        blocking(move || Ok(files.is_model_downloaded(&model)))
            .await
            .unwrap_or(false)
    }

    /// All catalog entries with their install state
    pub async fn list_models(&self) -> Vec<ModelStatus> {
        let models = self.catalog.all_models();
        let files = self.files.clone();
        let listed = blocking(move || {
            Ok(models
                .into_iter()
                .map(|model| ModelStatus {
                    downloaded: files.is_model_downloaded(&model),
                    path: files.model_path(&model.id),
                    model,
                })
                .collect::<Vec<_>>())
        })
        .await;

        match listed {
            Ok(statuses) => statuses,
            Err(e) => {
                error!("Failed to list models: {}", e);
                Vec::new()
            }
        }
    }

    /// Bytes used on disk by an installed model, 0 if absent
    pub async fn installed_size(&self, model_id: &str) -> u64 {
        if !is_safe_model_id(model_id) {
            return 0;
        }
        let files = self.files.clone();
        let model_id = model_id.to_string();
        tokio::task::spawn_blocking(move || files.installed_size(&model_id))
            .await
            .unwrap_or(0)
    }

    /// Download, verify, extract and install a model.
    ///
    /// Emits `Completed(Download)` on success (also when already installed)
    /// and `Error(Download)` carrying the returned error on failure.
    pub async fn download_model(&self, model_id: &str) -> Result<(), ModelError> {
        let result = self.run_download(model_id).await;
        match &result {
            Ok(()) => self.emit(ModelManagerEvent::Completed {
                model_id: model_id.to_string(),
                operation: ModelOperation::Download,
            }),
            Err(e) => {
                error!("Download of {} failed: {}", model_id, e);
                self.emit(ModelManagerEvent::Error {
                    model_id: model_id.to_string(),
                    operation: ModelOperation::Download,
                    message: e.to_string(),
                    cause: Some(e.clone()),
                });
            }
        }
        result
    }

    /// Install the bundled default model without network access
    pub async fn extract_default_model(&self) -> Result<(), ModelError> {
        let model_id = self.catalog.default_model_id().to_string();
        let model = self
            .catalog
            .get_model(&model_id)
            .ok_or_else(|| ModelError::ModelNotFound(model_id.clone()))?;

        if self.files.is_model_downloaded(&model) {
            debug!("Default model {} already installed", model_id);
            return Ok(());
        }

        info!("Installing default model {} from resources", model_id);
        let files = self.files.clone();
        let resources = self.resources.clone();
        blocking(move || files.extract_from_resources(&model, resources.as_ref())).await
    }

    /// Remove an installed model. A missing install directory still completes.
    pub async fn delete_model(&self, model_id: &str) -> Result<(), ModelError> {
        self.emit(ModelManagerEvent::step(
            model_id,
            ProgressOperation::Deleting,
            format!("Deleting {model_id}"),
        ));

        let result = if is_safe_model_id(model_id) {
            let files = self.files.clone();
            let id = model_id.to_string();
            blocking(move || files.delete_model(&id)).await.map(|_| ())
        } else {
            Err(ModelError::ModelNotFound(model_id.to_string()))
        };

        match &result {
            Ok(()) => self.emit(ModelManagerEvent::Completed {
                model_id: model_id.to_string(),
                operation: ModelOperation::Delete,
            }),
            Err(e) => {
                error!("Delete of {} failed: {}", model_id, e);
                self.emit(ModelManagerEvent::Error {
                    model_id: model_id.to_string(),
                    operation: ModelOperation::Delete,
                    message: e.to_string(),
                    cause: Some(e.clone()),
                });
            }
        }
        result
    }

    async fn run_download(&self, model_id: &str) -> Result<(), ModelError> {
        let model = self
            .catalog
            .get_model(model_id)
            .ok_or_else(|| ModelError::ModelNotFound(model_id.to_string()))?;

        if self.files.is_model_downloaded(&model) {
            info!("Model {} already downloaded", model_id);
            return Ok(());
        }

        let archive = model
            .archive_file
            .clone()
            .ok_or_else(|| ModelError::NoArchive(model_id.to_string()))?;
        let (Some(url), Some(sha256)) = (archive.remote_url.clone(), archive.sha256.clone()) else {
            return Err(ModelError::NoArchive(model_id.to_string()));
        };

        let tmp_root = self.paths.tmp_dir();
        let fs = self.fs.clone();
        let prefix = format!("{model_id}-");
        // Dropped with the future if the download is abandoned, which removes it
        let temp_dir = blocking(move || {
            fs.create_dir_all(&tmp_root)?;
            tempfile::Builder::new()
                .prefix(&prefix)
                .tempdir_in(&tmp_root)
                .map_err(|e| ModelError::io(&tmp_root, e))
        })
        .await?;
        debug!("Using temp dir {}", temp_dir.path().display());

        let archive_path = temp_dir.path().join(&archive.file_name);
        let result = self
            .install_from_archive(&model, &url, &sha256, temp_dir.path(), &archive_path)
            .await;

        let temp_path = temp_dir.path().to_path_buf();
        match tokio::task::spawn_blocking(move || temp_dir.close()).await {
            Ok(Ok(())) => debug!("Removed temp dir {}", temp_path.display()),
            Ok(Err(e)) => warn!("Failed to remove temp dir {}: {}", temp_path.display(), e),
            Err(e) => warn!("Temp dir cleanup task failed: {}", e),
        }

        result
    }

    async fn install_from_archive(
        &self,
        model: &VoiceModel,
        url: &str,
        sha256: &str,
        temp_dir: &Path,
        archive_path: &Path,
    ) -> Result<(), ModelError> {
        let model_id = model.id.as_str();

        self.emit(ModelManagerEvent::step(
            model_id,
            ProgressOperation::Downloading,
            format!("Downloading {}", model.display_name),
        ));
        let events = self.events.clone();
        let progress_id = model_id.to_string();
        self.downloader
            .download(url, archive_path, move |progress: DownloadProgress| {
                let _ = events.send(ModelManagerEvent::Progress {
                    model_id: progress_id.clone(),
                    operation: ProgressOperation::Downloading,
                    message: match progress.percentage {
                        Some(pct) => format!("Downloading {pct}%"),
                        None => format!("Downloaded {} bytes", progress.bytes_downloaded),
                    },
                    bytes_processed: Some(progress.bytes_downloaded),
                    total_bytes: progress.total_bytes,
                    percentage: progress.percentage,
                });
            })
            .await?;

        self.emit(ModelManagerEvent::step(
            model_id,
            ProgressOperation::VerifyingChecksum,
            "Verifying checksum",
        ));
        let verifier = self.verifier;
        let path = archive_path.to_path_buf();
        let expected = sha256.to_string();
        blocking(move || verifier.verify_sha256(&path, &expected)).await?;

        self.emit(ModelManagerEvent::step(
            model_id,
            ProgressOperation::Extracting,
            "Extracting archive",
        ));
        let extractor = self.extractor;
        let path = archive_path.to_path_buf();
        let dest = temp_dir.to_path_buf();
        blocking(move || extractor.extract_tar_bz2(&path, &dest)).await?;

        self.emit(ModelManagerEvent::step(
            model_id,
            ProgressOperation::CopyingFiles,
            "Copying model files",
        ));
        let files = self.files.clone();
        let root = temp_dir.to_path_buf();
        let model = model.clone();
        blocking(move || files.copy_model_files(&root, &model)).await?;

        info!("Model {} installed", model_id);
        Ok(())
    }

    fn emit(&self, event: ModelManagerEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

async fn blocking<R, F>(f: F) -> Result<R, ModelError>
where
    F: FnOnce() -> Result<R, ModelError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
