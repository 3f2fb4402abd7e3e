//! Voice model download and install management for sotto
//!
//! Models are described by a static catalog, downloaded as tar.bz2 archives,
//! verified against a SHA256, unpacked into a private temp directory and
//! copied into `{data_dir}/models/{model_id}`.

pub mod archive;
pub mod catalog;
pub mod checksum;
pub mod downloader;
pub mod error;
pub mod events;
pub mod files;
pub mod fs;
pub mod manager;
pub mod resources;

pub use archive::ArchiveExtractor;
pub use catalog::{
    BuiltinCatalog, ModelCatalog, ModelProvider, StaticCatalog, VoiceModel, VoiceModelFile,
    DEFAULT_MODEL_ID, VOICE_MODELS,
};
pub use checksum::ChecksumVerifier;
pub use downloader::{DownloadProgress, HttpTransport, LocalTransport, ModelDownloader, Transport, TransportResponse};
pub use error::ModelError;
pub use events::{ModelManagerEvent, ModelOperation, ProgressOperation};
pub use files::ModelFileManager;
pub use fs::{DefaultPathProvider, FileSystemOperations, FixedPathProvider, PathProvider, StdFileSystem};
pub use manager::{ModelManager, ModelStatus};
pub use resources::{DirectoryResourceLoader, ResourceLoader, StaticResourceLoader};
