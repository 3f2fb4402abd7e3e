//! Bundled resource access for the default model

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use tracing::debug;

/// Source of files shipped alongside the application
pub trait ResourceLoader: Send + Sync {
    /// Open a resource by relative path (e.g. `models/asr/tiny-tokens.txt`)
    fn load(&self, path: &str) -> Option<Box<dyn Read + Send>>;
}

/// Resources laid out under a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryResourceLoader {
    root: PathBuf,
}

impl DirectoryResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn load(&self, path: &str) -> Option<Box<dyn Read + Send>> {
        let full = self.root.join(path);
        match File::open(&full) {
            Ok(file) => Some(Box::new(file)),
            Err(e) => {
                debug!("Resource {} unavailable: {}", full.display(), e);
                None
            }
        }
    }
}

/// In-memory resources, typically filled from `include_bytes!`
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLoader {
    entries: HashMap<String, &'static [u8]>,
}

impl StaticResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, data: &'static [u8]) -> Self {
        self.entries.insert(path.into(), data);
        self
    }
}

impl ResourceLoader for StaticResourceLoader {
    fn load(&self, path: &str) -> Option<Box<dyn Read + Send>> {
        self.entries
            .get(path)
            .map(|data| Box::new(Cursor::new(*data)) as Box<dyn Read + Send>)
    }
}

/// Resource path of a bundled ASR model file
pub fn asr_resource_path(file_name: &str) -> String {
    format!("models/asr/{file_name}")
}
