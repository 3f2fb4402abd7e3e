//! Key/value settings persistence
//!
//! The pipeline only needs strings and string lists, so the store keeps its
//! interface to exactly that.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Well-known setting keys
pub mod keys {
    pub const DIRECTOR_LANGUAGE: &str = "director.language";
    pub const DIRECTOR_CUSTOM_CONTEXT: &str = "director.custom_context";
    pub const DIRECTOR_CUSTOM_VOCABULARY: &str = "director.custom_vocabulary";
    pub const DIRECTOR_TEXT_PROCESSING: &str = "director.text_processing";
    pub const LLM_PROVIDER: &str = "llm.provider";
    pub const LLM_MODEL: &str = "llm.model";
    pub const LLM_BASE_URL: &str = "llm.base_url";
}

/// Settings errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read or written
    #[error("Settings IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not a JSON object
    #[error("Malformed settings file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Store lock was poisoned by a panicking writer
    #[error("Settings store is unavailable")]
    Unavailable,
}

/// Persistent key/value settings
pub trait SettingsStore: Send + Sync {
    /// Whether the backing storage can be used
    fn is_available(&self) -> bool;

    /// Read a string, falling back to `default` when missing or mistyped
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Write a string
    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Read a list of strings, falling back to `default` when missing or mistyped
    fn get_string_array(&self, key: &str, default: &[String]) -> Vec<String>;

    /// Write a list of strings
    fn set_string_array(&self, key: &str, value: &[String]) -> Result<(), SettingsError>;
}

fn value_as_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn value_as_string_array(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Settings stored as a flat JSON object on disk, written through on every set
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonSettingsStore {
    /// Open the store at `path`; a missing file starts out empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(SettingsError::Malformed {
                        path,
                        message: "expected a JSON object".to_string(),
                    })
                }
                Err(e) => {
                    return Err(SettingsError::Malformed {
                        path,
                        message: e.to_string(),
                    })
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, starting empty", path.display());
                Map::new()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set_value(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.values.lock().map_err(|_| SettingsError::Unavailable)?;
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(values).map_err(|e| SettingsError::Malformed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        // Write then rename so a crash never leaves a truncated file behind
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(io_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn is_available(&self) -> bool {
        self.values.lock().is_ok()
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.lock() {
            Ok(values) => value_as_string(values.get(key)).unwrap_or_else(|| default.to_string()),
            Err(_) => {
                warn!("Settings store poisoned, using default for {}", key);
                default.to_string()
            }
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.set_value(key, Value::String(value.to_string()))
    }

    fn get_string_array(&self, key: &str, default: &[String]) -> Vec<String> {
        match self.values.lock() {
            Ok(values) => value_as_string_array(values.get(key)).unwrap_or_else(|| default.to_vec()),
            Err(_) => {
                warn!("Settings store poisoned, using default for {}", key);
                default.to_vec()
            }
        }
    }

    fn set_string_array(&self, key: &str, value: &[String]) -> Result<(), SettingsError> {
        let items = value.iter().cloned().map(Value::String).collect();
        self.set_value(key, Value::Array(items))
    }
}

/// Volatile settings, for tests and for running without a data directory
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn is_available(&self) -> bool {
        true
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .ok()
            .and_then(|values| value_as_string(values.get(key)))
            .unwrap_or_else(|| default.to_string())
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .lock()
            .map_err(|_| SettingsError::Unavailable)?
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    fn get_string_array(&self, key: &str, default: &[String]) -> Vec<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| value_as_string_array(values.get(key)))
            .unwrap_or_else(|| default.to_vec())
    }

    fn set_string_array(&self, key: &str, value: &[String]) -> Result<(), SettingsError> {
        let items = value.iter().cloned().map(Value::String).collect();
        self.values
            .lock()
            .map_err(|_| SettingsError::Unavailable)?
            .insert(key.to_string(), Value::Array(items));
        Ok(())
    }
}
