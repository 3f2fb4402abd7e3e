//! sotto-core - shared types for the sotto dictation pipeline
//!
//! Languages, audio formats, data directory resolution and the settings store
//! used by the model manager, the plugin registry and the director.

pub mod audio;
pub mod error;
pub mod language;
pub mod paths;
pub mod settings;

pub use audio::{pcm16_to_f32, AudioFormat, AudioInfo};
pub use error::ErrorKind;
pub use language::{Language, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};
pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsError, SettingsStore};

/// Human readable application name
pub const APPLICATION_NAME: &str = "Sotto";

/// Short name used for directories and file prefixes
pub const APPLICATION_SHORT: &str = "sotto";
