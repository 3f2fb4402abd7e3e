//! Director options and their settings mapping

use serde::{Deserialize, Serialize};
use sotto_core::settings::keys;
use sotto_core::{Language, SettingsStore, DEFAULT_LANGUAGE};
use std::time::Duration;

use super::prompt::{default_vocabulary, DEFAULT_CONTEXT};

/// Offline Whisper decoders truncate audio past 30 seconds
pub const DEFAULT_MAX_RECORDING_DURATION_MS: u64 = 30_000;

/// Polishing must answer quickly or the dictation feels stuck
pub const DEFAULT_LLM_TIMEOUT_MS: u64 = 5_000;

/// Director configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorOptions {
    /// Run transcriptions through the active LLM
    pub enable_text_processing: bool,
    /// ISO 639-1 code of the dictation language
    pub language: String,
    pub custom_context: String,
    pub custom_vocabulary: Vec<String>,
    /// Recording stops on its own after this long, 0 disables the timer
    pub max_recording_duration_ms: u64,
    pub llm_timeout_ms: u64,
}

impl Default for DirectorOptions {
    fn default() -> Self {
        Self {
            enable_text_processing: true,
            language: DEFAULT_LANGUAGE.iso2.to_string(),
            custom_context: DEFAULT_CONTEXT.to_string(),
            custom_vocabulary: default_vocabulary(),
            max_recording_duration_ms: DEFAULT_MAX_RECORDING_DURATION_MS,
            llm_timeout_ms: DEFAULT_LLM_TIMEOUT_MS,
        }
    }
}

impl DirectorOptions {
    /// Read options from a settings store, falling back to defaults per key
    pub fn from_settings(settings: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        if !settings.is_available() {
            return defaults;
        }

        let text_processing = settings.get_string(keys::DIRECTOR_TEXT_PROCESSING, "");
        Self {
            enable_text_processing: text_processing
                .parse()
                .unwrap_or(defaults.enable_text_processing),
            language: settings.get_string(keys::DIRECTOR_LANGUAGE, &defaults.language),
            custom_context: settings.get_string(keys::DIRECTOR_CUSTOM_CONTEXT, &defaults.custom_context),
            custom_vocabulary: settings
                .get_string_array(keys::DIRECTOR_CUSTOM_VOCABULARY, &defaults.custom_vocabulary),
            ..defaults
        }
    }

    /// Resolved language, English if the code is unknown
    pub fn language(&self) -> Language {
        Language::from_iso2(&self.language).unwrap_or_default()
    }

    pub fn max_recording_duration(&self) -> Option<Duration> {
        (self.max_recording_duration_ms > 0).then(|| Duration::from_millis(self.max_recording_duration_ms))
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }
}
