//! Plugin and director error types

use sotto_core::ErrorKind;
use thiserror::Error;

use crate::plugin::{PluginCategory, PluginState};

/// Errors raised by plugins and the registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    /// No plugin with this id is registered for the category
    #[error("No {category} plugin registered with id {id}")]
    NotFound { category: PluginCategory, id: String },

    /// Lifecycle transition not allowed from the current state
    #[error("Plugin {id} cannot {action} while {state}")]
    InvalidState {
        id: String,
        action: &'static str,
        state: PluginState,
    },

    /// Options value could not be applied
    #[error("Invalid options for {id}: {message}")]
    InvalidOptions { id: String, message: String },

    /// Audio capture failed
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// Speech recognition failed
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Text generation failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Remote service could not be reached
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Remote call timed out
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl PluginError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PluginError::NotFound { .. } => ErrorKind::NotFound,
            PluginError::InvalidState { .. } => ErrorKind::StateFailure,
            PluginError::InvalidOptions { .. } => ErrorKind::StructuralFailure,
            PluginError::Unavailable(_) | PluginError::Timeout(_) => ErrorKind::TransportFailure,
            PluginError::Recorder(_) | PluginError::Transcription(_) | PluginError::Generation(_) => {
                ErrorKind::ResourceFailure
            }
        }
    }
}

/// Errors reported on [`DirectorEvent::PipelineError`](crate::DirectorEvent)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectorError {
    /// `stop()` without a run in flight
    #[error("Not recording")]
    NotRecording,

    /// Recognizer returned blank text
    #[error("Transcription is empty")]
    EmptyTranscription,

    /// Required plugin category has no active plugin
    #[error("No active {0} plugin")]
    NoActivePlugin(PluginCategory),

    /// Registry was dropped while the director still runs
    #[error("Plugin registry is no longer available")]
    RegistryUnavailable,

    /// Language model did not answer within the configured timeout
    #[error("Polishing timed out after {0} ms")]
    PolishingTimeout(u64),

    /// Blocking worker panicked
    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl DirectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectorError::NotRecording
            | DirectorError::EmptyTranscription
            | DirectorError::NoActivePlugin(_)
            | DirectorError::RegistryUnavailable => ErrorKind::StateFailure,
            DirectorError::PolishingTimeout(_) => ErrorKind::TransportFailure,
            DirectorError::Task(_) => ErrorKind::ResourceFailure,
            DirectorError::Plugin(e) => e.kind(),
        }
    }
}
