//! Capability contracts for recorder, ASR, LLM and director plugins

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sotto_core::AudioInfo;
use tokio::sync::broadcast;

use crate::director::DirectorEvent;
use crate::error::PluginError;
use crate::plugin::Plugin;

/// Captured audio, raw PCM in the recorder's [`AudioInfo`] format
#[derive(Debug, Clone, Default)]
pub struct RecorderResponse {
    pub audio_data: Vec<u8>,
}

/// Audio capture. Calls are blocking; the director runs them off the async runtime.
pub trait RecorderPlugin: Plugin {
    fn is_currently_recording(&self) -> bool;

    fn start_recording(&self) -> Result<(), PluginError>;

    /// Stop capturing and hand over the audio.
    ///
    /// Must return an error, not panic, when not recording.
    fn stop_recording(&self) -> Result<RecorderResponse, PluginError>;

    /// Format of the bytes returned by `stop_recording`
    fn audio_info(&self) -> AudioInfo {
        AudioInfo::default()
    }
}

/// Samples to transcribe, already normalized to `[-1.0, 1.0]`
#[derive(Debug, Clone)]
pub struct AsrRequest {
    pub samples: Vec<f32>,
    pub audio_info: AudioInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsrResponse {
    pub text: String,
}

/// Speech recognition
#[async_trait]
pub trait AsrPlugin: Plugin {
    async fn transcribe(&self, request: AsrRequest) -> Result<AsrResponse, PluginError>;
}

/// Prompt sent to a language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
}

/// Text generation
#[async_trait]
pub trait LlmPlugin: Plugin {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, PluginError>;

    /// Models the provider can serve
    async fn list_models(&self) -> Result<Vec<String>, PluginError>;
}

/// Sequences record, transcribe and polish. Failures surface as events, never as return values.
#[async_trait]
pub trait DirectorPlugin: Plugin {
    async fn start(&self);

    async fn stop(&self);

    async fn cancel(&self);

    fn subscribe(&self) -> broadcast::Receiver<DirectorEvent>;
}
