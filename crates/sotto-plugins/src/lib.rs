//! Plugin registry and dictation director for sotto
//!
//! Recorder, ASR and LLM providers are plugins registered with a
//! [`PluginRegistry`]. The [`DirectorPipeline`] resolves the active ones when
//! a run starts and reports progress as [`DirectorEvent`]s.

pub mod contracts;
pub mod director;
pub mod error;
pub mod plugin;
pub mod registry;

pub use contracts::{
    AsrPlugin, AsrRequest, AsrResponse, DirectorPlugin, LlmPlugin, LlmRequest, LlmResponse,
    RecorderPlugin, RecorderResponse,
};
pub use director::{
    build_polishing_prompt, DirectorEvent, DirectorOptions, DirectorPipeline, PipelineStage,
};
pub use error::{DirectorError, PluginError};
pub use plugin::{parse_options, Lifecycle, Plugin, PluginCategory, PluginState};
pub use registry::{PluginHandle, PluginRegistry, SharedRegistry};
