//! Dictation director

pub mod events;
pub mod options;
pub mod pipeline;
pub mod prompt;

pub use events::{DirectorEvent, PipelineStage};
pub use options::{DirectorOptions, DEFAULT_LLM_TIMEOUT_MS, DEFAULT_MAX_RECORDING_DURATION_MS};
pub use pipeline::DirectorPipeline;
pub use prompt::{build_polishing_prompt, default_vocabulary, DEFAULT_CONTEXT};
