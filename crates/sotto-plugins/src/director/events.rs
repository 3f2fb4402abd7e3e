//! Director event stream

use serde::Serialize;

use crate::error::DirectorError;

/// Stage a pipeline error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Recording,
    Transcription,
    Polishing,
}

/// Progress and outcome of a dictation run
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    RecordingStarted,
    TranscriptionStarted,
    PolishingStarted,
    PipelineCompleted {
        raw_text: String,
        /// `None` when polishing was skipped
        polished_text: Option<String>,
        final_text: String,
    },
    PipelineError {
        stage: PipelineStage,
        error: DirectorError,
    },
    PipelineCancelled,
}

impl DirectorEvent {
    /// Whether this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DirectorEvent::PipelineCompleted { .. }
                | DirectorEvent::PipelineError { .. }
                | DirectorEvent::PipelineCancelled
        )
    }
}
