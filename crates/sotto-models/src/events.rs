//! Model manager progress and result events

use serde::Serialize;

use crate::error::ModelError;

/// Step of a long running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressOperation {
    Downloading,
    VerifyingChecksum,
    Extracting,
    CopyingFiles,
    Deleting,
}

/// Operation that completes or fails as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOperation {
    Download,
    Delete,
}

/// Broadcast by [`ModelManager`](crate::ModelManager), no replay
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelManagerEvent {
    Progress {
        model_id: String,
        operation: ProgressOperation,
        message: String,
        bytes_processed: Option<u64>,
        total_bytes: Option<u64>,
        percentage: Option<u8>,
    },
    Completed {
        model_id: String,
        operation: ModelOperation,
    },
    Error {
        model_id: String,
        operation: ModelOperation,
        message: String,
        #[serde(skip)]
        cause: Option<ModelError>,
    },
}

impl ModelManagerEvent {
    pub fn model_id(&self) -> &str {
        match self {
            ModelManagerEvent::Progress { model_id, .. }
            | ModelManagerEvent::Completed { model_id, .. }
            | ModelManagerEvent::Error { model_id, .. } => model_id,
        }
    }

    pub(crate) fn step(model_id: &str, operation: ProgressOperation, message: impl Into<String>) -> Self {
        ModelManagerEvent::Progress {
            model_id: model_id.to_string(),
            operation,
            message: message.into(),
            bytes_processed: None,
            total_bytes: None,
            percentage: None,
        }
    }
}
