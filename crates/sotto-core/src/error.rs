//! Error classification shared by every sotto crate

use serde::{Deserialize, Serialize};

/// Coarse failure category.
///
/// Each crate keeps its own error enum; `kind()` on those enums maps them onto
/// this set so callers can react without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown model or plugin id
    NotFound,
    /// Checksum mismatch
    IntegrityFailure,
    /// Archive is missing the expected directory or files
    StructuralFailure,
    /// Network failure or timeout
    TransportFailure,
    /// Operation invoked in the wrong lifecycle state
    StateFailure,
    /// Filesystem I/O failure
    ResourceFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::IntegrityFailure => "integrity_failure",
            ErrorKind::StructuralFailure => "structural_failure",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::StateFailure => "state_failure",
            ErrorKind::ResourceFailure => "resource_failure",
        };
        write!(f, "{}", name)
    }
}
