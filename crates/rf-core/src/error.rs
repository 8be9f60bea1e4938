//! Error types for ReelForge editing

use thiserror::Error;

/// Core error type
///
/// Returned from command constructors and configuration I/O. Command
/// `execute`/`undo` never fail; see the command docs for how stale
/// references are handled.
#[derive(Error, Debug)]
pub enum RfError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Automation point not found: {0}")]
    PointNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(u64),

    #[error("Section not found: {0}")]
    SectionNotFound(u64),

    #[error("Send not found: index {0}")]
    SendNotFound(usize),

    #[error("Empty selection: {0}")]
    EmptySelection(&'static str),

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type RfResult<T> = Result<T, RfError>;

/// Reject NaN and infinite inputs with a descriptive error.
pub fn ensure_finite(name: &str, value: f64) -> RfResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RfError::InvalidParam(format!("{name} must be finite, got {value}")))
    }
}
