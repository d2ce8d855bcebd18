//! ClipForge Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use crate::render::StageKind;

/// Maximum length of an engine diagnostic carried inside an error.
pub const MAX_DIAGNOSTIC_LEN: usize = 500;

/// Core engine error types
#[derive(Error, Debug)]
pub enum ClipError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Acquisition Errors
    // =========================================================================
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    // =========================================================================
    // Render Errors
    // =========================================================================
    #[error("{stage} stage failed: {diagnostic}")]
    Render {
        stage: StageKind,
        diagnostic: String,
    },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Clip selection rejected: {0}")]
    SelectionRejected(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Provider request failed: {0}")]
    Http(String),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("Another job is already processing")]
    AlreadyProcessing,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type ClipResult<T> = Result<T, ClipError>;

impl ClipError {
    /// Builds a render error from an engine diagnostic, keeping only the
    /// trailing portion so error payloads stay bounded.
    pub fn render(stage: StageKind, diagnostic: &str) -> Self {
        Self::Render {
            stage,
            diagnostic: truncate_diagnostic(diagnostic),
        }
    }
}

/// Keeps the last [`MAX_DIAGNOSTIC_LEN`] bytes of an engine diagnostic.
///
/// FFmpeg writes its actual failure reason at the end of stderr, after pages
/// of banner and stream info, so the tail is the useful part.
pub fn truncate_diagnostic(text: &str) -> String {
    if text.len() <= MAX_DIAGNOSTIC_LEN {
        return text.to_string();
    }
    let mut start = text.len() - MAX_DIAGNOSTIC_LEN;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
