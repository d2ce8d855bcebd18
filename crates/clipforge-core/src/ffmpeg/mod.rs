//! Transcoding Engine Module
//!
//! Wraps the external FFmpeg/FFprobe binaries behind a declarative request
//! type and a trait, so render stages never build process invocations
//! themselves and tests can script engine behavior.

mod detection;
mod engine;

pub use detection::{detect_system_ffmpeg, FFmpegInfo};
pub use engine::{EngineInput, EngineRequest, FFmpegEngine, TranscodeEngine};

/// Engine-related error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("FFmpeg not found. Install FFmpeg or put it on PATH.")]
    NotFound,

    #[error("Engine execution failed: {0}")]
    Failed(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Process error: {0}")]
    Process(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::NotFound;
        assert!(err.to_string().contains("FFmpeg not found"));

        let err = EngineError::Failed("exit code 1".to_string());
        assert!(err.to_string().contains("exit code 1"));
    }
}
