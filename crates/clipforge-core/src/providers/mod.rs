//! External Collaborators
//!
//! Traits for the services the pipeline orchestrates: media acquisition,
//! transcription, clip selection, metadata text generation, and speech
//! synthesis. The pipeline only feeds these collaborators parameters and
//! reacts to their failures; it never reimplements them.
//!
//! Provider choice is deterministic: the entry point wires the Gemini
//! implementations when an API key is configured, the heuristic ones
//! otherwise. No randomized backend selection.

mod gemini;
mod heuristic;
mod tts;
mod ytdlp;

pub use gemini::GeminiClient;
pub use heuristic::{HeuristicMetadata, HeuristicSelector, NoopTranscriber};
pub use tts::EdgeTtsSynthesizer;
pub use ytdlp::YtDlpDownloader;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{ClipBoundary, ClipError, ClipMetadata, ClipResult, WordTiming};

// =============================================================================
// Downloader
// =============================================================================

/// Fetches remote media to local files.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads the source video. Failure aborts the job.
    async fn fetch(&self, url: &str) -> ClipResult<PathBuf>;

    /// Downloads a background music track. Failure is tolerated; the job
    /// proceeds without music.
    async fn fetch_music(&self) -> ClipResult<PathBuf> {
        Err(ClipError::Acquisition(
            "no music source configured".to_string(),
        ))
    }
}

// =============================================================================
// Transcriber
// =============================================================================

/// Speech-to-text over an audio file.
///
/// `word_timings` may legitimately be empty; the pipeline then estimates
/// timings from text instead.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> ClipResult<(String, Vec<WordTiming>)>;
}

// =============================================================================
// Clip Selector
// =============================================================================

/// Picks clip regions out of the source.
///
/// Returning an empty list is not an error; the pipeline substitutes one
/// fallback boundary centered in the source.
#[async_trait]
pub trait ClipSelector: Send + Sync {
    async fn select(
        &self,
        transcript: &str,
        video_title: &str,
        source_duration_sec: f64,
    ) -> ClipResult<Vec<ClipBoundary>>;
}

// =============================================================================
// Metadata Generator
// =============================================================================

/// Generates narration scripts and SEO text for a clip.
///
/// Both operations are best-effort: the pipeline absorbs failures with
/// static defaults.
#[async_trait]
pub trait MetadataGenerator: Send + Sync {
    /// Writes a short narration script for the clip.
    async fn voiceover_script(
        &self,
        clip_hook: &str,
        clip_title: &str,
        video_title: &str,
    ) -> ClipResult<String>;

    /// Produces upload title, description, and tags.
    async fn describe(
        &self,
        clip_title: &str,
        clip_hook: &str,
        video_title: &str,
    ) -> ClipResult<ClipMetadata>;
}

// =============================================================================
// Speech Synthesizer
// =============================================================================

/// Text-to-speech for the narration track.
///
/// Returns per-word timings when the backend provides them; an empty vector
/// sends the pipeline down the estimator path.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> ClipResult<Vec<WordTiming>>;
}
