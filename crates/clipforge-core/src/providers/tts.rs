//! Edge TTS Synthesizer
//!
//! Generates the narration track through the external `edge-tts` tool. The
//! backend does not report per-word timings, so this implementation returns
//! an empty timing list and the pipeline estimates timings from the script
//! text instead.

use std::path::Path;

use async_trait::async_trait;

use super::SpeechSynthesizer;
use crate::{truncate_diagnostic, ClipError, ClipResult, WordTiming};

/// Speech synthesizer backed by the `edge-tts` binary.
pub struct EdgeTtsSynthesizer {
    voice: String,
}

impl EdgeTtsSynthesizer {
    pub fn new(voice: &str) -> Self {
        Self {
            voice: voice.to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> ClipResult<Vec<WordTiming>> {
        if text.trim().is_empty() {
            return Err(ClipError::Synthesis("empty narration script".to_string()));
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("synthesizing narration to {}", output.display());

        let result = tokio::process::Command::new("edge-tts")
            .args([
                "--voice",
                &self.voice,
                // Slightly slower and louder for clarity over the mix.
                "--rate=-5%",
                "--volume=+10%",
                "--text",
                text,
                "--write-media",
                &output.to_string_lossy(),
            ])
            .output()
            .await
            .map_err(|e| ClipError::Synthesis(format!("edge-tts not runnable: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ClipError::Synthesis(truncate_diagnostic(&stderr)));
        }

        // edge-tts provides no word-level timings.
        Ok(Vec::new())
    }
}
