//! Heuristic Providers
//!
//! Deterministic, offline implementations of the selection and metadata
//! collaborators. These carry the pipeline when no AI backend is configured
//! and double as the documented fallback tier.

use std::path::Path;

use async_trait::async_trait;

use super::{ClipSelector, MetadataGenerator, Transcriber};
use crate::{ClipBoundary, ClipMetadata, ClipResult, WordTiming};

// =============================================================================
// Heuristic Clip Selector
// =============================================================================

/// Picks clips at equidistant points through the source.
///
/// The first and last 10% of the video are avoided, clips are capped at the
/// configured maximum length, and nothing is taken from the final safety
/// margin. Bounds are truncated to whole seconds, matching the precision of
/// textual `MM:SS` timestamps used by AI selectors.
pub struct HeuristicSelector {
    pub num_clips: u32,
    pub clip_max_sec: f64,
    pub end_margin_sec: f64,
}

impl HeuristicSelector {
    pub fn new(num_clips: u32, clip_max_sec: f64, end_margin_sec: f64) -> Self {
        Self {
            num_clips,
            clip_max_sec,
            end_margin_sec,
        }
    }
}

#[async_trait]
impl ClipSelector for HeuristicSelector {
    async fn select(
        &self,
        _transcript: &str,
        video_title: &str,
        source_duration_sec: f64,
    ) -> ClipResult<Vec<ClipBoundary>> {
        tracing::info!(
            "selecting {} clip(s) heuristically over {:.0}s",
            self.num_clips,
            source_duration_sec
        );

        let duration = source_duration_sec.max(0.0);
        let start_buffer = duration * 0.1;
        let end_buffer = duration * 0.9;
        let available = end_buffer - start_buffer;

        let points: Vec<f64> = if available < self.clip_max_sec {
            // Too short to spread clips out; take one from the middle.
            vec![duration / 2.0]
        } else {
            let step = available / (self.num_clips as f64 + 1.0);
            (0..self.num_clips)
                .map(|i| start_buffer + step * (i as f64 + 1.0))
                .collect()
        };

        let clips = points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let start = point.floor();
                let end = (start + self.clip_max_sec)
                    .min(duration - self.end_margin_sec)
                    .floor();

                ClipBoundary {
                    index: i as u32 + 1,
                    start_sec: start,
                    end_sec: end,
                    title: format!("Part {} - {}", i + 1, video_title),
                    hook: format!("Watch part {} of {}", i + 1, video_title),
                }
            })
            .collect();

        Ok(clips)
    }
}

// =============================================================================
// Heuristic Metadata
// =============================================================================

/// Template-based scripts and metadata.
///
/// The template is picked by a deterministic hash of the clip title, so the
/// same clip always gets the same script.
pub struct HeuristicMetadata;

const SCRIPT_TEMPLATES: [&str; 3] = [
    "You won't believe what happens in this part of {video}. Watch till the end!",
    "Check out this crazy moment from {video}. Subscribe for more daily clips!",
    "This is one of the best moments from {video}. What do you think? Let us know in the comments.",
];

fn template_index(key: &str) -> usize {
    let sum: usize = key.bytes().map(|b| b as usize).sum();
    sum % SCRIPT_TEMPLATES.len()
}

#[async_trait]
impl MetadataGenerator for HeuristicMetadata {
    async fn voiceover_script(
        &self,
        _clip_hook: &str,
        clip_title: &str,
        video_title: &str,
    ) -> ClipResult<String> {
        let template = SCRIPT_TEMPLATES[template_index(clip_title)];
        Ok(template.replace("{video}", video_title))
    }

    async fn describe(
        &self,
        clip_title: &str,
        _clip_hook: &str,
        video_title: &str,
    ) -> ClipResult<ClipMetadata> {
        let mut metadata = ClipMetadata::fallback(clip_title);
        metadata.title = format!("CRAZY MOMENT in {} #shorts", video_title);
        metadata.description = format!(
            "Best moments from {}!\n\nSubscribe for more daily clips.\n\n#shorts #viral",
            video_title
        );
        Ok(metadata)
    }
}

// =============================================================================
// Noop Transcriber
// =============================================================================

/// Transcriber that skips speech-to-text entirely.
///
/// Used when no transcription backend is configured; the selection and
/// caption paths all have text-free fallbacks.
pub struct NoopTranscriber;

#[async_trait]
impl Transcriber for NoopTranscriber {
    async fn transcribe(&self, audio: &Path) -> ClipResult<(String, Vec<WordTiming>)> {
        tracing::info!("skipping transcription for {}", audio.display());
        Ok((String::new(), Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_selector_spreads_clips() {
        let selector = HeuristicSelector::new(3, 60.0, 5.0);
        let clips = selector.select("", "My Video", 1000.0).await.unwrap();

        assert_eq!(clips.len(), 3);
        for (i, clip) in clips.iter().enumerate() {
            assert_eq!(clip.index, i as u32 + 1);
            assert!(clip.start_sec >= 100.0);
            assert!(clip.end_sec <= 995.0);
            assert!(clip.duration_sec() <= 60.0);
            assert!(clip.title.contains("My Video"));
        }
        // Equidistant: later clips start later.
        assert!(clips[0].start_sec < clips[1].start_sec);
        assert!(clips[1].start_sec < clips[2].start_sec);
    }

    #[tokio::test]
    async fn test_selector_short_video_takes_middle() {
        let selector = HeuristicSelector::new(3, 60.0, 5.0);
        let clips = selector.select("", "Short", 70.0).await.unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].start_sec, 35.0);
        assert_eq!(clips[0].end_sec, 65.0);
    }

    #[tokio::test]
    async fn test_selector_600s_single_clip() {
        // 600s source with one clip lands mid-point, capped by the margin.
        let selector = HeuristicSelector::new(1, 60.0, 5.0);
        let clips = selector.select("", "T", 600.0).await.unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].start_sec, 300.0);
        assert_eq!(clips[0].end_sec, 360.0);
    }

    #[tokio::test]
    async fn test_script_is_deterministic() {
        let meta = HeuristicMetadata;
        let a = meta.voiceover_script("", "Part 1", "Video").await.unwrap();
        let b = meta.voiceover_script("", "Part 1", "Video").await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Video"));
    }

    #[tokio::test]
    async fn test_describe_fills_all_fields() {
        let meta = HeuristicMetadata;
        let m = meta.describe("Part 1", "hook", "Video").await.unwrap();
        assert!(m.title.contains("#shorts"));
        assert!(m.description.contains("Video"));
        assert!(!m.tags.is_empty());
    }

    #[tokio::test]
    async fn test_noop_transcriber_returns_empty() {
        let (text, words) = NoopTranscriber
            .transcribe(Path::new("audio.wav"))
            .await
            .unwrap();
        assert!(text.is_empty());
        assert!(words.is_empty());
    }
}
