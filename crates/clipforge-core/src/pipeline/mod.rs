//! Clip Pipeline Orchestrator
//!
//! Sequences the per-clip render chain (cut, mix, caption burn, finalize),
//! aggregates outputs, and reports step-level status to a caller-supplied
//! observer.
//!
//! Failure isolation: acquisition problems before any clip work fail the
//! job; cut/mix failures are fatal for their clip only; caption failures
//! degrade through the tiers and never abort anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::captions::{CaptionError, CueBuilder, TimingEstimator};
use crate::config::PipelineConfig;
use crate::ffmpeg::TranscodeEngine;
use crate::providers::{
    ClipSelector, Downloader, MetadataGenerator, SpeechSynthesizer, Transcriber,
};
use crate::render::StageRunner;
use crate::transform::TransformPlanner;
use crate::{ClipBoundary, ClipError, ClipMetadata, ClipResult, ClipSummary, WordTiming};

/// Steps counted before clip processing: download, extract, transcribe, select
const PRELUDE_STEPS: usize = 4;

/// Steps counted per clip: cut, mix, captions, finalize
const CLIP_STEPS: usize = 4;

// =============================================================================
// Progress Observer
// =============================================================================

/// Receives step-level status while a job runs.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, percent: u8, step: &str);
}

/// Observer that discards all updates
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _percent: u8, _step: &str) {}
}

/// Counts completed steps against a fixed total.
///
/// The total is recomputed once the real clip count is known; the registry
/// clamps progress monotonic, so a shrinking total can never move the
/// reported percent backwards.
struct ProgressTracker<'a> {
    observer: &'a dyn ProgressObserver,
    total: usize,
    completed: usize,
}

impl<'a> ProgressTracker<'a> {
    fn new(observer: &'a dyn ProgressObserver, estimated_clips: usize) -> Self {
        Self {
            observer,
            total: PRELUDE_STEPS + estimated_clips.max(1) * CLIP_STEPS,
            completed: 0,
        }
    }

    fn set_clip_count(&mut self, clips: usize) {
        self.total = PRELUDE_STEPS + clips.max(1) * CLIP_STEPS;
    }

    fn advance(&mut self, step: &str) {
        self.completed += 1;
        let percent = (self.completed * 100 / self.total).min(100) as u8;
        tracing::info!("[{:>3}%] {}", percent, step);
        self.observer.on_progress(percent, step);
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// The external services a pipeline run talks to, wired at the entry point.
pub struct Collaborators {
    pub downloader: Arc<dyn Downloader>,
    pub transcriber: Arc<dyn Transcriber>,
    pub selector: Arc<dyn ClipSelector>,
    pub metadata: Arc<dyn MetadataGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Orchestrates one job: acquisition, clip selection, and the per-clip
/// render chain.
pub struct ClipPipeline {
    config: Arc<PipelineConfig>,
    engine: Arc<dyn TranscodeEngine>,
    collaborators: Collaborators,
}

impl ClipPipeline {
    /// Creates a pipeline over an engine and collaborator set
    pub fn new(
        config: Arc<PipelineConfig>,
        engine: Arc<dyn TranscodeEngine>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config,
            engine,
            collaborators,
        }
    }

    /// Runs the full pipeline for one source video.
    ///
    /// Returns descriptors for every produced clip, or the first fatal error
    /// if nothing could be produced.
    pub async fn run(
        &self,
        job_id: &str,
        url: &str,
        video_title: &str,
        observer: &dyn ProgressObserver,
    ) -> ClipResult<Vec<ClipSummary>> {
        let mut tracker = ProgressTracker::new(observer, self.config.num_clips as usize);
        let runner = StageRunner::new(self.engine.clone(), self.config.clone(), job_id)?;

        tracing::info!("[{}] processing {}", job_id, video_title);

        // ---- Acquisition (failures here fail the job) ----
        let video = self.collaborators.downloader.fetch(url).await?;
        tracker.advance("Downloaded video");

        let music = match self.collaborators.downloader.fetch_music().await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("continuing without music: {}", e);
                None
            }
        };

        let audio = runner.extract_audio(&video).await?;
        tracker.advance("Extracted audio");

        let (transcript, _source_words) =
            self.collaborators.transcriber.transcribe(&audio).await?;
        tracker.advance("Transcribed audio");

        // ---- Clip selection ----
        let source_duration = match self.engine.probe_duration(&video).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    "source probe failed: {}; assuming {}s",
                    e,
                    self.config.source_fallback_sec
                );
                self.config.source_fallback_sec
            }
        };

        let boundaries = match self
            .collaborators
            .selector
            .select(&transcript, video_title, source_duration)
            .await
        {
            Ok(clips) if !clips.is_empty() => clips,
            Ok(_) => {
                tracing::info!("selector returned no boundaries, using centered fallback");
                vec![self.fallback_boundary(source_duration, video_title)]
            }
            Err(e @ ClipError::Configuration(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("selection failed ({}), using centered fallback", e);
                vec![self.fallback_boundary(source_duration, video_title)]
            }
        };

        tracker.set_clip_count(boundaries.len());
        tracker.advance(&format!("Selected {} clip(s)", boundaries.len()));

        // ---- Per-clip render chain ----
        let mut summaries = Vec::new();
        let mut first_error: Option<ClipError> = None;

        for boundary in &boundaries {
            match self
                .render_clip(&runner, &video, boundary, music.as_deref(), video_title, &mut tracker)
                .await
            {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    tracing::warn!("clip {} failed: {}", boundary.index, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
            runner.cleanup_clip(boundary.index);
        }

        // ---- End-of-run cleanup ----
        runner.cleanup_run();
        remove_best_effort(&video);
        remove_best_effort(&audio);

        if summaries.is_empty() {
            return Err(
                first_error.unwrap_or_else(|| ClipError::Internal("no clips produced".to_string()))
            );
        }

        tracing::info!("[{}] {} clip(s) ready", job_id, summaries.len());
        Ok(summaries)
    }

    /// Renders one clip through the full stage chain.
    async fn render_clip(
        &self,
        runner: &StageRunner,
        video: &Path,
        boundary: &ClipBoundary,
        music: Option<&Path>,
        video_title: &str,
        tracker: &mut ProgressTracker<'_>,
    ) -> ClipResult<ClipSummary> {
        let index = boundary.index;
        let captions = &self.config.captions;

        // Cut
        let plan = TransformPlanner::plan(
            boundary.duration_sec().max(0.0),
            &self.config.motion,
            &self.config.mix,
        );
        let cut = runner.cut(video, boundary, &plan).await?;
        tracker.advance(&format!("Cut clip {}", index));

        // Narration
        let script = self.narration_script(boundary, video_title).await;
        let narration = runner.narration_path(index);
        let synth_words = self
            .collaborators
            .synthesizer
            .synthesize(&script, &narration)
            .await?;

        // Mix
        let mixed = runner.mix(&cut, &narration, music, index).await?;
        tracker.advance(&format!("Mixed audio for clip {}", index));

        // Captions, best effort through the tiers
        let caption_words = if synth_words.is_empty() {
            TimingEstimator::new(captions).estimate(&script)
        } else {
            synth_words
        };
        let (last_artifact, captioned) = self
            .burn_with_fallback(runner, &mixed, &caption_words, &script, index)
            .await;
        tracker.advance(&format!("Captioned clip {}", index));

        // Finalize
        let output = runner.finalize(&last_artifact, index)?;
        let metadata = self.clip_metadata(boundary, video_title).await;
        tracker.advance(&format!("Finalized clip {}", index));

        Ok(ClipSummary {
            filename: output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: output.to_string_lossy().to_string(),
            title: metadata.title,
            description: metadata.description,
            tags: metadata.tags,
            hook: boundary.hook.clone(),
            captioned,
        })
    }

    /// Attempts the caption tiers in order and returns the best artifact.
    ///
    /// Tier 1 burns cues built from real word timings; tier 2 retries with
    /// evenly spaced windows over the script text; tier 3 ships the mixed
    /// artifact unchanged. Captions never fail the clip.
    async fn burn_with_fallback(
        &self,
        runner: &StageRunner,
        mixed: &Path,
        words: &[WordTiming],
        script: &str,
        index: u32,
    ) -> (PathBuf, bool) {
        let captions = &self.config.captions;
        let builder = CueBuilder::new(captions);

        let tier1 = builder.build(words, captions.group_size, captions.delay_ms);
        match tier1 {
            Ok(cues) => match runner.burn(mixed, &cues, index).await {
                Ok(path) => return (path, true),
                Err(e) => {
                    tracing::warn!("clip {}: timed caption burn failed: {}", index, e);
                }
            },
            Err(e) => {
                tracing::warn!("clip {}: timed cues unavailable: {}", index, e);
            }
        }

        let tier2: Result<_, CaptionError> =
            builder.build_evenly_spaced(script, captions.group_size, captions.delay_ms);
        if let Ok(cues) = tier2 {
            match runner.burn(mixed, &cues, index).await {
                Ok(path) => return (path, true),
                Err(e) => {
                    tracing::warn!("clip {}: evenly spaced caption burn failed: {}", index, e);
                }
            }
        }

        tracing::warn!("clip {}: all caption tiers failed, shipping uncaptioned", index);
        (mixed.to_path_buf(), false)
    }

    /// Produces the narration script, absorbing generator failures.
    async fn narration_script(&self, boundary: &ClipBoundary, video_title: &str) -> String {
        match self
            .collaborators
            .metadata
            .voiceover_script(&boundary.hook, &boundary.title, video_title)
            .await
        {
            Ok(script) if !script.trim().is_empty() => script,
            Ok(_) => fallback_script(video_title),
            Err(e) => {
                tracing::warn!("script generation failed ({}), using template", e);
                fallback_script(video_title)
            }
        }
    }

    /// Produces clip metadata, absorbing generator failures with defaults.
    async fn clip_metadata(&self, boundary: &ClipBoundary, video_title: &str) -> ClipMetadata {
        match self
            .collaborators
            .metadata
            .describe(&boundary.title, &boundary.hook, video_title)
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("metadata generation failed ({}), using defaults", e);
                ClipMetadata::fallback(&boundary.title)
            }
        }
    }

    /// The documented fallback when selection yields nothing: one clip of
    /// the configured maximum length centered in the source, kept clear of
    /// the end margin.
    fn fallback_boundary(&self, source_duration_sec: f64, video_title: &str) -> ClipBoundary {
        let duration = source_duration_sec.max(0.0);
        let start = (duration / 2.0).floor();
        let end = (start + self.config.clip_max_sec)
            .min(duration - self.config.end_margin_sec)
            .floor()
            .max(start + 1.0);

        ClipBoundary {
            index: 1,
            start_sec: start,
            end_sec: end,
            title: format!("Part 1 - {}", video_title),
            hook: format!("Watch part 1 of {}", video_title),
        }
    }
}

fn fallback_script(video_title: &str) -> String {
    format!(
        "You won't believe this moment from {}. Watch till the end!",
        video_title
    )
}

fn remove_best_effort(path: &Path) {
    let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::providers::{HeuristicMetadata, HeuristicSelector, NoopTranscriber};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEngine;

    #[async_trait]
    impl TranscodeEngine for FixedEngine {
        async fn run(
            &self,
            request: &crate::ffmpeg::EngineRequest,
        ) -> crate::ffmpeg::EngineResult<()> {
            std::fs::write(&request.output, b"x").unwrap();
            Ok(())
        }

        async fn probe_duration(&self, _input: &Path) -> crate::ffmpeg::EngineResult<f64> {
            Ok(600.0)
        }
    }

    struct NoDownloader;

    #[async_trait]
    impl Downloader for NoDownloader {
        async fn fetch(&self, _url: &str) -> ClipResult<PathBuf> {
            Err(ClipError::Acquisition("offline".to_string()))
        }
    }

    struct NoSynth;

    #[async_trait]
    impl SpeechSynthesizer for NoSynth {
        async fn synthesize(&self, _text: &str, _output: &Path) -> ClipResult<Vec<WordTiming>> {
            Err(ClipError::Synthesis("offline".to_string()))
        }
    }

    fn pipeline(config: PipelineConfig) -> ClipPipeline {
        ClipPipeline::new(
            Arc::new(config),
            Arc::new(FixedEngine),
            Collaborators {
                downloader: Arc::new(NoDownloader),
                transcriber: Arc::new(NoopTranscriber),
                selector: Arc::new(HeuristicSelector::new(1, 60.0, 5.0)),
                metadata: Arc::new(HeuristicMetadata),
                synthesizer: Arc::new(NoSynth),
            },
        )
    }

    #[test]
    fn test_fallback_boundary_is_centered() {
        let pipeline = pipeline(PipelineConfig::default());
        let boundary = pipeline.fallback_boundary(600.0, "Video");

        assert_eq!(boundary.index, 1);
        assert_eq!(boundary.start_sec, 300.0);
        assert_eq!(boundary.end_sec, 360.0);
    }

    #[test]
    fn test_fallback_boundary_respects_end_margin() {
        let pipeline = pipeline(PipelineConfig::default());
        // 100s source: the margin caps the clip before max length does.
        let boundary = pipeline.fallback_boundary(100.0, "Video");

        assert_eq!(boundary.start_sec, 50.0);
        assert_eq!(boundary.end_sec, 95.0);
    }

    #[test]
    fn test_fallback_boundary_survives_degenerate_duration() {
        let pipeline = pipeline(PipelineConfig::default());
        let boundary = pipeline.fallback_boundary(0.0, "Video");
        assert!(boundary.end_sec > boundary.start_sec);
    }

    #[tokio::test]
    async fn test_download_failure_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.staging_dir = dir.path().join("clips");
        config.output_dir = dir.path().join("output");

        let result = pipeline(config)
            .run("job01", "https://example.com/v", "Video", &NullObserver)
            .await;
        assert!(matches!(result, Err(ClipError::Acquisition(_))));
    }

    #[test]
    fn test_progress_tracker_counts_to_one_hundred() {
        struct Capture(Mutex<Vec<u8>>);
        impl ProgressObserver for Capture {
            fn on_progress(&self, percent: u8, _step: &str) {
                self.0.lock().unwrap().push(percent);
            }
        }

        let capture = Capture(Mutex::new(Vec::new()));
        let mut tracker = ProgressTracker::new(&capture, 1);
        for _ in 0..PRELUDE_STEPS + CLIP_STEPS {
            tracker.advance("step");
        }

        let seen = capture.0.lock().unwrap();
        assert_eq!(*seen.last().unwrap(), 100);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }
}
