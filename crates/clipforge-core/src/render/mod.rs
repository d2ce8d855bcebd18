//! Render Stage Runner
//!
//! Translates transform plans and caption cues into concrete engine
//! requests, executes them, and manages the intermediate-artifact chain.
//!
//! Every stage writes to a fresh path namespaced by job id and clip index,
//! so retried stages and future concurrent jobs can never collide. Cleanup
//! is scoped per clip and idempotent.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::captions::write_srt;
use crate::config::PipelineConfig;
use crate::ffmpeg::{EngineInput, EngineRequest, TranscodeEngine};
use crate::transform::{escape_filter_value, MixPlan, TransformPlan};
use crate::{CaptionCue, ClipBoundary, ClipError, ClipResult};

// =============================================================================
// Stage Kind
// =============================================================================

/// The render stages of one clip, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageKind {
    /// Extract and reframe the clip region
    Cut,
    /// Mix original audio, narration, and music
    Mix,
    /// Burn caption cues into the video
    Burn,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Cut => write!(f, "cut"),
            StageKind::Mix => write!(f, "mix"),
            StageKind::Burn => write!(f, "caption burn"),
        }
    }
}

// =============================================================================
// Stage Runner
// =============================================================================

/// Executes the per-clip render stages against the transcoding engine.
pub struct StageRunner {
    engine: Arc<dyn TranscodeEngine>,
    config: Arc<PipelineConfig>,
    /// Per-job staging directory for intermediate artifacts
    staging_dir: PathBuf,
}

impl StageRunner {
    /// Creates a runner for one job, materializing its staging and output
    /// directories.
    pub fn new(
        engine: Arc<dyn TranscodeEngine>,
        config: Arc<PipelineConfig>,
        job_id: &str,
    ) -> ClipResult<Self> {
        let staging_dir = config.staging_dir.join(job_id);
        std::fs::create_dir_all(&staging_dir)?;
        std::fs::create_dir_all(&config.output_dir)?;

        Ok(Self {
            engine,
            config,
            staging_dir,
        })
    }

    /// Returns the staging path for one artifact kind of one clip.
    fn staging_path(&self, kind: &str, clip_index: u32, ext: &str) -> PathBuf {
        self.staging_dir.join(format!("{}_{}.{}", kind, clip_index, ext))
    }

    /// Returns the path the narration track for a clip should be written to.
    pub fn narration_path(&self, clip_index: u32) -> PathBuf {
        self.staging_path("narration", clip_index, "mp3")
    }

    /// Extracts a mono 16 kHz WAV from the source for transcription.
    pub async fn extract_audio(&self, video: &Path) -> ClipResult<PathBuf> {
        let output = self.staging_dir.join("source_audio.wav");
        let request = EngineRequest {
            inputs: vec![EngineInput::new(video)],
            extra_args: vec![
                "-vn".to_string(),
                "-acodec".to_string(),
                "pcm_s16le".to_string(),
                "-ar".to_string(),
                "16000".to_string(),
                "-ac".to_string(),
                "1".to_string(),
            ],
            output: output.clone(),
            ..Default::default()
        };

        self.engine
            .run(&request)
            .await
            .map_err(|e| ClipError::Acquisition(format!("audio extraction failed: {}", e)))?;

        Ok(output)
    }

    /// Cut stage: extracts the clip region, reframes to 9:16, and applies
    /// the planned zoom trajectory and fade windows.
    pub async fn cut(
        &self,
        source: &Path,
        boundary: &ClipBoundary,
        plan: &TransformPlan,
    ) -> ClipResult<PathBuf> {
        let output = self.staging_path("cut", boundary.index, "mp4");
        let encode = &self.config.encode;

        let request = EngineRequest {
            inputs: vec![EngineInput::with_seek(source, boundary.start_sec)],
            limit_duration_sec: Some(boundary.duration_sec().max(0.0)),
            video_filter: Some(plan.video_filter(encode)),
            video_codec: Some(encode.video_codec.clone()),
            crf: Some(encode.crf),
            preset: Some(encode.preset.clone()),
            audio_codec: Some("aac".to_string()),
            audio_bitrate: Some(encode.audio_bitrate.clone()),
            output: output.clone(),
            ..Default::default()
        };

        tracing::info!(
            "clip {}: cutting {:.1}s to {:.1}s",
            boundary.index,
            boundary.start_sec,
            boundary.end_sec
        );

        self.engine
            .run(&request)
            .await
            .map_err(|e| ClipError::render(StageKind::Cut, &e.to_string()))?;

        Ok(output)
    }

    /// Mix stage: layers attenuated original audio, delayed narration, and
    /// optional fading music under the clip video.
    ///
    /// The mix windows depend on the rendered clip's real duration, so the
    /// artifact is probed first; a probe failure falls back to a fixed
    /// duration so planning can always proceed.
    pub async fn mix(
        &self,
        clip: &Path,
        narration: &Path,
        music: Option<&Path>,
        clip_index: u32,
    ) -> ClipResult<PathBuf> {
        let duration = match self.engine.probe_duration(clip).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    "probe failed for {}: {}; assuming {}s",
                    clip.display(),
                    e,
                    self.config.probe_fallback_sec
                );
                self.config.probe_fallback_sec
            }
        };

        let mix_plan = MixPlan::new(duration, &self.config.mix);
        let with_music = music.is_some();

        let mut inputs = vec![EngineInput::new(clip), EngineInput::new(narration)];
        if let Some(music_path) = music {
            inputs.push(EngineInput::new(music_path));
        }

        let output = self.staging_path("mixed", clip_index, "mp4");
        let encode = &self.config.encode;

        let request = EngineRequest {
            inputs,
            filter_complex: Some(mix_plan.filter_graph(with_music)),
            maps: vec!["0:v".to_string(), "[aout]".to_string()],
            video_codec: Some(encode.video_codec.clone()),
            crf: Some(encode.crf),
            preset: Some(encode.preset.clone()),
            audio_codec: Some("aac".to_string()),
            audio_bitrate: Some(encode.audio_bitrate.clone()),
            shortest: true,
            output: output.clone(),
            ..Default::default()
        };

        tracing::info!(
            "clip {}: mixing audio ({:.1}s, music: {})",
            clip_index,
            duration,
            with_music
        );

        self.engine
            .run(&request)
            .await
            .map_err(|e| ClipError::render(StageKind::Mix, &e.to_string()))?;

        // The raw cut has been consumed; drop it.
        remove_if_present(&self.staging_path("cut", clip_index, "mp4"));

        Ok(output)
    }

    /// Burn stage: writes the cues as SRT and burns them with the configured
    /// style. Audio is passed through untouched.
    pub async fn burn(
        &self,
        mixed: &Path,
        cues: &[CaptionCue],
        clip_index: u32,
    ) -> ClipResult<PathBuf> {
        let srt_path = self.staging_path("sub", clip_index, "srt");
        write_srt(cues, &srt_path)?;

        let output = self.staging_path("captioned", clip_index, "mp4");
        let encode = &self.config.encode;
        let style = &self.config.captions.style;

        let filter = format!(
            "subtitles='{}':force_style='{}'",
            escape_filter_value(&srt_path.to_string_lossy()),
            style.force_style()
        );

        let request = EngineRequest {
            inputs: vec![EngineInput::new(mixed)],
            video_filter: Some(filter),
            video_codec: Some(encode.video_codec.clone()),
            crf: Some(encode.crf),
            preset: Some(encode.preset.clone()),
            audio_codec: Some("copy".to_string()),
            output: output.clone(),
            ..Default::default()
        };

        tracing::info!("clip {}: burning {} cue(s)", clip_index, cues.len());

        self.engine
            .run(&request)
            .await
            .map_err(|e| ClipError::render(StageKind::Burn, &e.to_string()))?;

        Ok(output)
    }

    /// Finalize: moves the last good artifact into the durable output
    /// location under a deterministic name.
    pub fn finalize(&self, last_artifact: &Path, clip_index: u32) -> ClipResult<PathBuf> {
        let output = self
            .config
            .output_dir
            .join(format!("final_clip_{}.mp4", clip_index));

        if std::fs::rename(last_artifact, &output).is_err() {
            // Rename fails across filesystems; fall back to copy + delete.
            std::fs::copy(last_artifact, &output)?;
            remove_if_present(last_artifact);
        }

        Ok(output)
    }

    /// Removes this clip's intermediate artifacts.
    ///
    /// Scoped to the clip index so an in-flight neighbor is never touched,
    /// and idempotent: already-absent files are not an error.
    pub fn cleanup_clip(&self, clip_index: u32) {
        for kind in ["cut", "mixed", "captioned", "narration", "sub"] {
            for ext in ["mp4", "mp3", "srt"] {
                remove_if_present(&self.staging_path(kind, clip_index, ext));
            }
        }
    }

    /// Removes the whole job staging directory. Best effort.
    pub fn cleanup_run(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.staging_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("staging cleanup failed: {}", e);
            }
        }
    }
}

/// Deletes a file if it exists; absence is not an error.
fn remove_if_present(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("could not remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::EngineResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Engine fake that records requests and fabricates output files.
    struct RecordingEngine {
        requests: Mutex<Vec<EngineRequest>>,
        probe_result: Option<f64>,
    }

    impl RecordingEngine {
        fn new(probe_result: Option<f64>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                probe_result,
            }
        }
    }

    #[async_trait]
    impl TranscodeEngine for RecordingEngine {
        async fn run(&self, request: &EngineRequest) -> EngineResult<()> {
            std::fs::write(&request.output, b"artifact").unwrap();
            self.requests.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn probe_duration(&self, _input: &Path) -> EngineResult<f64> {
            self.probe_result
                .ok_or_else(|| crate::ffmpeg::EngineError::Probe("scripted failure".to_string()))
        }
    }

    fn runner_with(engine: Arc<RecordingEngine>) -> (StageRunner, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.staging_dir = dir.path().join("clips");
        config.output_dir = dir.path().join("output");
        let runner = StageRunner::new(engine, Arc::new(config), "job01").unwrap();
        (runner, dir)
    }

    fn boundary() -> ClipBoundary {
        ClipBoundary {
            index: 1,
            start_sec: 30.0,
            end_sec: 75.0,
            title: "Part 1".to_string(),
            hook: "hook".to_string(),
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    #[tokio::test]
    async fn test_cut_builds_seek_and_filter() {
        let engine = Arc::new(RecordingEngine::new(Some(45.0)));
        let (runner, dir) = runner_with(engine.clone());

        let source = dir.path().join("source.mp4");
        touch(&source);

        let plan = crate::transform::TransformPlanner::plan(
            45.0,
            &runner.config.motion,
            &runner.config.mix,
        );
        let out = runner.cut(&source, &boundary(), &plan).await.unwrap();
        assert!(out.ends_with("cut_1.mp4"));

        let requests = engine.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.inputs[0].seek_sec, Some(30.0));
        assert_eq!(request.limit_duration_sec, Some(45.0));
        let vf = request.video_filter.as_ref().unwrap();
        assert!(vf.contains("crop=ih*9/16:ih"));
        assert!(vf.contains("zoompan"));
    }

    #[tokio::test]
    async fn test_mix_probe_fallback_and_cut_cleanup() {
        // Probe is scripted to fail: the mix must fall back to 60s windows.
        let engine = Arc::new(RecordingEngine::new(None));
        let (runner, dir) = runner_with(engine.clone());

        let clip = runner.staging_path("cut", 1, "mp4");
        touch(&clip);
        let narration = dir.path().join("narration.mp3");
        touch(&narration);

        let out = runner.mix(&clip, &narration, None, 1).await.unwrap();
        assert!(out.ends_with("mixed_1.mp4"));
        // Consumed input is gone, output remains.
        assert!(!clip.exists());
        assert!(out.exists());

        let requests = engine.requests.lock().unwrap();
        let graph = requests[0].filter_complex.as_ref().unwrap();
        assert!(graph.contains("amix=inputs=2"));
        assert!(requests[0].shortest);
    }

    #[tokio::test]
    async fn test_mix_with_music_uses_three_inputs() {
        let engine = Arc::new(RecordingEngine::new(Some(60.0)));
        let (runner, dir) = runner_with(engine.clone());

        let clip = dir.path().join("cut.mp4");
        let narration = dir.path().join("voice.mp3");
        let music = dir.path().join("music.mp3");
        touch(&clip);
        touch(&narration);
        touch(&music);

        runner.mix(&clip, &narration, Some(&music), 2).await.unwrap();

        let requests = engine.requests.lock().unwrap();
        assert_eq!(requests[0].inputs.len(), 3);
        let graph = requests[0].filter_complex.as_ref().unwrap();
        assert!(graph.contains("amix=inputs=3"));
        assert!(graph.contains("afade=t=out:st=55.00"));
    }

    #[tokio::test]
    async fn test_burn_writes_srt_and_styles_filter() {
        let engine = Arc::new(RecordingEngine::new(Some(45.0)));
        let (runner, dir) = runner_with(engine.clone());

        let mixed = dir.path().join("mixed.mp4");
        touch(&mixed);
        let cues = vec![CaptionCue {
            text: "HELLO".to_string(),
            start_ms: 0,
            end_ms: 900,
        }];

        let out = runner.burn(&mixed, &cues, 1).await.unwrap();
        assert!(out.ends_with("captioned_1.mp4"));

        let srt = runner.staging_path("sub", 1, "srt");
        assert!(std::fs::read_to_string(&srt).unwrap().contains("HELLO"));

        let requests = engine.requests.lock().unwrap();
        let vf = requests[0].video_filter.as_ref().unwrap();
        assert!(vf.starts_with("subtitles='"));
        assert!(vf.contains("force_style='FontName="));
        assert_eq!(requests[0].audio_codec.as_deref(), Some("copy"));
    }

    #[tokio::test]
    async fn test_finalize_moves_into_output() {
        let engine = Arc::new(RecordingEngine::new(Some(45.0)));
        let (runner, _dir) = runner_with(engine);

        let artifact = runner.staging_path("captioned", 3, "mp4");
        touch(&artifact);

        let out = runner.finalize(&artifact, 3).unwrap();
        assert!(out.ends_with("final_clip_3.mp4"));
        assert!(out.exists());
        assert!(!artifact.exists());
    }

    #[tokio::test]
    async fn test_cleanup_is_scoped_and_idempotent() {
        let engine = Arc::new(RecordingEngine::new(Some(45.0)));
        let (runner, _dir) = runner_with(engine);

        let mine = runner.staging_path("mixed", 1, "mp4");
        let neighbor = runner.staging_path("mixed", 2, "mp4");
        touch(&mine);
        touch(&neighbor);

        runner.cleanup_clip(1);
        assert!(!mine.exists());
        assert!(neighbor.exists());

        // Running again on absent files is fine.
        runner.cleanup_clip(1);
        runner.cleanup_run();
        runner.cleanup_run();
        assert!(!neighbor.exists());
    }
}
