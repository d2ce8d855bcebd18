//! Engine Requests and the FFmpeg Runner
//!
//! [`EngineRequest`] is a declarative description of one transcoding
//! invocation: inputs, filter graph, codec parameters, output. The engine
//! either succeeds or reports a diagnostic string; it is deliberately
//! ignorant of clip semantics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{EngineError, EngineResult, FFmpegInfo};
use crate::truncate_diagnostic;

// =============================================================================
// Engine Request
// =============================================================================

/// One input to a transcoding invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineInput {
    /// Input file path
    pub path: PathBuf,
    /// Seek position applied before the input is opened (fast seek)
    pub seek_sec: Option<f64>,
}

impl EngineInput {
    /// Creates a plain input
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            seek_sec: None,
        }
    }

    /// Creates an input with a fast-seek position
    pub fn with_seek(path: &Path, seek_sec: f64) -> Self {
        Self {
            path: path.to_path_buf(),
            seek_sec: Some(seek_sec),
        }
    }
}

/// Declarative description of one transcoding invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineRequest {
    /// Input files, in graph order
    pub inputs: Vec<EngineInput>,
    /// Bound on the output duration (`-t`)
    pub limit_duration_sec: Option<f64>,
    /// Simple video filter chain (`-vf`)
    pub video_filter: Option<String>,
    /// Multi-input filter graph (`-filter_complex`)
    pub filter_complex: Option<String>,
    /// Stream mappings (`-map`)
    pub maps: Vec<String>,
    /// Video codec
    pub video_codec: Option<String>,
    /// CRF value
    pub crf: Option<u8>,
    /// Encoder preset
    pub preset: Option<String>,
    /// Audio codec ("copy" passes through)
    pub audio_codec: Option<String>,
    /// Audio bitrate
    pub audio_bitrate: Option<String>,
    /// Stop at the shortest input (`-shortest`)
    pub shortest: bool,
    /// Raw passthrough arguments placed before the output path
    pub extra_args: Vec<String>,
    /// Output file path
    pub output: PathBuf,
}

impl EngineRequest {
    /// Creates a request for a single input and output
    pub fn new(input: EngineInput, output: &Path) -> Self {
        Self {
            inputs: vec![input],
            output: output.to_path_buf(),
            ..Default::default()
        }
    }

    /// Renders the full ffmpeg argument list for this request.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in &self.inputs {
            if let Some(seek) = input.seek_sec {
                args.push("-ss".to_string());
                args.push(format!("{:.3}", seek));
            }
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        if let Some(limit) = self.limit_duration_sec {
            args.push("-t".to_string());
            args.push(format!("{:.3}", limit));
        }

        if let Some(vf) = &self.video_filter {
            args.push("-vf".to_string());
            args.push(vf.clone());
        }

        if let Some(fc) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(fc.clone());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        if let Some(codec) = &self.video_codec {
            args.push("-c:v".to_string());
            args.push(codec.clone());
        }
        if let Some(crf) = self.crf {
            args.push("-crf".to_string());
            args.push(crf.to_string());
        }
        if let Some(preset) = &self.preset {
            args.push("-preset".to_string());
            args.push(preset.clone());
        }
        if let Some(codec) = &self.audio_codec {
            args.push("-c:a".to_string());
            args.push(codec.clone());
        }
        if let Some(bitrate) = &self.audio_bitrate {
            args.push("-b:a".to_string());
            args.push(bitrate.clone());
        }
        if self.shortest {
            args.push("-shortest".to_string());
        }

        args.extend(self.extra_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

// =============================================================================
// Engine Trait
// =============================================================================

/// The external transcoding engine.
///
/// Implementations execute a declarative request and either succeed or
/// report a failure diagnostic. The production implementation shells out to
/// FFmpeg; tests use scripted fakes.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Executes a request. The output file exists on success.
    async fn run(&self, request: &EngineRequest) -> EngineResult<()>;

    /// Returns the duration of a media file in seconds.
    async fn probe_duration(&self, input: &Path) -> EngineResult<f64>;
}

// =============================================================================
// FFmpeg Engine
// =============================================================================

/// FFmpeg-backed engine implementation
#[derive(Clone)]
pub struct FFmpegEngine {
    info: Arc<FFmpegInfo>,
}

impl FFmpegEngine {
    /// Creates an engine from a detected FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    /// Returns the detected installation info
    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }
}

#[async_trait]
impl TranscodeEngine for FFmpegEngine {
    async fn run(&self, request: &EngineRequest) -> EngineResult<()> {
        for input in &request.inputs {
            if !input.path.exists() {
                return Err(EngineError::Failed(format!(
                    "Input file does not exist: {}",
                    input.path.display()
                )));
            }
        }

        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args = request.to_args();
        tracing::debug!("ffmpeg {}", args.join(" "));

        let output = tokio::process::Command::new(&self.info.ffmpeg_path)
            .args(&args)
            .output()
            .await
            .map_err(EngineError::Process)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(truncate_diagnostic(&stderr)));
        }

        Ok(())
    }

    async fn probe_duration(&self, input: &Path) -> EngineResult<f64> {
        if !input.exists() {
            return Err(EngineError::Probe(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let output = tokio::process::Command::new(&self.info.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                &input.to_string_lossy(),
            ])
            .output()
            .await
            .map_err(EngineError::Process)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Probe(truncate_diagnostic(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| EngineError::Probe(format!("Unparseable duration: {}", stdout.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_args_single_input() {
        let request = EngineRequest {
            inputs: vec![EngineInput::with_seek(Path::new("in.mp4"), 30.0)],
            limit_duration_sec: Some(45.0),
            video_filter: Some("crop=ih*9/16:ih".to_string()),
            video_codec: Some("libx264".to_string()),
            crf: Some(23),
            preset: Some("faster".to_string()),
            audio_codec: Some("aac".to_string()),
            audio_bitrate: Some("192k".to_string()),
            output: PathBuf::from("out.mp4"),
            ..Default::default()
        };

        let args = request.to_args();
        assert_eq!(
            args,
            vec![
                "-y", "-ss", "30.000", "-i", "in.mp4", "-t", "45.000", "-vf", "crop=ih*9/16:ih",
                "-c:v", "libx264", "-crf", "23", "-preset", "faster", "-c:a", "aac", "-b:a",
                "192k", "out.mp4",
            ]
        );
    }

    #[test]
    fn test_request_args_filter_complex_and_maps() {
        let request = EngineRequest {
            inputs: vec![
                EngineInput::new(Path::new("clip.mp4")),
                EngineInput::new(Path::new("voice.mp3")),
            ],
            filter_complex: Some("[0:a][1:a]amix=inputs=2[aout]".to_string()),
            maps: vec!["0:v".to_string(), "[aout]".to_string()],
            shortest: true,
            output: PathBuf::from("mixed.mp4"),
            ..Default::default()
        };

        let args = request.to_args();
        let joined = args.join(" ");
        assert!(joined.contains("-i clip.mp4 -i voice.mp3"));
        assert!(joined.contains("-filter_complex [0:a][1:a]amix=inputs=2[aout]"));
        assert!(joined.contains("-map 0:v -map [aout]"));
        assert!(joined.ends_with("-shortest mixed.mp4"));
    }

    #[test]
    fn test_request_args_extra_passthrough() {
        let request = EngineRequest {
            inputs: vec![EngineInput::new(Path::new("video.mp4"))],
            extra_args: vec![
                "-vn".to_string(),
                "-acodec".to_string(),
                "pcm_s16le".to_string(),
            ],
            output: PathBuf::from("audio.wav"),
            ..Default::default()
        };

        let args = request.to_args();
        assert_eq!(
            args,
            vec!["-y", "-i", "video.mp4", "-vn", "-acodec", "pcm_s16le", "audio.wav"]
        );
    }
}
