//! FFmpeg Detection
//!
//! Locates and validates the system FFmpeg/FFprobe binaries.

use std::path::PathBuf;
use std::process::Command;

use super::{EngineError, EngineResult};

/// Information about a detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to the ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to the ffprobe binary
    pub ffprobe_path: PathBuf,
    /// FFmpeg version string
    pub version: String,
}

/// Detects FFmpeg and FFprobe on the system PATH.
pub fn detect_system_ffmpeg() -> EngineResult<FFmpegInfo> {
    let ffmpeg_path = which_binary("ffmpeg")?;
    let ffprobe_path = which_binary("ffprobe")?;
    let version = get_ffmpeg_version(&ffmpeg_path)?;

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

/// Finds a binary in the system PATH using `where` (Windows) or `which`.
fn which_binary(name: &str) -> EngineResult<PathBuf> {
    #[cfg(target_os = "windows")]
    let finder = "where";

    #[cfg(not(target_os = "windows"))]
    let finder = "which";

    let output = Command::new(finder)
        .arg(name)
        .output()
        .map_err(|_| EngineError::NotFound)?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = path_str.lines().next() {
            let trimmed = first_line.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }
    }

    Err(EngineError::NotFound)
}

/// Reads the first line of `ffmpeg -version`.
fn get_ffmpeg_version(ffmpeg_path: &PathBuf) -> EngineResult<String> {
    let output = Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(|_| EngineError::NotFound)?;

    if !output.status.success() {
        return Err(EngineError::NotFound);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("unknown").to_string())
}
