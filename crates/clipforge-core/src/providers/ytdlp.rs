//! yt-dlp Downloader
//!
//! Fetches source videos and background music through the external `yt-dlp`
//! binary. Old downloads are cleared before each fetch so the directory glob
//! afterwards finds exactly the new file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::Downloader;
use crate::{truncate_diagnostic, ClipError, ClipResult};

/// Downloader backed by the `yt-dlp` binary.
pub struct YtDlpDownloader {
    downloads_dir: PathBuf,
    music_dir: PathBuf,
    /// Playlist the background track is taken from; `None` disables music
    playlist_url: Option<String>,
}

impl YtDlpDownloader {
    pub fn new(downloads_dir: &Path, playlist_url: Option<String>) -> Self {
        Self {
            downloads_dir: downloads_dir.to_path_buf(),
            music_dir: downloads_dir.join("music"),
            playlist_url,
        }
    }

    async fn run_ytdlp(args: &[String]) -> ClipResult<String> {
        let output = tokio::process::Command::new("yt-dlp")
            .args(args)
            .output()
            .await
            .map_err(|e| ClipError::Acquisition(format!("yt-dlp not runnable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipError::Acquisition(format!(
                "yt-dlp failed: {}",
                truncate_diagnostic(&stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn clear_dir(dir: &Path, ext: &str) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ext) {
                let _ = std::fs::remove_file(path);
            }
        }
    }

    fn find_file(dir: &Path, ext: &str) -> Option<PathBuf> {
        std::fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn fetch(&self, url: &str) -> ClipResult<PathBuf> {
        std::fs::create_dir_all(&self.downloads_dir)?;
        Self::clear_dir(&self.downloads_dir, "mp4");

        let template = self
            .downloads_dir
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .to_string();

        tracing::info!("downloading {}", url);
        Self::run_ytdlp(&[
            "--format".to_string(),
            "bestvideo[height<=720]+bestaudio/best[height<=720]".to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--output".to_string(),
            template,
            "--no-playlist".to_string(),
            url.to_string(),
        ])
        .await?;

        Self::find_file(&self.downloads_dir, "mp4")
            .ok_or_else(|| ClipError::Acquisition("downloaded video not found".to_string()))
    }

    async fn fetch_music(&self) -> ClipResult<PathBuf> {
        let playlist = self
            .playlist_url
            .as_deref()
            .ok_or_else(|| ClipError::Acquisition("no music playlist configured".to_string()))?;

        let listing = Self::run_ytdlp(&[
            "--flat-playlist".to_string(),
            "--print".to_string(),
            "url".to_string(),
            playlist.to_string(),
        ])
        .await?;

        // First track, deterministically; the playlist itself provides variety.
        let track_url = listing
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| ClipError::Acquisition("music playlist is empty".to_string()))?
            .to_string();

        std::fs::create_dir_all(&self.music_dir)?;
        Self::clear_dir(&self.music_dir, "mp3");

        let template = self
            .music_dir
            .join("bg_music.%(ext)s")
            .to_string_lossy()
            .to_string();

        tracing::info!("downloading background track");
        Self::run_ytdlp(&[
            "--format".to_string(),
            "bestaudio".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            "0".to_string(),
            "--output".to_string(),
            template,
            "--no-playlist".to_string(),
            track_url,
        ])
        .await?;

        Self::find_file(&self.music_dir, "mp3")
            .ok_or_else(|| ClipError::Acquisition("downloaded music not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_dir_only_touches_matching_extension() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("notes.txt");
        let drop = dir.path().join("old.mp4");
        std::fs::write(&keep, b"x").unwrap();
        std::fs::write(&drop, b"x").unwrap();

        YtDlpDownloader::clear_dir(dir.path(), "mp4");
        assert!(keep.exists());
        assert!(!drop.exists());
    }

    #[test]
    fn test_find_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(YtDlpDownloader::find_file(dir.path(), "mp4").is_none());

        let video = dir.path().join("abc123.mp4");
        std::fs::write(&video, b"x").unwrap();
        assert_eq!(YtDlpDownloader::find_file(dir.path(), "mp4"), Some(video));
    }

    #[tokio::test]
    async fn test_fetch_music_without_playlist_fails_soft() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlpDownloader::new(dir.path(), None);
        assert!(matches!(
            downloader.fetch_music().await,
            Err(ClipError::Acquisition(_))
        ));
    }
}
