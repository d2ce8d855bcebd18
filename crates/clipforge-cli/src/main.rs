//! ClipForge CLI
//!
//! Headless front end for the clip rendering pipeline: wires the external
//! collaborators from configuration, submits one job to the worker, and
//! polls its record until the job reaches a terminal state.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use clipforge_core::config::{PipelineConfig, SubtitleStyle};
use clipforge_core::ffmpeg::{detect_system_ffmpeg, FFmpegEngine};
use clipforge_core::jobs::{JobRegistry, JobService, JobStatus};
use clipforge_core::pipeline::{ClipPipeline, Collaborators};
use clipforge_core::providers::{
    ClipSelector, EdgeTtsSynthesizer, GeminiClient, HeuristicMetadata, HeuristicSelector,
    MetadataGenerator, NoopTranscriber, YtDlpDownloader,
};

// =============================================================================
// CLI Definition
// =============================================================================

#[derive(Parser)]
#[command(
    name = "clipforge",
    version,
    about = "Turns long-form video into short vertical clips with burned-in captions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render clips from a source video URL
    Process {
        /// Source video URL (anything yt-dlp accepts)
        url: String,

        /// Video title used in prompts and fallback metadata
        #[arg(long, default_value = "Untitled video")]
        title: String,

        /// Number of clips to produce
        #[arg(long)]
        clips: Option<u32>,

        /// Subtitle style preset (boxed, classic, yellow, minimal)
        #[arg(long)]
        style: Option<String>,
    },

    /// Check that the external tools are available
    Doctor,
}

// =============================================================================
// Logging
// =============================================================================

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

fn init_logging(log_dir: &Path) {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "clipforge.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    // Logs go to stderr; stdout carries only the JSON summary.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

// =============================================================================
// Wiring
// =============================================================================

/// Wires the collaborator set from configuration.
///
/// Provider choice is deterministic: Gemini handles selection and metadata
/// when an API key is configured, the heuristic implementations otherwise.
fn wire_collaborators(config: &PipelineConfig) -> Result<Collaborators> {
    let downloader = Arc::new(YtDlpDownloader::new(
        &config.downloads_dir,
        config.music_playlist_url.clone(),
    ));

    let (selector, metadata): (Arc<dyn ClipSelector>, Arc<dyn MetadataGenerator>) =
        match &config.gemini_api_key {
            Some(key) => {
                let gemini = Arc::new(GeminiClient::new(key, &config.gemini_model)?);
                (gemini.clone(), gemini)
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, using heuristic selection and metadata");
                (
                    Arc::new(HeuristicSelector::new(
                        config.num_clips,
                        config.clip_max_sec,
                        config.end_margin_sec,
                    )),
                    Arc::new(HeuristicMetadata),
                )
            }
        };

    Ok(Collaborators {
        downloader,
        transcriber: Arc::new(NoopTranscriber),
        selector,
        metadata,
        synthesizer: Arc::new(EdgeTtsSynthesizer::new(&config.tts_voice)),
    })
}

// =============================================================================
// Commands
// =============================================================================

async fn process(url: &str, title: &str, clips: Option<u32>, style: Option<&str>) -> Result<()> {
    let mut config = PipelineConfig::from_env();
    if let Some(n) = clips {
        config.num_clips = n;
    }
    if let Some(name) = style {
        config.captions.style = SubtitleStyle::preset(name);
    }

    let info = detect_system_ffmpeg().context("FFmpeg is required; run `clipforge doctor`")?;
    tracing::info!("using {}", info.version);
    let engine = Arc::new(FFmpegEngine::new(info));

    let collaborators = wire_collaborators(&config)?;
    let pipeline = Arc::new(ClipPipeline::new(Arc::new(config), engine, collaborators));

    let registry = Arc::new(JobRegistry::default());
    let service = JobService::start(Arc::clone(&registry), pipeline);

    let job_id = service.submit(url, title)?;
    tracing::info!("job {} accepted", job_id);

    let record = loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let Some(snapshot) = registry.snapshot(&job_id) else {
            bail!("job record disappeared");
        };
        if snapshot.status.is_terminal() {
            break snapshot;
        }
    };

    match record.status {
        JobStatus::Completed => {
            println!("{}", serde_json::to_string_pretty(&record.clips)?);
            Ok(())
        }
        _ => bail!(
            "job failed: {}",
            record.error.unwrap_or_else(|| "unknown error".to_string())
        ),
    }
}

fn doctor() -> Result<()> {
    match detect_system_ffmpeg() {
        Ok(info) => {
            println!("ffmpeg:  {}", info.ffmpeg_path.display());
            println!("ffprobe: {}", info.ffprobe_path.display());
            println!("version: {}", info.version);
        }
        Err(e) => bail!("{}", e),
    }

    for tool in ["yt-dlp", "edge-tts"] {
        match std::process::Command::new(tool).arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                println!("{}: {}", tool, version.lines().next().unwrap_or("").trim());
            }
            _ => println!("{}: not found", tool),
        }
    }

    Ok(())
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(Path::new(".logs"));

    match cli.command {
        Command::Process {
            url,
            title,
            clips,
            style,
        } => process(&url, &title, clips, style.as_deref()).await,
        Command::Doctor => doctor(),
    }
}
