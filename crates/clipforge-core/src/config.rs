//! Pipeline Configuration
//!
//! All tunables for the rendering pipeline, constructed once at the process
//! entry point and passed in explicitly — no ambient global state.
//!
//! Defaults target 9:16 vertical output on modest hardware (2 vCPU cloud
//! tiers), which is why the encoder preset leans fast.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Encode Settings
// =============================================================================

/// Encoder parameters shared by every render stage
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeSettings {
    /// Video codec (e.g. "libx264")
    pub video_codec: String,
    /// CRF value for quality-based encoding (0-51, lower is better)
    pub crf: u8,
    /// Encoder preset (ultrafast..slow)
    pub preset: String,
    /// Audio bitrate (e.g. "192k")
    pub audio_bitrate: String,
    /// Output width
    pub width: u32,
    /// Output height
    pub height: u32,
    /// Output frame rate
    pub fps: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "faster".to_string(),
            audio_bitrate: "192k".to_string(),
            width: 720,
            height: 1280,
            fps: 30,
        }
    }
}

// =============================================================================
// Audio Mix Settings
// =============================================================================

/// Gains and timing for the three-track audio mix
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixSettings {
    /// Original clip audio, attenuated to a background level
    pub original_gain: f64,
    /// Narration boost
    pub narration_gain: f64,
    /// Delay before the narration track starts, in milliseconds
    pub narration_delay_ms: u64,
    /// Background music attenuation
    pub music_gain: f64,
    /// Music fade-out length at the end of the clip, in seconds
    pub music_fade_sec: f64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            original_gain: 0.15,
            narration_gain: 1.8,
            narration_delay_ms: 2000,
            music_gain: 0.10,
            music_fade_sec: 5.0,
        }
    }
}

// =============================================================================
// Motion Settings
// =============================================================================

/// Zoom curve and fade windows applied to every clip
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSettings {
    /// Peak zoom factor reached by the end of the clip
    pub zoom_peak: f64,
    /// Exponent on normalized time; sub-linear values front-load the motion
    pub zoom_power: f64,
    /// Start of the oscillation pulse, seconds (narration onset)
    pub pulse_start_sec: f64,
    /// End of the oscillation pulse, seconds
    pub pulse_end_sec: f64,
    /// Pulse amplitude added on top of the base zoom
    pub pulse_depth: f64,
    /// Fade-in / fade-out window length, seconds
    pub fade_sec: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            zoom_peak: 1.08,
            zoom_power: 0.6,
            pulse_start_sec: 1.8,
            pulse_end_sec: 2.5,
            pulse_depth: 0.012,
            fade_sec: 0.5,
        }
    }
}

// =============================================================================
// Caption Settings
// =============================================================================

/// Caption grouping, timing floors, and burn style
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSettings {
    /// Words per cue (1 = single-word display)
    pub group_size: usize,
    /// Minimum cue display time, milliseconds
    pub min_cue_ms: u64,
    /// Uniform delay applied to every cue so captions track the narration
    pub delay_ms: u64,
    /// Minimum estimated word duration, milliseconds
    pub min_word_ms: u64,
    /// Estimated duration per character, milliseconds
    pub per_char_ms: u64,
    /// Gap inserted between estimated words, milliseconds
    pub word_gap_ms: u64,
    /// Fixed window length for evenly-spaced fallback cues, milliseconds
    pub fallback_window_ms: u64,
    /// Burn style
    pub style: SubtitleStyle,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            group_size: 3,
            min_cue_ms: 700,
            delay_ms: 2000,
            min_word_ms: 150,
            per_char_ms: 60,
            word_gap_ms: 50,
            fallback_window_ms: 1500,
            style: SubtitleStyle::boxed(),
        }
    }
}

// =============================================================================
// Subtitle Style
// =============================================================================

/// ASS force_style parameters for the subtitle burn filter.
///
/// Colors use the ASS `&HAABBGGRR` notation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStyle {
    pub font: String,
    pub font_size: u32,
    pub primary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub outline: u32,
    pub shadow: u32,
    pub bold: bool,
    /// ASS alignment (2 = bottom center)
    pub alignment: u32,
    pub margin_v: u32,
    /// ASS border style (1 = outline, 3 = opaque box)
    pub border_style: u32,
}

impl SubtitleStyle {
    /// White text in a translucent box, the default for vertical clips
    pub fn boxed() -> Self {
        Self {
            font: "Roboto-Bold".to_string(),
            font_size: 22,
            primary_color: "&H00FFFFFF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&HCC000000".to_string(),
            outline: 0,
            shadow: 0,
            bold: true,
            alignment: 2,
            margin_v: 130,
            border_style: 3,
        }
    }

    /// Classic white-on-outline subtitle look
    pub fn classic() -> Self {
        Self {
            font: "Montserrat-Bold".to_string(),
            font_size: 18,
            primary_color: "&H00FFFFFF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H00000000".to_string(),
            outline: 2,
            shadow: 1,
            bold: true,
            alignment: 2,
            margin_v: 100,
            border_style: 1,
        }
    }

    /// High-contrast yellow
    pub fn yellow() -> Self {
        Self {
            font: "Montserrat-Bold".to_string(),
            font_size: 22,
            primary_color: "&H0000FFFF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H00000000".to_string(),
            outline: 5,
            shadow: 3,
            bold: true,
            alignment: 2,
            margin_v: 100,
            border_style: 1,
        }
    }

    /// Understated white with a soft outline
    pub fn minimal() -> Self {
        Self {
            font: "Helvetica-Bold".to_string(),
            font_size: 22,
            primary_color: "&H00FFFFFF".to_string(),
            outline_color: "&H80000000".to_string(),
            back_color: "&H00000000".to_string(),
            outline: 2,
            shadow: 0,
            bold: true,
            alignment: 2,
            margin_v: 150,
            border_style: 1,
        }
    }

    /// Looks up a preset by name, falling back to [`SubtitleStyle::boxed`].
    pub fn preset(name: &str) -> Self {
        match name {
            "classic" => Self::classic(),
            "yellow" => Self::yellow(),
            "minimal" => Self::minimal(),
            _ => Self::boxed(),
        }
    }

    /// Renders the `force_style` argument for the subtitles filter.
    pub fn force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BackColour={},Outline={},Shadow={},Bold={},Alignment={},MarginV={},BorderStyle={}",
            self.font,
            self.font_size,
            self.primary_color,
            self.outline_color,
            self.back_color,
            self.outline,
            self.shadow,
            if self.bold { 1 } else { 0 },
            self.alignment,
            self.margin_v,
            self.border_style,
        )
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self::boxed()
    }
}

// =============================================================================
// Pipeline Config
// =============================================================================

/// Everything the pipeline needs to run one job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Target number of clips per source video
    pub num_clips: u32,
    /// Minimum clip length in seconds
    pub clip_min_sec: f64,
    /// Maximum clip length in seconds
    pub clip_max_sec: f64,
    /// Safety margin kept from the end of the source, seconds
    pub end_margin_sec: f64,
    /// Fallback duration when a probe fails, seconds
    pub probe_fallback_sec: f64,
    /// Fallback source duration when the source cannot be probed, seconds
    pub source_fallback_sec: f64,
    /// Directory for downloaded sources
    pub downloads_dir: PathBuf,
    /// Directory for per-job intermediate artifacts
    pub staging_dir: PathBuf,
    /// Directory for finished clips
    pub output_dir: PathBuf,
    /// Encoder settings
    pub encode: EncodeSettings,
    /// Audio mix settings
    pub mix: MixSettings,
    /// Zoom/fade settings
    pub motion: MotionSettings,
    /// Caption settings
    pub captions: CaptionSettings,
    /// Gemini API key; absent means the heuristic selector is used
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Narration voice passed to the speech synthesizer
    pub tts_voice: String,
    /// Background music playlist; absent means clips ship without music
    pub music_playlist_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let base = PathBuf::from(".");
        Self {
            num_clips: 1,
            clip_min_sec: 30.0,
            clip_max_sec: 60.0,
            end_margin_sec: 5.0,
            probe_fallback_sec: 60.0,
            source_fallback_sec: 600.0,
            downloads_dir: base.join("downloads"),
            staging_dir: base.join("clips"),
            output_dir: base.join("output"),
            encode: EncodeSettings::default(),
            mix: MixSettings::default(),
            motion: MotionSettings::default(),
            captions: CaptionSettings::default(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            tts_voice: "en-US-GuyNeural".to_string(),
            music_playlist_url: None,
        }
    }
}

impl PipelineConfig {
    /// Builds a config from environment variables, with defaults for
    /// everything that is not set.
    ///
    /// Recognized variables: `CLIPFORGE_BASE_DIR`, `CLIPFORGE_NUM_CLIPS`,
    /// `CLIPFORGE_STYLE`, `CLIPFORGE_MUSIC_PLAYLIST`, `GEMINI_API_KEY`,
    /// `GEMINI_MODEL`, `CLIPFORGE_TTS_VOICE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = env::var("CLIPFORGE_BASE_DIR") {
            let base = PathBuf::from(base);
            config.downloads_dir = base.join("downloads");
            config.staging_dir = base.join("clips");
            config.output_dir = base.join("output");
        }

        if let Some(n) = env::var("CLIPFORGE_NUM_CLIPS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.num_clips = n;
        }

        if let Ok(style) = env::var("CLIPFORGE_STYLE") {
            config.captions.style = SubtitleStyle::preset(&style);
        }

        config.music_playlist_url = env::var("CLIPFORGE_MUSIC_PLAYLIST").ok().filter(|v| !v.is_empty());
        config.gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty());

        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Ok(voice) = env::var("CLIPFORGE_TTS_VOICE") {
            config.tts_voice = voice;
        }

        config
    }
}
