//! Transform Planner
//!
//! Pure computation of per-clip visual-effect and audio-mix parameters from
//! clip duration and static configuration. The planner never touches the
//! transcoding engine; it emits declarative filter descriptions that the
//! render stages hand over verbatim.

use crate::config::{EncodeSettings, MixSettings, MotionSettings};

// =============================================================================
// Filter Escaping
// =============================================================================

/// Escapes a value for use inside an FFmpeg filtergraph.
///
/// Filtergraphs treat `:` and `,` as separators and `\` as an escape
/// character; Windows paths contain both, so they must be escaped to keep
/// filter strings replayable.
pub fn escape_filter_value(raw: &str) -> String {
    raw.replace('\\', "/")
        .replace(':', r"\:")
        .replace('\'', r"\'")
}

// =============================================================================
// Zoom Plan
// =============================================================================

/// Zoom/crop trajectory for one clip.
///
/// The base curve is a function of normalized elapsed time raised to a
/// sub-linear power, so the motion front-loads and settles near the end.
/// A brief sinusoidal pulse is layered on top, timed to the narration onset.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomPlan {
    pub peak: f64,
    pub power: f64,
    pub pulse_start_sec: f64,
    pub pulse_end_sec: f64,
    pub pulse_depth: f64,
}

impl ZoomPlan {
    /// Renders the zoompan `z` expression for a clip of `duration_sec` at
    /// the given frame rate.
    ///
    /// `on` is the output frame number, so `on/total` is normalized time and
    /// `on/fps` is elapsed seconds.
    pub fn expression(&self, duration_sec: f64, fps: u32) -> String {
        let total_frames = (duration_sec * fps as f64).round().max(1.0) as u64;
        let pulse_width = (self.pulse_end_sec - self.pulse_start_sec).max(0.001);

        format!(
            "1+{amp:.4}*pow(on/{total},{power:.3})+{depth:.4}*between(on/{fps},{ps:.2},{pe:.2})*sin(PI*(on/{fps}-{ps:.2})/{pw:.2})",
            amp = self.peak - 1.0,
            total = total_frames,
            power = self.power,
            depth = self.pulse_depth,
            fps = fps,
            ps = self.pulse_start_sec,
            pe = self.pulse_end_sec,
            pw = pulse_width,
        )
    }
}

// =============================================================================
// Fade Plan
// =============================================================================

/// Symmetric fade windows anchored at clip start and end.
#[derive(Clone, Debug, PartialEq)]
pub struct FadePlan {
    /// Fade window length in seconds
    pub duration_sec: f64,
    /// Fade-out anchor, clamped to zero for clips shorter than the window
    pub out_start_sec: f64,
}

impl FadePlan {
    /// Computes fade windows for a clip of `clip_duration_sec`.
    pub fn new(clip_duration_sec: f64, fade_sec: f64) -> Self {
        Self {
            duration_sec: fade_sec,
            out_start_sec: (clip_duration_sec - fade_sec).max(0.0),
        }
    }
}

// =============================================================================
// Mix Plan
// =============================================================================

/// Gains and windows for the original/narration/music mix.
#[derive(Clone, Debug, PartialEq)]
pub struct MixPlan {
    pub original_gain: f64,
    pub narration_gain: f64,
    pub narration_delay_ms: u64,
    pub music_gain: f64,
    pub music_fade_sec: f64,
    /// Music fade-out anchor, clamped to zero for short clips
    pub music_fade_start_sec: f64,
}

impl MixPlan {
    /// Computes the mix for a clip of `clip_duration_sec`.
    pub fn new(clip_duration_sec: f64, settings: &MixSettings) -> Self {
        Self {
            original_gain: settings.original_gain,
            narration_gain: settings.narration_gain,
            narration_delay_ms: settings.narration_delay_ms,
            music_gain: settings.music_gain,
            music_fade_sec: settings.music_fade_sec,
            music_fade_start_sec: (clip_duration_sec - settings.music_fade_sec).max(0.0),
        }
    }

    /// Renders the `filter_complex` graph mixing the available tracks into
    /// `[aout]`.
    ///
    /// Input 0 is the clip, input 1 the narration, input 2 the music (when
    /// present). `duration=first` bounds the mix to the shortest relevant
    /// track so the audio never outlasts the video.
    pub fn filter_graph(&self, with_music: bool) -> String {
        let delay = self.narration_delay_ms;
        let voice = format!(
            "[1:a]adelay={delay}|{delay},volume={gain}[voice]",
            delay = delay,
            gain = self.narration_gain
        );
        let orig = format!("[0:a]volume={}[orig]", self.original_gain);

        if with_music {
            format!(
                "{orig};{voice};[2:a]volume={mg},afade=t=out:st={fs:.2}:d={fd:.2}[music];[orig][voice][music]amix=inputs=3:duration=first:dropout_transition=2[aout]",
                orig = orig,
                voice = voice,
                mg = self.music_gain,
                fs = self.music_fade_start_sec,
                fd = self.music_fade_sec,
            )
        } else {
            format!(
                "{orig};{voice};[orig][voice]amix=inputs=2:duration=first:dropout_transition=2[aout]",
                orig = orig,
                voice = voice,
            )
        }
    }
}

// =============================================================================
// Transform Plan
// =============================================================================

/// The computed visual/audio parameter set for a single clip.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformPlan {
    pub duration_sec: f64,
    pub zoom: ZoomPlan,
    pub fade: FadePlan,
    pub mix: MixPlan,
}

impl TransformPlan {
    /// Renders the full video filter chain for the cut stage: 9:16 reframe,
    /// zoom trajectory, and fade windows.
    pub fn video_filter(&self, encode: &EncodeSettings) -> String {
        format!(
            "crop=ih*9/16:ih,scale={w}:{h},zoompan=z='{z}':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps},fade=t=in:st=0:d={f:.2},fade=t=out:st={fo:.2}:d={f:.2}",
            w = encode.width,
            h = encode.height,
            z = self.zoom.expression(self.duration_sec, encode.fps),
            fps = encode.fps,
            f = self.fade.duration_sec,
            fo = self.fade.out_start_sec,
        )
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Computes a [`TransformPlan`] as a pure function of clip duration and
/// configuration.
pub struct TransformPlanner;

impl TransformPlanner {
    /// Plans effects and mix for a clip of `duration_sec`.
    pub fn plan(duration_sec: f64, motion: &MotionSettings, mix: &MixSettings) -> TransformPlan {
        TransformPlan {
            duration_sec,
            zoom: ZoomPlan {
                peak: motion.zoom_peak,
                power: motion.zoom_power,
                pulse_start_sec: motion.pulse_start_sec,
                pulse_end_sec: motion.pulse_end_sec,
                pulse_depth: motion.pulse_depth,
            },
            fade: FadePlan::new(duration_sec, motion.fade_sec),
            mix: MixPlan::new(duration_sec, mix),
        }
    }
}
