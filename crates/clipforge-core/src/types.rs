//! ClipForge Core Type Definitions
//!
//! Defines fundamental types shared across the pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Job unique identifier (ULID)
pub type JobId = String;

/// Time in seconds (floating point)
pub type TimeSec = f64;

// =============================================================================
// Word Timing
// =============================================================================

/// When a single spoken word occurs in an audio track, in milliseconds.
///
/// Produced by transcription or synthesis collaborators, or synthesized by
/// the timing estimator when neither supplies per-word data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    /// The spoken word
    pub word: String,
    /// Start offset in milliseconds
    pub start_ms: u64,
    /// End offset in milliseconds (>= start_ms)
    pub end_ms: u64,
}

impl WordTiming {
    /// Creates a new word timing
    pub fn new(word: &str, start_ms: u64, end_ms: u64) -> Self {
        Self {
            word: word.to_string(),
            start_ms,
            end_ms: end_ms.max(start_ms),
        }
    }

    /// Returns the word duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

// =============================================================================
// Clip Boundary
// =============================================================================

/// A selected clip region within the source video.
///
/// Boundaries come from the clip-selection collaborator; the pipeline trusts
/// their bounds but must survive degenerate durations gracefully.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipBoundary {
    /// 1-based clip index
    pub index: u32,
    /// Start position in the source, in seconds
    pub start_sec: TimeSec,
    /// End position in the source, in seconds
    pub end_sec: TimeSec,
    /// Working title for the clip
    pub title: String,
    /// Hook text used for narration and metadata prompts
    pub hook: String,
}

impl ClipBoundary {
    /// Returns the clip duration in seconds (may be <= 0 for degenerate input)
    pub fn duration_sec(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }
}

// =============================================================================
// Caption Cue
// =============================================================================

/// A timed text span intended for on-screen display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionCue {
    /// Display text (uppercased for the burn style)
    pub text: String,
    /// Start offset in milliseconds
    pub start_ms: u64,
    /// End offset in milliseconds
    pub end_ms: u64,
}

impl CaptionCue {
    /// Returns the cue duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Returns true if this cue overlaps another
    pub fn overlaps(&self, other: &CaptionCue) -> bool {
        self.start_ms < other.end_ms && self.end_ms > other.start_ms
    }
}

// =============================================================================
// Clip Metadata
// =============================================================================

/// SEO text generated for a finished clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipMetadata {
    /// Upload title
    pub title: String,
    /// Upload description
    pub description: String,
    /// Upload tags
    pub tags: Vec<String>,
}

impl ClipMetadata {
    /// Static defaults substituted when metadata generation fails.
    pub fn fallback(clip_title: &str) -> Self {
        Self {
            title: format!("{} #shorts", clip_title),
            description: "#shorts #gaming".to_string(),
            tags: vec![
                "gaming".to_string(),
                "shorts".to_string(),
                "clips".to_string(),
                "viral".to_string(),
            ],
        }
    }
}

// =============================================================================
// Clip Summary
// =============================================================================

/// Descriptor of one produced clip, exposed through the job record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSummary {
    /// Output file name (deterministic, derived from the clip index)
    pub filename: String,
    /// Absolute path to the output file
    pub path: String,
    /// Upload title
    pub title: String,
    /// Upload description
    pub description: String,
    /// Upload tags
    pub tags: Vec<String>,
    /// Hook text the clip was selected for
    pub hook: String,
    /// False when all caption tiers failed and the clip shipped uncaptioned
    pub captioned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_timing_clamps_end() {
        let timing = WordTiming::new("hello", 100, 50);
        assert_eq!(timing.end_ms, 100);
        assert_eq!(timing.duration_ms(), 0);
    }

    #[test]
    fn test_boundary_duration() {
        let boundary = ClipBoundary {
            index: 1,
            start_sec: 30.0,
            end_sec: 75.0,
            title: "Part 1".to_string(),
            hook: "Watch this".to_string(),
        };
        assert_eq!(boundary.duration_sec(), 45.0);
    }

    #[test]
    fn test_cue_overlap() {
        let a = CaptionCue {
            text: "A".to_string(),
            start_ms: 0,
            end_ms: 500,
        };
        let b = CaptionCue {
            text: "B".to_string(),
            start_ms: 500,
            end_ms: 900,
        };
        let c = CaptionCue {
            text: "C".to_string(),
            start_ms: 400,
            end_ms: 600,
        };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_metadata_fallback() {
        let meta = ClipMetadata::fallback("Big Moment");
        assert!(meta.title.contains("Big Moment"));
        assert!(meta.title.contains("#shorts"));
        assert!(!meta.tags.is_empty());
    }

    #[test]
    fn test_summary_serialization() {
        let summary = ClipSummary {
            filename: "final_clip_1.mp4".to_string(),
            path: "/out/final_clip_1.mp4".to_string(),
            title: "Clip".to_string(),
            description: String::new(),
            tags: vec![],
            hook: String::new(),
            captioned: true,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let parsed: ClipSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
