//! Caption Timing Module
//!
//! Converts per-word speech timings into caption cues for the burn stage.
//!
//! Cue production is tiered: precise word timings first, evenly-spaced
//! windows over plain text when timings are empty or malformed, and no
//! captions at all as the last resort. The tier ordering lives in the
//! pipeline; this module only provides the builders.

mod cues;
mod estimator;
mod srt;

pub use cues::CueBuilder;
pub use estimator::TimingEstimator;
pub use srt::{render_srt, write_srt};

/// Errors that can occur while building caption cues
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    #[error("No word timings to build cues from")]
    EmptyTimings,

    #[error("Word timings are not monotonically ordered")]
    NonMonotonic,

    #[error("No caption text")]
    EmptyText,
}
