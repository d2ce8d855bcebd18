//! ClipForge Core Engine
//!
//! Turns a long-form source video into short vertical clips with burned-in
//! captions and a mixed narration/music audio bed.
//!
//! The crate is organized around a linear per-clip rendering chain
//! (cut, mix, caption burn, finalize) driven by [`pipeline::ClipPipeline`],
//! with job tracking in [`jobs`], caption timing in [`captions`], and all
//! transcoding delegated to an external engine behind [`ffmpeg::TranscodeEngine`].

pub mod captions;
pub mod config;
pub mod ffmpeg;
pub mod jobs;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod timecode;
pub mod transform;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
