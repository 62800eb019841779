//! mediaclip Core Library
//!
//! This library provides the time-indexed clip abstraction: a video stream
//! (and optionally its audio) exposed as a function from timestamps to frames,
//! plus the co-reader protocol for duplicating a clip with independent
//! decoder state.
//!
//! Decoding itself is delegated to implementations of [`VideoReader`] and
//! [`AudioReader`]; see the `mediaclip-ffmpeg` crate for the FFmpeg-backed ones.

pub mod clip_base;
pub mod frame;
pub mod media_clip;
pub mod params;
pub mod reader;
pub mod timing;

#[cfg(test)]
pub(crate) mod testing;

pub use clip_base::ClipBase;
pub use frame::{FrameBuffer, SampleBuffer};
pub use media_clip::{Frames, MediaClip};
pub use params::{AudioParams, ClipParameters, PixelFormat};
pub use reader::{AudioReader, VideoReader};

/// Result type for mediaclip-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for mediaclip-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Source unavailable '{source_id}': {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// Builds a [`Error::SourceUnavailable`] for `source_id`
    pub fn unavailable(source_id: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
