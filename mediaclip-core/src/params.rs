//! Construction parameters for media clips
//!
//! [`ClipParameters`] is both the input to [`MediaClip::open`] and the
//! snapshot a clip keeps of how it was built. Re-opening from the snapshot
//! yields an equivalent clip, which is how co-readers are made.
//!
//! [`MediaClip::open`]: crate::MediaClip::open

use crate::{Error, Result};

/// Default number of audio sample frames buffered around the read position
pub const DEFAULT_AUDIO_BUFFER_SIZE: usize = 200_000;

/// Default audio output sample rate in Hz
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Default audio sample width in bytes
pub const DEFAULT_AUDIO_SAMPLE_WIDTH: u8 = 2;

/// Pixel layout requested from the video decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// Packed 8-bit RGB
    Rgb24,
    /// Packed 8-bit RGB with an alpha channel
    Rgba,
}

impl PixelFormat {
    /// Number of interleaved channels per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// FFmpeg-style name of the format
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgba => "rgba",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters forwarded verbatim to an audio reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioParams {
    /// Number of sample frames kept decoded around the read position
    pub buffer_size: usize,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Bytes per sample (1, 2 or 4)
    pub sample_width: u8,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_AUDIO_BUFFER_SIZE,
            sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            sample_width: DEFAULT_AUDIO_SAMPLE_WIDTH,
        }
    }
}

/// Complete set of inputs used to open a [`MediaClip`](crate::MediaClip)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClipParameters {
    /// Opaque identifier of the backing media, usually a file path
    pub source: String,
    /// Whether the clip is used as a mask
    pub is_mask: bool,
    /// Whether the source carries an alpha channel to decode
    pub has_mask: bool,
    /// Whether to attach an audio reader
    pub audio: bool,
    /// Audio buffer size in sample frames
    pub audio_buffer_size: usize,
    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,
    /// Audio sample width in bytes
    pub audio_sample_width: u8,
}

impl ClipParameters {
    /// Creates parameters for `source` with every other field at its default
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            is_mask: false,
            has_mask: false,
            audio: true,
            audio_buffer_size: DEFAULT_AUDIO_BUFFER_SIZE,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            audio_sample_width: DEFAULT_AUDIO_SAMPLE_WIDTH,
        }
    }

    /// Marks the clip as a mask
    pub fn as_mask(mut self, is_mask: bool) -> Self {
        self.is_mask = is_mask;
        self
    }

    /// Requests the alpha channel from the source
    pub fn has_mask(mut self, has_mask: bool) -> Self {
        self.has_mask = has_mask;
        self
    }

    /// Enables or disables the audio reader
    pub fn audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    /// Sets the audio buffer size in sample frames
    pub fn audio_buffer_size(mut self, buffer_size: usize) -> Self {
        self.audio_buffer_size = buffer_size;
        self
    }

    /// Sets the audio sample rate in Hz
    pub fn audio_sample_rate(mut self, sample_rate: u32) -> Self {
        self.audio_sample_rate = sample_rate;
        self
    }

    /// Sets the audio sample width in bytes
    pub fn audio_sample_width(mut self, sample_width: u8) -> Self {
        self.audio_sample_width = sample_width;
        self
    }

    /// The pixel format the video reader must produce.
    ///
    /// This is the only place mask semantics turn into a decoder layout.
    pub fn pixel_format(&self) -> PixelFormat {
        if self.has_mask {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgb24
        }
    }

    /// The subset of parameters handed to the audio reader
    pub fn audio_params(&self) -> AudioParams {
        AudioParams {
            buffer_size: self.audio_buffer_size,
            sample_rate: self.audio_sample_rate,
            sample_width: self.audio_sample_width,
        }
    }

    /// Rejects parameter sets no reader could honour
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(Error::unavailable(&self.source, "empty source identifier"));
        }
        if self.audio {
            if self.audio_buffer_size == 0 {
                return Err(Error::InvalidParameter(
                    "audio buffer size must be positive".into(),
                ));
            }
            if self.audio_sample_rate == 0 {
                return Err(Error::InvalidParameter(
                    "audio sample rate must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Serializes the snapshot to JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidParameter(format!("serialize parameters: {e}")))
    }

    /// Restores a snapshot from JSON
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidParameter(format!("parse parameters: {e}")))
    }
}
