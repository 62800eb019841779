//! mediaclip FFmpeg Backend
//!
//! This library provides [`VideoReader`](mediaclip_core::VideoReader) and
//! [`AudioReader`](mediaclip_core::AudioReader) implementations on top of
//! FFmpeg, and the [`VideoFileClip`] alias tying them into a
//! [`MediaClip`](mediaclip_core::MediaClip).

pub mod audio_reader;
pub mod image_frame;
pub mod seek;
pub mod video_reader;

#[cfg(test)]
pub(crate) mod test_media;

pub use audio_reader::FfmpegAudioReader;
pub use image_frame::frame_to_image;
pub use video_reader::FfmpegVideoReader;

pub use mediaclip_core::{Error, Result};

use ffmpeg_next as ffmpeg;
use mediaclip_core::{ClipParameters, MediaClip};
use std::sync::OnceLock;

/// A clip decoding a media file through FFmpeg
pub type VideoFileClip = MediaClip<FfmpegVideoReader, FfmpegAudioReader>;

/// Opens `path` with default parameters
pub fn open_video_file(path: &str) -> Result<VideoFileClip> {
    VideoFileClip::open(ClipParameters::new(path))
}

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg (once per process)
pub(crate) fn init_ffmpeg(source: &str) -> Result<()> {
    FFMPEG_INIT
        .get_or_init(ffmpeg::init)
        .as_ref()
        .map(|_| ())
        .map_err(|e| Error::unavailable(source, format!("FFmpeg failed to initialize: {e}")))
}

/// Converts a rational to seconds, treating an empty denominator as zero
pub(crate) fn rational_to_f64(rational: ffmpeg::Rational) -> f64 {
    if rational.denominator() == 0 {
        return 0.0;
    }
    rational.numerator() as f64 / rational.denominator() as f64
}

/// Duration of `stream` in seconds, falling back to the container's
pub(crate) fn stream_duration(
    input: &ffmpeg::format::context::Input,
    stream: &ffmpeg::format::stream::Stream,
) -> f64 {
    let duration = stream.duration();
    if duration > 0 {
        duration as f64 * rational_to_f64(stream.time_base())
    } else {
        input.duration().max(0) as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
    }
}

/// First presentation timestamp of `stream`, zero when unknown
pub(crate) fn stream_start(stream: &ffmpeg::format::stream::Stream) -> i64 {
    let start = stream.start_time();
    if start == ffmpeg::ffi::AV_NOPTS_VALUE {
        0
    } else {
        start
    }
}
