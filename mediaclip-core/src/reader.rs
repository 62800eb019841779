//! Decoder interfaces consumed by [`MediaClip`](crate::MediaClip)

use crate::{timing, AudioParams, FrameBuffer, PixelFormat, Result, SampleBuffer};

/// A video decoder bound to one source.
///
/// Implementations own their demuxer/decoder state, including the read
/// cursor, which is why [`frame_at`](VideoReader::frame_at) takes `&mut self`.
pub trait VideoReader: Sized {
    /// Opens `source`, producing frames in `pixel_format`
    fn open(source: &str, pixel_format: PixelFormat) -> Result<Self>;

    /// The format frames are actually produced in
    fn pixel_format(&self) -> PixelFormat;

    /// Duration of the stream in seconds
    fn duration(&self) -> f64;

    /// Frames per second
    fn fps(&self) -> f64;

    /// `(width, height)` of decoded frames
    fn size(&self) -> (u32, u32);

    /// Decodes the frame shown at time `t` seconds
    fn frame_at(&mut self, t: f64) -> Result<FrameBuffer>;
}

/// An audio decoder bound to one source
pub trait AudioReader: Sized {
    /// Opens `source` with the given buffering and output format
    fn open(source: &str, params: &AudioParams) -> Result<Self>;

    /// Duration of the stream in seconds
    fn duration(&self) -> f64;

    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Number of interleaved output channels
    fn channels(&self) -> u16;

    /// Output bytes per sample
    fn sample_width(&self) -> u8;

    /// Number of sample frames kept decoded around the read position
    fn buffer_size(&self) -> usize;

    /// Decodes the sample frames covering `[start, end)` seconds
    fn samples_between(&mut self, start: f64, end: f64) -> Result<SampleBuffer>;

    /// Decodes the single sample frame at time `t` seconds
    fn samples_at(&mut self, t: f64) -> Result<SampleBuffer> {
        let rate = self.sample_rate().max(1) as f64;
        let index = timing::sample_index(t, self.sample_rate());
        let start = index as f64 / rate;
        self.samples_between(start, index.saturating_add(1) as f64 / rate)
    }
}
