//! Decoded pixel and sample buffers

use crate::{Error, PixelFormat, Result};

/// A single decoded video frame with tightly packed rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Width of the frame in pixels
    pub width: u32,
    /// Height of the frame in pixels
    pub height: u32,
    /// Layout of each pixel
    pub format: PixelFormat,
    /// Interleaved pixel data, `width * height * channels` bytes
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Creates a frame, checking that `data` matches the geometry
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(Error::DecodeFailure(format!(
                "frame data is {} bytes, expected {expected} for {width}x{height} {format}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Creates a frame with every byte set to `value`
    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        let len = width as usize * height as usize * format.channels();
        Self {
            width,
            height,
            format,
            data: vec![value; len],
        }
    }

    /// Number of channels per pixel
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `(height, width, channels)`, the usual array shape of a frame
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, self.channels())
    }

    /// Channel values of the pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels();
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        self.data.get(offset..offset + channels)
    }

    /// Extracts the alpha plane of an RGBA frame
    pub fn alpha(&self) -> Option<Vec<u8>> {
        match self.format {
            PixelFormat::Rgba => Some(self.data.chunks_exact(4).map(|px| px[3]).collect()),
            PixelFormat::Rgb24 => None,
        }
    }
}

/// A run of decoded audio, interleaved by channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bytes per sample in the source encoding (1, 2 or 4)
    pub sample_width: u8,
    /// Signed sample values, `frames * channels` of them
    pub samples: Vec<i32>,
}

impl SampleBuffer {
    /// Creates an all-zero buffer of `frames` sample frames
    pub fn silence(sample_rate: u32, channels: u16, sample_width: u8, frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            sample_width,
            samples: vec![0; frames * channels as usize],
        }
    }

    /// Number of sample frames (one sample per channel each)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration covered by the buffer in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Sample for `channel` in sample frame `frame`
    pub fn sample(&self, frame: usize, channel: u16) -> Option<i32> {
        if channel >= self.channels {
            return None;
        }
        self.samples
            .get(frame * self.channels as usize + channel as usize)
            .copied()
    }

    /// Samples scaled to `[-1.0, 1.0)`
    pub fn to_f32(&self) -> Vec<f32> {
        let bits = (self.sample_width.clamp(1, 4) as u32) * 8;
        let scale = (1u64 << (bits - 1)) as f32;
        self.samples.iter().map(|&s| s as f32 / scale).collect()
    }
}
