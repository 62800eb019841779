//! In-memory readers for tests.
//!
//! Sources look like `stub://10s@25/1280x720`, optionally followed by
//! `/silent` (no audio track). `stub://missing` cannot be opened and
//! `stub://rgb-only` ignores requests for an alpha channel.

use crate::{
    timing, AudioParams, AudioReader, Error, FrameBuffer, PixelFormat, Result, SampleBuffer,
    VideoReader,
};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

const MAX_FORWARD_DECODE: usize = 100;

struct StubSource {
    duration: f64,
    fps: f64,
    width: u32,
    height: u32,
    has_audio: bool,
    alpha: bool,
}

fn parse(source: &str) -> Result<StubSource> {
    let rest = source
        .strip_prefix("stub://")
        .ok_or_else(|| Error::unavailable(source, "not a stub source"))?;

    let mut stub = StubSource {
        duration: 2.0,
        fps: 10.0,
        width: 8,
        height: 8,
        has_audio: true,
        alpha: true,
    };

    for part in rest.split('/') {
        match part {
            "missing" => return Err(Error::unavailable(source, "no such file")),
            "rgb-only" => stub.alpha = false,
            "silent" => stub.has_audio = false,
            clock if clock.contains('@') => {
                let (duration, fps) = clock.split_once('@').unwrap_or_default();
                stub.duration = duration.trim_end_matches('s').parse().unwrap_or(0.0);
                stub.fps = fps.parse().unwrap_or(0.0);
            }
            size if size.contains('x') => {
                let (width, height) = size.split_once('x').unwrap_or_default();
                stub.width = width.parse().unwrap_or(0);
                stub.height = height.parse().unwrap_or(0);
            }
            _ => {}
        }
    }
    Ok(stub)
}

/// Video reader producing frames filled with their frame index
pub(crate) struct StubVideo {
    instance: u64,
    requested: PixelFormat,
    format: PixelFormat,
    duration: f64,
    fps: f64,
    size: (u32, u32),
    position: Option<usize>,
    seeks: usize,
}

impl StubVideo {
    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    pub(crate) fn requested_format(&self) -> PixelFormat {
        self.requested
    }

    pub(crate) fn position(&self) -> Option<usize> {
        self.position
    }

    pub(crate) fn seeks(&self) -> usize {
        self.seeks
    }
}

impl VideoReader for StubVideo {
    fn open(source: &str, pixel_format: PixelFormat) -> Result<Self> {
        let stub = parse(source)?;
        let format = if stub.alpha {
            pixel_format
        } else {
            PixelFormat::Rgb24
        };
        Ok(Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            requested: pixel_format,
            format,
            duration: stub.duration,
            fps: stub.fps,
            size: (stub.width, stub.height),
            position: None,
            seeks: 0,
        })
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_at(&mut self, t: f64) -> Result<FrameBuffer> {
        let last = timing::frame_count(self.duration, self.fps) - 1;
        let index = timing::frame_index(t, self.fps).min(last);
        let needs_seek = match self.position {
            Some(position) => index < position || index > position + MAX_FORWARD_DECODE,
            None => index > MAX_FORWARD_DECODE,
        };
        if needs_seek {
            self.seeks += 1;
        }
        self.position = Some(index);
        Ok(FrameBuffer::filled(
            self.size.0,
            self.size.1,
            self.format,
            (index % 256) as u8,
        ))
    }
}

/// Audio reader producing a repeating ramp
pub(crate) struct StubAudio {
    params: AudioParams,
    duration: f64,
}

impl AudioReader for StubAudio {
    fn open(source: &str, params: &AudioParams) -> Result<Self> {
        let stub = parse(source)?;
        if !stub.has_audio {
            return Err(Error::unavailable(source, "no audio stream"));
        }
        if !matches!(params.sample_width, 1 | 2 | 4) {
            return Err(Error::UnsupportedFormat(format!(
                "{}-byte samples",
                params.sample_width
            )));
        }
        Ok(Self {
            params: *params,
            duration: stub.duration,
        })
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn sample_rate(&self) -> u32 {
        self.params.sample_rate
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_width(&self) -> u8 {
        self.params.sample_width
    }

    fn buffer_size(&self) -> usize {
        self.params.buffer_size
    }

    fn samples_between(&mut self, start: f64, end: f64) -> Result<SampleBuffer> {
        let first = timing::sample_index(start, self.params.sample_rate);
        let last = timing::sample_index(end, self.params.sample_rate);
        let samples = (first..last.max(first))
            .flat_map(|i| {
                let value = (i % 100) as i32;
                [value, -value]
            })
            .collect();
        Ok(SampleBuffer {
            sample_rate: self.params.sample_rate,
            channels: 2,
            sample_width: self.params.sample_width,
            samples,
        })
    }
}
