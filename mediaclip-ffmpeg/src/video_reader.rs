//! Random-access video frame reading using FFmpeg

use crate::{init_ffmpeg, rational_to_f64, seek, stream_duration, stream_start, Error, Result};
use ffmpeg_next as ffmpeg;
use mediaclip_core::{timing, FrameBuffer, PixelFormat, VideoReader};

/// Frames decoded forward before a jump is served by seeking instead
const MAX_FORWARD_DECODE: usize = 100;

fn to_ffmpeg_pixel(format: PixelFormat) -> ffmpeg::format::Pixel {
    match format {
        PixelFormat::Rgb24 => ffmpeg::format::Pixel::RGB24,
        PixelFormat::Rgba => ffmpeg::format::Pixel::RGBA,
    }
}

/// Video reader that decodes the frame shown at any timestamp.
///
/// The reader keeps a cursor on the last decoded frame. Asking for the same
/// frame again is free, short forward jumps decode sequentially, and anything
/// else seeks to the preceding keyframe first.
pub struct FfmpegVideoReader {
    source: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    pixel_format: PixelFormat,
    time_base: f64,
    start_pts: i64,
    duration: f64,
    fps: f64,
    width: u32,
    height: u32,
    position: Option<usize>,
    last_frame: Option<FrameBuffer>,
    at_start: bool,
    eof: bool,
}

// Each reader owns its own demuxer, decoder and scaler, reached only via &mut self.
unsafe impl Send for FfmpegVideoReader {}

impl FfmpegVideoReader {
    /// Source this reader was opened on
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Index of the last decoded frame
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    fn seek_to_frame(&mut self, index: usize) -> Result<()> {
        let target = timing::frame_time(index, self.fps) + self.start_pts as f64 * self.time_base;
        seek::seek_to_secs(&mut self.input, target, "video")?;
        self.decoder.flush();
        self.position = None;
        self.last_frame = None;
        self.at_start = false;
        self.eof = false;
        Ok(())
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet))
    }

    /// Decodes the next frame along with its frame index
    fn decode_next(&mut self) -> Result<Option<(usize, ffmpeg::frame::Video)>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let index = match decoded.timestamp().or(decoded.pts()) {
                    Some(pts) => timing::frame_index(
                        (pts - self.start_pts) as f64 * self.time_base,
                        self.fps,
                    ),
                    None => self.position.map_or(0, |position| position + 1),
                };
                return Ok(Some((index, decoded)));
            }
            if self.eof {
                return Ok(None);
            }
            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet).map_err(|e| {
                    Error::DecodeFailure(format!("'{}': bad video packet: {e}", self.source))
                })?,
                None => {
                    self.decoder.send_eof().map_err(|e| {
                        Error::DecodeFailure(format!("'{}': flushing decoder: {e}", self.source))
                    })?;
                    self.eof = true;
                }
            }
        }
    }

    /// Converts a decoded frame to the negotiated format, dropping row padding
    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> Result<FrameBuffer> {
        let mut converted = ffmpeg::frame::Video::empty();
        self.scaler.run(decoded, &mut converted).map_err(|e| {
            Error::DecodeFailure(format!("'{}': pixel conversion failed: {e}", self.source))
        })?;

        let row_bytes = self.width as usize * self.pixel_format.channels();
        let stride = converted.stride(0);
        let data = converted.data(0);
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }

        FrameBuffer::new(self.width, self.height, self.pixel_format, pixels)
    }
}

impl VideoReader for FfmpegVideoReader {
    fn open(source: &str, pixel_format: PixelFormat) -> Result<Self> {
        init_ffmpeg(source)?;

        let input = ffmpeg::format::input(&source).map_err(|e| Error::unavailable(source, e))?;

        let (stream_index, time_base, start_pts, duration, fps, decoder) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| Error::unavailable(source, "no video stream"))?;

            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| Error::unavailable(source, e))?;
            let decoder = context
                .decoder()
                .video()
                .map_err(|e| Error::unavailable(source, e))?;

            let mut fps = rational_to_f64(stream.avg_frame_rate());
            if !(fps > 0.0) {
                fps = rational_to_f64(stream.rate());
            }

            (
                stream.index(),
                rational_to_f64(stream.time_base()),
                stream_start(&stream),
                stream_duration(&input, &stream),
                fps,
                decoder,
            )
        };

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(Error::unavailable(source, "video stream has no frame size"));
        }

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            to_ffmpeg_pixel(pixel_format),
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| {
            Error::UnsupportedFormat(format!(
                "'{source}': cannot convert {:?} to {pixel_format}: {e}",
                decoder.format()
            ))
        })?;

        log::debug!(
            "video reader on '{source}': {width}x{height} @ {fps:.3} fps, {duration:.3}s, {pixel_format}"
        );

        Ok(Self {
            source: source.to_string(),
            input,
            stream_index,
            decoder,
            scaler,
            pixel_format,
            time_base,
            start_pts,
            duration,
            fps,
            width,
            height,
            position: None,
            last_frame: None,
            at_start: true,
            eof: false,
        })
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Past the last frame, the last frame is returned.
    fn frame_at(&mut self, t: f64) -> Result<FrameBuffer> {
        let target = timing::frame_index(t, self.fps);

        if let (Some(position), Some(frame)) = (self.position, &self.last_frame) {
            if target == position || (self.eof && target > position) {
                return Ok(frame.clone());
            }
        }

        let needs_seek = match self.position {
            Some(position) => target < position || target > position + MAX_FORWARD_DECODE,
            None => !self.at_start || target > MAX_FORWARD_DECODE,
        };
        if needs_seek {
            self.seek_to_frame(target)?;
        }

        let mut preroll = None;
        while let Some((index, decoded)) = self.decode_next()? {
            self.at_start = false;
            self.position = Some(index);
            if index >= target {
                let frame = self.convert(&decoded)?;
                self.last_frame = Some(frame.clone());
                return Ok(frame);
            }
            preroll = Some(decoded);
        }

        // Stream ended before `target`
        if let Some(decoded) = preroll {
            let frame = self.convert(&decoded)?;
            self.last_frame = Some(frame.clone());
            return Ok(frame);
        }
        self.last_frame.clone().ok_or_else(|| {
            Error::DecodeFailure(format!("'{}': no frame decoded at t={t:.3}", self.source))
        })
    }
}
