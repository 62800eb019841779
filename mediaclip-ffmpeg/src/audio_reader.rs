//! Buffered audio sample reading using FFmpeg

use crate::{init_ffmpeg, rational_to_f64, seek, stream_duration, stream_start, Error, Result};
use ffmpeg_next as ffmpeg;
use ffmpeg::format::sample::{Sample, Type as SampleType};
use ffmpeg::software::resampling;
use ffmpeg::util::channel_layout::ChannelLayout;
use mediaclip_core::{timing, AudioParams, AudioReader, SampleBuffer};

/// Output room beyond the rate-scaled input, for samples the resampler held back
const RESAMPLE_MARGIN: usize = 256;

/// Output frame size used while draining the resampler
const FLUSH_CHUNK: usize = 4096;

/// Packed output format for a sample width in bytes
fn output_sample_format(sample_width: u8) -> Result<Sample> {
    match sample_width {
        1 => Ok(Sample::U8(SampleType::Packed)),
        2 => Ok(Sample::I16(SampleType::Packed)),
        4 => Ok(Sample::I32(SampleType::Packed)),
        other => Err(Error::UnsupportedFormat(format!(
            "{other}-byte audio samples (expected 1, 2 or 4)"
        ))),
    }
}

/// Converts packed native-endian samples to signed values
fn bytes_to_samples(bytes: &[u8], sample_width: u8, out: &mut Vec<i32>) {
    match sample_width {
        1 => out.extend(bytes.iter().map(|&b| b as i32 - 128)),
        2 => out.extend(
            bytes
                .chunks_exact(2)
                .map(|b| i16::from_ne_bytes([b[0], b[1]]) as i32),
        ),
        _ => out.extend(
            bytes
                .chunks_exact(4)
                .map(|b| i32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
        ),
    }
}

/// Sample frames needed to hold `in_samples` converted from `in_rate` to `out_rate`
fn output_capacity(in_samples: usize, in_rate: u32, out_rate: u32) -> usize {
    let scaled = (in_samples as u64 * out_rate as u64).div_ceil(in_rate.max(1) as u64);
    scaled as usize + RESAMPLE_MARGIN
}

fn layout_for_channels(channels: u16) -> ChannelLayout {
    match channels {
        1 => ChannelLayout::MONO,
        6 => ChannelLayout::_5POINT1,
        8 => ChannelLayout::_7POINT1,
        _ => ChannelLayout::STEREO,
    }
}

fn build_resampler(
    frame: &ffmpeg::frame::Audio,
    format: Sample,
    layout: ChannelLayout,
    rate: u32,
) -> Result<resampling::Context> {
    // Sources with an unset layout are described by their channel count
    let source_layout = if frame.channel_layout().is_empty() {
        layout_for_channels(frame.channels())
    } else {
        frame.channel_layout()
    };
    resampling::Context::get(
        frame.format(),
        source_layout,
        frame.rate(),
        format,
        layout,
        rate,
    )
    .map_err(|e| {
        Error::UnsupportedFormat(format!(
            "cannot resample {:?} @ {} Hz to {format:?} @ {rate} Hz: {e}",
            frame.format(),
            frame.rate()
        ))
    })
}

/// Audio reader serving sample ranges from a decoded window.
///
/// Up to `buffer_size` sample frames following the last request stay decoded,
/// so consecutive requests (one per video frame, say) rarely touch the
/// decoder. Requests behind the window or far past it seek.
pub struct FfmpegAudioReader {
    source: String,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Audio,
    resampler: Option<resampling::Context>,
    params: AudioParams,
    sample_format: Sample,
    layout: ChannelLayout,
    channels: u16,
    time_base: f64,
    start_pts: i64,
    duration: f64,
    window: Vec<u8>,
    window_start: usize,
    eof: bool,
}

// Each reader owns its own demuxer, decoder and resampler, reached only via &mut self.
unsafe impl Send for FfmpegAudioReader {}

impl FfmpegAudioReader {
    /// Source this reader was opened on
    pub fn source(&self) -> &str {
        &self.source
    }

    fn frame_bytes(&self) -> usize {
        self.channels as usize * self.params.sample_width as usize
    }

    fn window_end(&self) -> usize {
        self.window_start + self.window.len() / self.frame_bytes()
    }

    fn window_contains(&self, index: usize) -> bool {
        index >= self.window_start && index < self.window_end()
    }

    fn silence_byte(&self) -> u8 {
        // u8 samples are offset binary
        if self.params.sample_width == 1 {
            128
        } else {
            0
        }
    }

    fn seek_to_sample(&mut self, index: usize) -> Result<()> {
        let target = index as f64 / self.params.sample_rate as f64
            + self.start_pts as f64 * self.time_base;
        seek::seek_to_secs(&mut self.input, target, "audio")?;
        self.decoder.flush();
        self.resampler = None;
        self.window.clear();
        self.window_start = index;
        self.eof = false;
        Ok(())
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet))
    }

    /// Decodes and resamples the next frame, returning its first sample index
    /// (when the frame is timestamped) and its packed bytes
    fn decode_chunk(&mut self) -> Result<Option<(Option<usize>, Vec<u8>)>> {
        let mut decoded = ffmpeg::frame::Audio::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let first = decoded.timestamp().or(decoded.pts()).map(|pts| {
                    timing::sample_index(
                        (pts - self.start_pts) as f64 * self.time_base,
                        self.params.sample_rate,
                    )
                });
                let bytes = self.resample(&decoded)?;
                return Ok(Some((first, bytes)));
            }
            if self.eof {
                let tail = self.drain_resampler()?;
                return Ok((!tail.is_empty()).then_some((None, tail)));
            }
            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet).map_err(|e| {
                    Error::DecodeFailure(format!("'{}': bad audio packet: {e}", self.source))
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

    fn resample(&mut self, decoded: &ffmpeg::frame::Audio) -> Result<Vec<u8>> {
        let mut resampler = match self.resampler.take() {
            Some(resampler) => resampler,
            None => build_resampler(
                decoded,
                self.sample_format,
                self.layout,
                self.params.sample_rate,
            )?,
        };

        // An empty output frame would be sized to the input sample count,
        // which is too small whenever the output rate is higher
        let capacity = output_capacity(decoded.samples(), decoded.rate(), self.params.sample_rate);
        let mut resampled = ffmpeg::frame::Audio::new(self.sample_format, capacity, self.layout);
        let result = resampler.run(decoded, &mut resampled);
        self.resampler = Some(resampler);
        result.map_err(|e| {
            Error::DecodeFailure(format!("'{}': resampling failed: {e}", self.source))
        })?;

        self.packed_bytes(&resampled)
    }

    /// Takes the samples still buffered in the resampler once the decoder is done
    fn drain_resampler(&mut self) -> Result<Vec<u8>> {
        let Some(mut resampler) = self.resampler.take() else {
            return Ok(Vec::new());
        };

        let mut tail = Vec::new();
        loop {
            let mut flushed =
                ffmpeg::frame::Audio::new(self.sample_format, FLUSH_CHUNK, self.layout);
            resampler.flush(&mut flushed).map_err(|e| {
                Error::DecodeFailure(format!("'{}': draining resampler: {e}", self.source))
            })?;
            let bytes = self.packed_bytes(&flushed)?;
            if bytes.is_empty() {
                break;
            }
            tail.extend_from_slice(&bytes);
        }
        Ok(tail)
    }

    /// The converted samples of a packed frame
    fn packed_bytes(&self, frame: &ffmpeg::frame::Audio) -> Result<Vec<u8>> {
        if frame.samples() == 0 {
            return Ok(Vec::new());
        }
        let len = frame.samples() * self.frame_bytes();
        frame
            .data(0)
            .get(..len)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| {
                Error::DecodeFailure(format!("'{}': short resampled frame", self.source))
            })
    }

    /// Makes the window start at `target`, decoding up to `buffer_size` frames
    fn fill_window(&mut self, target: usize) -> Result<()> {
        let frame_bytes = self.frame_bytes();
        let behind = target < self.window_start;
        let far_ahead = target > self.window_end() + self.params.buffer_size;
        if behind || far_ahead {
            self.seek_to_sample(target)?;
        }

        let wanted_end = target + self.params.buffer_size;
        while self.window_end() < wanted_end {
            let Some((first, chunk)) = self.decode_chunk()? else {
                break;
            };
            if self.window.is_empty() {
                if let Some(first) = first {
                    self.window_start = first;
                }
            }
            self.window.extend_from_slice(&chunk);
        }

        // Drop the pre-roll before `target`
        if target > self.window_start {
            let drop = (target - self.window_start).min(self.window.len() / frame_bytes);
            self.window.drain(..drop * frame_bytes);
            self.window_start += drop;
        }
        // The seek landed past `target`: pad the gap with silence
        if target < self.window_start && !self.window.is_empty() {
            let pad = (self.window_start - target) * frame_bytes;
            let silence = self.silence_byte();
            self.window.splice(0..0, std::iter::repeat(silence).take(pad));
            self.window_start = target;
        }
        Ok(())
    }
}

impl AudioReader for FfmpegAudioReader {
    fn open(source: &str, params: &AudioParams) -> Result<Self> {
        let sample_format = output_sample_format(params.sample_width)?;
        if params.buffer_size == 0 || params.sample_rate == 0 {
            return Err(Error::InvalidParameter(format!(
                "audio buffer size and sample rate must be positive, got {params:?}"
            )));
        }

        init_ffmpeg(source)?;

        let input = ffmpeg::format::input(&source).map_err(|e| Error::unavailable(source, e))?;

        let (stream_index, time_base, start_pts, duration, decoder) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Audio)
                .ok_or_else(|| Error::unavailable(source, "no audio stream"))?;

            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| Error::unavailable(source, e))?;
            let decoder = context
                .decoder()
                .audio()
                .map_err(|e| Error::unavailable(source, e))?;

            (
                stream.index(),
                rational_to_f64(stream.time_base()),
                stream_start(&stream),
                stream_duration(&input, &stream),
                decoder,
            )
        };

        // Surround is folded down to stereo
        let (channels, layout) = if decoder.channels() >= 2 {
            (2, ChannelLayout::STEREO)
        } else {
            (1, ChannelLayout::MONO)
        };

        log::debug!(
            "audio reader on '{source}': {} ch -> {channels} ch @ {} Hz, {}-byte samples, {duration:.3}s",
            decoder.channels(),
            params.sample_rate,
            params.sample_width
        );

        Ok(Self {
            source: source.to_string(),
            input,
            stream_index,
            decoder,
            resampler: None,
            params: *params,
            sample_format,
            layout,
            channels,
            time_base,
            start_pts,
            duration,
            window: Vec::new(),
            window_start: 0,
            eof: false,
        })
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn sample_rate(&self) -> u32 {
        self.params.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_width(&self) -> u8 {
        self.params.sample_width
    }

    fn buffer_size(&self) -> usize {
        self.params.buffer_size
    }

    /// Past the end of the stream, the buffer is padded with silence.
    fn samples_between(&mut self, start: f64, end: f64) -> Result<SampleBuffer> {
        let first = timing::sample_index(start, self.params.sample_rate);
        let last = timing::sample_index(end, self.params.sample_rate).max(first);
        let channels = self.channels as usize;
        let frame_bytes = self.frame_bytes();

        let mut samples = Vec::with_capacity((last - first) * channels);
        let mut next = first;
        while next < last {
            if !self.window_contains(next) {
                self.fill_window(next)?;
                if !self.window_contains(next) {
                    break;
                }
            }
            let upto = last.min(self.window_end());
            let from = (next - self.window_start) * frame_bytes;
            let to = (upto - self.window_start) * frame_bytes;
            bytes_to_samples(&self.window[from..to], self.params.sample_width, &mut samples);
            next = upto;
        }
        samples.resize((last - first) * channels, 0);

        Ok(SampleBuffer {
            sample_rate: self.params.sample_rate,
            channels: self.channels,
            sample_width: self.params.sample_width,
            samples,
        })
    }
}
