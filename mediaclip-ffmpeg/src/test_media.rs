//! Generated media files for tests

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Frame size of files written by [`write_test_video`]; rows are not 32-byte aligned
pub(crate) const VIDEO_SIZE: (u32, u32) = (72, 40);

/// Keyframe interval of files written by [`write_test_video`]
const VIDEO_GOP: u32 = 10;

/// Value of sample `i` in files written by [`write_test_wav`]
pub(crate) fn ramp_sample(i: usize) -> i32 {
    ((i % 200) as i32 - 100) * 100
}

/// Writes a mono 16-bit PCM WAV of `seconds` seconds holding a sawtooth ramp.
///
/// Layout:
///   RIFF  <file_size - 8>  WAVE
///   fmt   16  <format=1 PCM>  <channels=1>  <rate>  <byte_rate>  <block_align=2>  <bits=16>
///   data  <data_size>  <samples…>
pub(crate) fn write_test_wav(dir: &Path, sample_rate: u32, seconds: f64) -> PathBuf {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    const FORMAT_PCM: u16 = 1;
    const BLOCK_ALIGN: u16 = CHANNELS * (BITS / 8);

    let path = dir.join(format!("ramp_{sample_rate}.wav"));
    let frames = (sample_rate as f64 * seconds) as usize;
    let data_size = (frames * BLOCK_ALIGN as usize) as u32;

    let file = std::fs::File::create(&path).unwrap();
    let mut w = std::io::BufWriter::new(file);

    w.write_all(b"RIFF").unwrap();
    w.write_all(&(36u32 + data_size).to_le_bytes()).unwrap();
    w.write_all(b"WAVE").unwrap();

    w.write_all(b"fmt ").unwrap();
    w.write_all(&16u32.to_le_bytes()).unwrap();
    w.write_all(&FORMAT_PCM.to_le_bytes()).unwrap();
    w.write_all(&CHANNELS.to_le_bytes()).unwrap();
    w.write_all(&sample_rate.to_le_bytes()).unwrap();
    w.write_all(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes()).unwrap();
    w.write_all(&BLOCK_ALIGN.to_le_bytes()).unwrap();
    w.write_all(&BITS.to_le_bytes()).unwrap();

    w.write_all(b"data").unwrap();
    w.write_all(&data_size.to_le_bytes()).unwrap();
    for i in 0..frames {
        w.write_all(&(ramp_sample(i) as i16).to_le_bytes()).unwrap();
    }
    w.flush().unwrap();

    path
}

/// Flat colour of frame `index` in files written by [`write_test_video`]
pub(crate) fn frame_colour(index: usize) -> [u8; 3] {
    [16 + (index % 38) as u8 * 6, 16 + (index / 38) as u8 * 40, 128]
}

fn write_video_packets(
    encoder: &mut ffmpeg::encoder::Video,
    output: &mut ffmpeg::format::context::Output,
    encoder_time_base: ffmpeg::Rational,
    stream_time_base: ffmpeg::Rational,
) {
    let mut packet = ffmpeg::Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(0);
        packet.rescale_ts(encoder_time_base, stream_time_base);
        packet.write_interleaved(output).unwrap();
    }
}

/// Writes an MPEG-4 Part 2 Matroska file of `frames` flat-coloured frames.
///
/// Frame `i` is filled with [`frame_colour`]`(i)`, a keyframe every
/// `VIDEO_GOP` frames and no B-frames.
pub(crate) fn write_test_video(dir: &Path, frames: usize, fps: i32) -> PathBuf {
    ffmpeg::init().unwrap();

    let path = dir.join(format!("colours_{frames}@{fps}.mkv"));
    let (width, height) = VIDEO_SIZE;
    let time_base = ffmpeg::Rational(1, fps);

    let mut output = ffmpeg::format::output(&path).unwrap();
    let global_header = output
        .format()
        .flags()
        .contains(ffmpeg::format::Flags::GLOBAL_HEADER);
    let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4).unwrap();

    let mut video = ffmpeg::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();
    video.set_width(width);
    video.set_height(height);
    video.set_format(Pixel::YUV420P);
    video.set_time_base(time_base);
    video.set_frame_rate(Some(ffmpeg::Rational(fps, 1)));
    video.set_gop(VIDEO_GOP);
    video.set_max_b_frames(0);
    video.set_bit_rate(4_000_000);
    if global_header {
        video.set_flags(ffmpeg::codec::flag::Flags::GLOBAL_HEADER);
    }
    let mut encoder = video.open_as(codec).unwrap();

    {
        let mut stream = output.add_stream(codec).unwrap();
        stream.set_time_base(time_base);
        stream.set_avg_frame_rate(ffmpeg::Rational(fps, 1));
        stream.set_parameters(&encoder);
    }
    output.write_header().unwrap();
    let stream_time_base = output.stream(0).unwrap().time_base();

    let mut scaler = ffmpeg::software::scaling::Context::get(
        Pixel::RGB24,
        width,
        height,
        Pixel::YUV420P,
        width,
        height,
        ffmpeg::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    for index in 0..frames {
        let mut rgb = ffmpeg::frame::Video::new(Pixel::RGB24, width, height);
        let colour = frame_colour(index);
        let stride = rgb.stride(0);
        let data = rgb.data_mut(0);
        for row in 0..height as usize {
            let start = row * stride;
            for pixel in data[start..start + width as usize * 3].chunks_exact_mut(3) {
                pixel.copy_from_slice(&colour);
            }
        }
        let mut yuv = ffmpeg::frame::Video::empty();
        scaler.run(&rgb, &mut yuv).unwrap();
        yuv.set_pts(Some(index as i64));

        encoder.send_frame(&yuv).unwrap();
        write_video_packets(&mut encoder, &mut output, time_base, stream_time_base);
    }
    encoder.send_eof().unwrap();
    write_video_packets(&mut encoder, &mut output, time_base, stream_time_base);
    output.write_trailer().unwrap();

    path
}
