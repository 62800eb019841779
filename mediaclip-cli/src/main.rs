//! mediaclip CLI Tool
//!
//! Command-line interface for inspecting media clips and extracting frames.

mod progress;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mediaclip_core::{timing, AudioReader, ClipParameters};
use mediaclip_ffmpeg::{frame_to_image, VideoFileClip};
use progress::FrameProgress;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mediaclip")]
#[command(about = "Time-indexed access to the frames and audio of media files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show duration, frame rate, size and audio details of a file
    Info {
        /// Input media file path
        input: PathBuf,

        /// Do not open the audio stream
        #[arg(long)]
        no_audio: bool,

        /// Print the clip parameters as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save the frame shown at a given time
    Frame {
        /// Input media file path
        input: PathBuf,

        /// Time of the frame in seconds
        #[arg(short, long, default_value = "0")]
        time: f64,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Decode the alpha channel of the source
        #[arg(long)]
        has_mask: bool,
    },

    /// Extract every frame in parallel, one co-reader per worker
    Frames {
        /// Input media file path
        input: PathBuf,

        /// Output directory for frames
        #[arg(short, long)]
        output: PathBuf,

        /// Number of worker threads (default: number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Decode the alpha channel of the source
        #[arg(long)]
        has_mask: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info {
            input,
            no_audio,
            json,
        } => show_info(&input, !no_audio, json)?,

        Commands::Frame {
            input,
            time,
            output,
            has_mask,
        } => save_frame(&input, time, &output, has_mask)?,

        Commands::Frames {
            input,
            output,
            jobs,
            has_mask,
        } => extract_frames(&input, &output, jobs, has_mask)?,
    }

    Ok(())
}

fn source_of(input: &Path) -> Result<&str> {
    input.to_str().context("Input path is not valid UTF-8")
}

fn show_info(input: &Path, audio: bool, json: bool) -> Result<()> {
    let params = ClipParameters::new(source_of(input)?).audio(audio);
    let clip = VideoFileClip::open(params).context("Failed to open media file")?;

    if json {
        println!("{}", clip.parameters().to_json()?);
        return Ok(());
    }

    println!("\n=== Clip Information ===");
    println!("Source: {}", clip.source());
    println!("Duration: {:.3} seconds", clip.duration());
    println!("Frame rate: {:.3} fps", clip.fps());
    println!("Resolution: {}x{}", clip.size().0, clip.size().1);
    println!("Frames: {}", clip.frame_count());
    println!("Pixel format: {}", clip.pixel_format());

    match clip.audio() {
        Some(audio) => {
            println!("\n=== Audio ===");
            println!("Duration: {:.3} seconds", audio.duration());
            println!("Sample rate: {} Hz", audio.sample_rate());
            println!("Channels: {}", audio.channels());
            println!("Sample width: {} bytes", audio.sample_width());
            println!("Buffer: {} sample frames", audio.buffer_size());
        }
        None => println!("\nAudio: not opened"),
    }

    Ok(())
}

fn save_frame(input: &Path, time: f64, output: &Path, has_mask: bool) -> Result<()> {
    let params = ClipParameters::new(source_of(input)?)
        .has_mask(has_mask)
        .audio(false);
    let mut clip = VideoFileClip::open(params).context("Failed to open media file")?;

    if time > clip.duration() {
        log::warn!(
            "t={time:.3}s is past the end of the clip ({:.3}s)",
            clip.duration()
        );
    }

    let frame = clip
        .frame_at(time)
        .with_context(|| format!("Failed to decode frame at {time:.3}s"))?;
    frame_to_image(frame)?
        .save(output)
        .context("Failed to save frame")?;

    println!("Saved frame at {time:.3}s to {}", output.display());
    Ok(())
}

fn extract_frames(
    input: &Path,
    output_dir: &Path,
    jobs: Option<usize>,
    has_mask: bool,
) -> Result<()> {
    let params = ClipParameters::new(source_of(input)?)
        .has_mask(has_mask)
        .audio(false);
    let clip = VideoFileClip::open(params).context("Failed to open media file")?;

    let total = clip.frame_count();
    let fps = clip.fps();
    let jobs = jobs.unwrap_or_else(num_cpus::get).clamp(1, total);
    let chunk = total.div_ceil(jobs);

    std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;
    println!(
        "Extracting {total} frames to {} with {jobs} workers",
        output_dir.display()
    );

    // One independent reader per worker
    let workers = (0..jobs)
        .map(|_| clip.coreader(false))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to open co-readers")?;
    drop(clip);

    let progress = FrameProgress::new(total, 50);

    std::thread::scope(|scope| {
        let handles: Vec<_> = workers
            .into_iter()
            .enumerate()
            .map(|(worker, mut reader)| {
                let progress = &progress;
                scope.spawn(move || -> Result<()> {
                    let start = worker * chunk;
                    let end = (start + chunk).min(total);
                    log::debug!("worker {worker}: frames {start}..{end}");
                    for index in start..end {
                        let t = timing::frame_time(index, fps);
                        let frame = reader
                            .frame_at(t)
                            .with_context(|| format!("Failed to decode frame {index}"))?;
                        let path = output_dir.join(format!("frame_{index:06}.png"));
                        frame_to_image(frame)?
                            .save(&path)
                            .with_context(|| format!("Failed to save {}", path.display()))?;
                        progress.frame_written();
                    }
                    Ok(())
                })
            })
            .collect();

        handles.into_iter().try_for_each(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("Frame worker panicked"))?
        })
    })?;

    println!("Successfully extracted {} frames", progress.written());
    Ok(())
}
