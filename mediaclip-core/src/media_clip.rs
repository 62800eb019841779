//! Time-indexed clips backed by a video reader and an optional audio reader

use crate::{
    timing, AudioReader, ClipBase, ClipParameters, Error, FrameBuffer, PixelFormat, Result,
    VideoReader,
};

/// A clip reading frames (and optionally audio) from a media source.
///
/// Duration, frame rate and size are copied from the video reader when the
/// clip is opened and never change afterwards. Each clip exclusively owns its
/// readers; use [`coreader`](MediaClip::coreader) to get a second clip on the
/// same source with its own decoder state, e.g. for another thread.
///
/// ```ignore
/// let mut clip: MediaClip<V, A> = MediaClip::open(ClipParameters::new("holiday.mp4"))?;
/// let first = clip.frame_at(0.0)?;
/// let mut other = clip.coreader(false)?;
/// ```
pub struct MediaClip<V, A> {
    base: ClipBase,
    parameters: ClipParameters,
    reader: V,
    audio: Option<A>,
    fps: f64,
    size: (u32, u32),
}

impl<V: VideoReader, A: AudioReader> MediaClip<V, A> {
    /// Opens the video reader, and the audio reader if requested.
    ///
    /// Either both readers open or the whole call fails; no partially
    /// initialized clip is ever returned.
    pub fn open(parameters: ClipParameters) -> Result<Self> {
        parameters.validate()?;

        let mut base = ClipBase::new(parameters.is_mask);

        let pixel_format = parameters.pixel_format();
        let reader = V::open(&parameters.source, pixel_format)?;
        if reader.pixel_format() != pixel_format {
            return Err(Error::UnsupportedFormat(format!(
                "'{}' decoded as {} but {} was requested",
                parameters.source,
                reader.pixel_format(),
                pixel_format
            )));
        }

        let duration = reader.duration();
        if !(duration > 0.0) || !duration.is_finite() {
            return Err(Error::unavailable(
                &parameters.source,
                format!("video reports an invalid duration ({duration})"),
            ));
        }
        let fps = reader.fps();
        if !(fps > 0.0) || !fps.is_finite() {
            return Err(Error::unavailable(
                &parameters.source,
                format!("video reports an invalid frame rate ({fps})"),
            ));
        }
        base.set_duration(duration);

        let audio = if parameters.audio {
            Some(A::open(&parameters.source, &parameters.audio_params())?)
        } else {
            None
        };

        log::debug!(
            "opened clip '{}': {:.3}s @ {:.3} fps, {}x{} {}, audio: {}",
            parameters.source,
            duration,
            fps,
            reader.size().0,
            reader.size().1,
            pixel_format,
            audio.is_some()
        );

        Ok(Self {
            base,
            size: reader.size(),
            fps,
            parameters,
            reader,
            audio,
        })
    }

    /// Opens an independent clip on the same source.
    ///
    /// The stored parameters are replayed with `audio` overriding the
    /// source clip's audio flag. The new clip shares no decoder state with this
    /// one.
    pub fn coreader(&self, audio: bool) -> Result<Self> {
        let mut parameters = self.parameters.clone();
        parameters.audio = audio;
        Self::open(parameters)
    }

    /// Decodes the frame shown at time `t` seconds.
    ///
    /// No clamping or caching happens here; out-of-range behaviour is the
    /// reader's.
    pub fn frame_at(&mut self, t: f64) -> Result<FrameBuffer> {
        self.reader.frame_at(t)
    }

    /// Iterates over every frame of the clip in order, with its timestamp
    pub fn iter_frames(&mut self) -> Frames<'_, V, A> {
        Frames {
            count: self.frame_count(),
            clip: self,
            next: 0,
        }
    }

    /// The snapshot this clip was opened from
    pub fn parameters(&self) -> &ClipParameters {
        &self.parameters
    }

    /// Identifier of the backing source
    pub fn source(&self) -> &str {
        &self.parameters.source
    }

    /// Whether the clip is a mask
    pub fn is_mask(&self) -> bool {
        self.base.is_mask
    }

    /// Pixel format negotiated with the video reader
    pub fn pixel_format(&self) -> PixelFormat {
        self.parameters.pixel_format()
    }

    /// Generic clip bookkeeping
    pub fn base(&self) -> &ClipBase {
        &self.base
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        // always set in open
        self.base.duration.unwrap_or_default()
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.base.end.unwrap_or_default()
    }

    /// Frames per second
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// `(width, height)` of frames
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Number of whole frames in the clip
    pub fn frame_count(&self) -> usize {
        timing::frame_count(self.duration(), self.fps)
    }

    /// The owned video reader
    pub fn reader(&self) -> &V {
        &self.reader
    }

    /// Whether an audio reader is attached
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// The attached audio reader, `None` when the clip was opened without audio
    pub fn audio(&self) -> Option<&A> {
        self.audio.as_ref()
    }

    /// Mutable access to the attached audio reader
    pub fn audio_mut(&mut self) -> Option<&mut A> {
        self.audio.as_mut()
    }
}

impl<V, A> std::fmt::Debug for MediaClip<V, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClip")
            .field("parameters", &self.parameters)
            .field("base", &self.base)
            .field("fps", &self.fps)
            .field("size", &self.size)
            .field("audio", &self.audio.is_some())
            .finish()
    }
}

/// Iterator over `(timestamp, frame)` pairs, see [`MediaClip::iter_frames`]
pub struct Frames<'a, V, A> {
    clip: &'a mut MediaClip<V, A>,
    next: usize,
    count: usize,
}

impl<V: VideoReader, A: AudioReader> Iterator for Frames<'_, V, A> {
    type Item = Result<(f64, FrameBuffer)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let t = timing::frame_time(self.next, self.clip.fps);
        self.next += 1;
        Some(self.clip.frame_at(t).map(|frame| (t, frame)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}
