//! Bookkeeping shared by every time-indexed clip

/// Mask flag and time span of a clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBase {
    /// Whether the clip's frames represent opacity rather than colour
    pub is_mask: bool,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds, if the clip is bounded
    pub end: Option<f64>,
    /// Duration in seconds, if the clip is bounded
    pub duration: Option<f64>,
}

impl ClipBase {
    /// Creates an unbounded clip base starting at zero
    pub fn new(is_mask: bool) -> Self {
        Self {
            is_mask,
            start: 0.0,
            end: None,
            duration: None,
        }
    }

    /// Bounds the clip to `duration` seconds after its start
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = Some(duration);
        self.end = Some(self.start + duration);
    }

    /// Checks if the clip is playing at time `t`
    pub fn is_playing(&self, t: f64) -> bool {
        t >= self.start && self.end.map_or(true, |end| t < end)
    }
}
