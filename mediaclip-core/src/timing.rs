//! Mapping between timestamps, frame indices and sample indices

/// Added before truncation so timestamps computed as `i / fps` land on frame `i`
pub const FRAME_EPSILON: f64 = 1e-5;

/// Index of the frame displayed at time `t` seconds.
///
/// Negative times and non-positive rates map to frame 0.
pub fn frame_index(t: f64, fps: f64) -> usize {
    if !(t > 0.0) || !(fps > 0.0) {
        return 0;
    }
    (fps * t + FRAME_EPSILON).floor() as usize
}

/// Presentation time of frame `index` in seconds
pub fn frame_time(index: usize, fps: f64) -> f64 {
    if !(fps > 0.0) {
        return 0.0;
    }
    index as f64 / fps
}

/// Number of whole frames in `duration` seconds, at least one
pub fn frame_count(duration: f64, fps: f64) -> usize {
    if !(duration > 0.0) || !(fps > 0.0) {
        return 1;
    }
    ((duration * fps + FRAME_EPSILON).floor() as usize).max(1)
}

/// Index of the audio sample frame at time `t` seconds
pub fn sample_index(t: f64, sample_rate: u32) -> usize {
    if !(t > 0.0) {
        return 0;
    }
    (t * sample_rate as f64 + FRAME_EPSILON).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_boundaries() {
        assert_eq!(frame_index(0.0, 25.0), 0);
        assert_eq!(frame_index(-3.0, 25.0), 0);
        assert_eq!(frame_index(0.039, 25.0), 0);
        assert_eq!(frame_index(0.04, 25.0), 1);
        assert_eq!(frame_index(9.999, 25.0), 249);
        assert_eq!(frame_index(1.0, 0.0), 0);
    }

    #[test]
    fn test_frame_time_lands_on_its_index() {
        for fps in [23.976, 25.0, 29.97, 60.0] {
            for index in [0usize, 1, 7, 299, 1799] {
                assert_eq!(frame_index(frame_time(index, fps), fps), index);
            }
        }
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(10.0, 25.0), 250);
        assert_eq!(frame_count(0.01, 25.0), 1);
        assert_eq!(frame_count(0.0, 25.0), 1);
    }

    #[test]
    fn test_sample_index() {
        assert_eq!(sample_index(0.0, 44_100), 0);
        assert_eq!(sample_index(1.0, 44_100), 44_100);
        assert_eq!(sample_index(0.5, 8_000), 4_000);
    }
}
