//! Frame extraction progress shared between worker threads

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Counts frames written by all workers and reports throughput and ETA
pub struct FrameProgress {
    total: usize,
    written: AtomicUsize,
    started: Instant,
    report_every: usize,
}

impl FrameProgress {
    /// Creates a tracker expecting `total` frames, reporting every `report_every`
    pub fn new(total: usize, report_every: usize) -> Self {
        Self {
            total,
            written: AtomicUsize::new(0),
            started: Instant::now(),
            report_every: report_every.max(1),
        }
    }

    /// Records one written frame and prints a status line when due
    pub fn frame_written(&self) {
        let written = self.written.fetch_add(1, Ordering::Relaxed) + 1;
        if written % self.report_every == 0 || written == self.total {
            println!("{}", self.status(written, self.started.elapsed().as_secs_f64()));
        }
    }

    /// Frames written so far
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    fn status(&self, written: usize, elapsed_secs: f64) -> String {
        let rate = if elapsed_secs > 0.0 {
            written as f64 / elapsed_secs
        } else {
            0.0
        };
        if written >= self.total {
            return format!(
                "  {written}/{} frames - done in {} ({rate:.1} frames/s)",
                self.total,
                format_duration(elapsed_secs)
            );
        }
        let eta = if rate > 0.0 {
            format_duration((self.total - written) as f64 / rate)
        } else {
            "?".to_string()
        };
        format!(
            "  {written}/{} frames ({:.1}%) - {rate:.1} frames/s - ETA: {eta}",
            self.total,
            written as f64 / self.total.max(1) as f64 * 100.0
        )
    }
}

/// Formats seconds as `12.3s`, `4m 05s` or `1h 02m 03s`
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let whole = secs.round() as u64;
    let (hours, mins, rest) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if hours == 0 {
        format!("{mins}m {rest:02}s")
    } else {
        format!("{hours}h {mins:02}m {rest:02}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3.21), "3.2s");
        assert_eq!(format_duration(245.0), "4m 05s");
        assert_eq!(format_duration(3723.0), "1h 02m 03s");
    }

    #[test]
    fn test_status_lines() {
        let progress = FrameProgress::new(100, 10);
        assert_eq!(
            progress.status(25, 5.0),
            "  25/100 frames (25.0%) - 5.0 frames/s - ETA: 15.0s"
        );
        assert_eq!(
            progress.status(100, 20.0),
            "  100/100 frames - done in 20.0s (5.0 frames/s)"
        );
    }

    #[test]
    fn test_counts_across_threads() {
        let progress = FrameProgress::new(40, 1000);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        progress.frame_written();
                    }
                });
            }
        });
        assert_eq!(progress.written(), 40);
    }
}
