//! Demuxer seeking shared by the video and audio readers

use crate::{Error, Result};
use ffmpeg_next as ffmpeg;

/// Seeks `input` to the keyframe at or before `target_secs`.
///
/// A backward-bounded seek keeps every frame from `target_secs` onwards in the
/// decode stream; the caller discards the pre-roll by timestamp. A target of
/// zero or less is a rewind to the start of the file.
pub fn seek_to_secs(
    input: &mut ffmpeg::format::context::Input,
    target_secs: f64,
    label: &str,
) -> Result<()> {
    let seek_ts = (target_secs.max(0.0) * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
    log::debug!("[{label}] seeking to {target_secs:.3}s");
    input.seek(seek_ts, ..=seek_ts).map_err(|e| {
        log::warn!("[{label}] seek to {target_secs:.3}s failed: {e}");
        Error::DecodeFailure(format!("{label}: seek to {target_secs:.3}s failed: {e}"))
    })
}
