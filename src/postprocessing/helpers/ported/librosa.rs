/* PORTED LIBROSA FUNCTIONS */

use crate::error::{Result, TranscribeError};

/// Frames per second of an analysis grid.
///
/// # Arguments
///
/// * `sample_rate` - Audio sample rate in Hz.
/// * `hop_length` - Samples between successive frames.
///
/// # Returns
///
/// * The frame rate, or `InvalidFrameRate` if either argument is zero.
pub fn frame_rate(sample_rate: u32, hop_length: u32) -> Result<f64> {
    if hop_length == 0 {
        return Err(TranscribeError::InvalidFrameRate(f64::INFINITY));
    }
    validate_frame_rate(sample_rate as f64 / hop_length as f64)
}

/// Rejects frame rates that cannot convert between frames and seconds.
pub fn validate_frame_rate(frame_rate: f64) -> Result<f64> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(frame_rate)
    } else {
        Err(TranscribeError::InvalidFrameRate(frame_rate))
    }
}

/// Converts a frame index to seconds. Equivalent to librosa.frames_to_time.
///
/// # Arguments
///
/// * `frame` - Frame index.
/// * `frame_rate` - Frames per second.
///
/// # Returns
///
/// * The start time of the frame in seconds.
pub fn frames_to_time(frame: usize, frame_rate: f64) -> f64 {
    frame as f64 / frame_rate
}

/// Number of whole frames covered by a duration, truncated toward zero.
pub fn duration_to_frames(duration_s: f64, frame_rate: f64) -> usize {
    (duration_s * frame_rate).max(0.0) as usize
}

/// Number of frames needed to cover at least `duration_s`.
///
/// Products within 1e-9 of a whole frame count as that frame, so
/// `0.3 s * 10 fps` is 3 frames rather than 4.
pub fn duration_to_frames_ceil(duration_s: f64, frame_rate: f64) -> usize {
    (duration_s * frame_rate - 1e-9).max(0.0).ceil() as usize
}
