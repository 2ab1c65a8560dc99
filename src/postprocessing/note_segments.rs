use crate::config::ExtractionConfig;
use crate::constants::{MAX_VELOCITY, MIDI_OFFSET, MIN_VELOCITY};
use crate::error::Result;
use crate::preprocessing::spectrogram::Spectrogram;
use crate::transcription::NoteEvent;

use super::helpers::ported::librosa::{duration_to_frames, duration_to_frames_ceil, frames_to_time};
use super::peaks::pick_peaks;

/// Map a peak level in dB linearly onto MIDI velocity, clamped to 1..=127.
pub fn velocity_from_db(magnitude_db: f32, config: &ExtractionConfig) -> u8 {
    let raw = (magnitude_db - config.velocity_floor_db) * config.velocity_scale;
    let velocity = raw.clamp(MIN_VELOCITY as f32, MAX_VELOCITY as f32) as u8;
    velocity.max(MIN_VELOCITY)
}

/// Find the frame at which a note started at `onset_frame` in `bin` ends.
///
/// The first frame after the onset whose level drops below `decay_db` ends the
/// note. Without a decay inside `max_duration_s` the note lasts
/// `default_duration_s`. The result is at least `min_duration_s` after the
/// onset. Fallback offsets may lie past the last frame.
pub fn estimate_offset_frame(
    spectrogram: &Spectrogram,
    bin: usize,
    onset_frame: usize,
    frame_rate: f64,
    config: &ExtractionConfig,
) -> usize {
    let scan_end = onset_frame
        .saturating_add(duration_to_frames(config.max_duration_s, frame_rate))
        .min(spectrogram.n_frames());

    let offset_frame = (onset_frame + 1..scan_end)
        .find(|&frame| spectrogram.value(bin, frame) < config.decay_db)
        .unwrap_or_else(|| {
            onset_frame.saturating_add(duration_to_frames(config.default_duration_s, frame_rate))
        });

    let min_frames = duration_to_frames_ceil(config.min_duration_s, frame_rate);
    offset_frame.max(onset_frame.saturating_add(min_frames))
}

/// Turn every spectral peak at an onset frame into a candidate note.
///
/// # Arguments
///
/// * `onset_frame` - Frame index of the detected onset.
/// * `spectrogram` - Full dB spectrogram, `[pitch_bin][frame]`.
/// * `frame_rate` - Frames per second of the spectrogram.
/// * `config` - Peak, decay and velocity settings.
///
/// # Returns
///
/// * One unfiltered note per peak, loudest first, or `OnsetOutOfRange`.
pub fn segment(
    onset_frame: usize,
    spectrogram: &Spectrogram,
    frame_rate: f64,
    config: &ExtractionConfig,
) -> Result<Vec<NoteEvent>> {
    let column = spectrogram.column(onset_frame)?.to_vec();
    let peaks = pick_peaks(&column, config.min_db, config.min_bin_distance);
    log::debug!("onset frame {}: {} peaks", onset_frame, peaks.len());

    let onset_time_s = frames_to_time(onset_frame, frame_rate);

    Ok(peaks
        .iter()
        .map(|peak| {
            let offset_frame =
                estimate_offset_frame(spectrogram, peak.bin_index, onset_frame, frame_rate, config);

            NoteEvent {
                pitch_midi: MIDI_OFFSET + peak.bin_index as u8,
                onset_time_s,
                offset_time_s: frames_to_time(offset_frame, frame_rate),
                velocity: velocity_from_db(peak.magnitude_db, config),
                confidence: config.confidence,
                provenance: config.source.clone(),
            }
        })
        .collect())
}
