use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::preprocessing::spectrogram::Spectrogram;
use crate::transcription::{NoteEvent, Transcription};

use super::helpers::ported::librosa::validate_frame_rate;
use super::note_segments::segment;
use super::overlap::filter_overlaps;

/// Extract note events from a dB spectrogram at externally detected onsets.
///
/// Every onset frame is peak-picked and segmented in the order given. The
/// candidates of the whole recording are then stably sorted by onset and
/// overlap-filtered once, so overlaps are resolved across onset frames too.
///
/// # Arguments
///
/// * `spectrogram` - Validated `[pitch_bin][frame]` spectrogram in dB.
/// * `onset_frames` - Onset frame indices into the spectrogram.
/// * `frame_rate` - Frames per second of the spectrogram.
/// * `config` - Extraction settings; `config.source` becomes the provenance.
///
/// # Returns
///
/// * The transcription. An empty spectrogram or an empty onset list gives an
///   empty transcription; an out-of-range onset or a bad frame rate is an error.
pub fn extract(
    spectrogram: &Spectrogram,
    onset_frames: &[usize],
    frame_rate: f64,
    config: &ExtractionConfig,
) -> Result<Transcription> {
    let frame_rate = validate_frame_rate(frame_rate)?;

    if spectrogram.is_empty() || onset_frames.is_empty() {
        log::debug!("nothing to extract for {}", config.source);
        return Ok(Transcription::empty(config.source.clone(), Some(frame_rate)));
    }

    for &onset_frame in onset_frames {
        spectrogram.check_frame(onset_frame)?;
    }

    let mut candidates = onset_frames
        .iter()
        .map(|&onset_frame| segment(onset_frame, spectrogram, frame_rate, config))
        .collect::<Result<Vec<Vec<NoteEvent>>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    candidates.sort_by(|a, b| a.onset_time_s.total_cmp(&b.onset_time_s));
    let kept = filter_overlaps(&candidates);

    log::info!(
        "{}: {} notes from {} candidates at {} onsets",
        config.source,
        kept.len(),
        candidates.len(),
        onset_frames.len()
    );

    Ok(Transcription::new(config.source.clone(), kept, Some(frame_rate)))
}
