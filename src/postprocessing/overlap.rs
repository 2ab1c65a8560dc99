use crate::constants::MAX_MIDI_PITCH;
use crate::transcription::NoteEvent;

/// Drop notes that start while an earlier kept note of the same pitch is
/// still sounding.
///
/// # Arguments
///
/// * `candidates` - Notes ordered by ascending onset.
///
/// # Returns
///
/// * The kept notes, in input order. Earlier onsets always win.
pub fn filter_overlaps(candidates: &[NoteEvent]) -> Vec<NoteEvent> {
    let mut sounding: Vec<Vec<&NoteEvent>> = vec![Vec::new(); MAX_MIDI_PITCH as usize + 1];
    let mut kept = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let same_pitch = &mut sounding[candidate.pitch_midi as usize];
        if same_pitch.iter().any(|existing| existing.contains(candidate.onset_time_s)) {
            continue;
        }
        same_pitch.push(candidate);
        kept.push(candidate.clone());
    }

    log::debug!("overlap filter kept {} of {} notes", kept.len(), candidates.len());
    kept
}
