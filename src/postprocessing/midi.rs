use midly::num::u7;
use midly::Format;
use midly::Header;
use midly::MetaMessage;
use midly::MidiMessage;
use midly::Smf;
use midly::Timing;
use midly::Track;
use midly::TrackEvent;
use midly::TrackEventKind;

use std::io::Cursor;

use crate::constants::TICKS_PER_BEAT;
use crate::error::Result;
use crate::transcription::{NoteEvent, Transcription};

#[derive(Debug, Clone)]
struct TrackEventAbsolute<'a> {
    tick: u32,
    kind: TrackEventKind<'a>,
}

fn is_note_off(kind: &TrackEventKind<'_>) -> bool {
    matches!(
        kind,
        TrackEventKind::Midi {
            message: MidiMessage::NoteOff { .. },
            ..
        }
    )
}

fn seconds_to_tick(seconds: f64, ticks_per_second: f64) -> u32 {
    (seconds * ticks_per_second).round().max(0.0) as u32
}

/// Build delta-timed NoteOn/NoteOff events for a set of notes.
///
/// Events are ordered by tick; at equal ticks a NoteOff comes before a NoteOn
/// so back-to-back notes of one pitch do not cut each other short.
pub fn generate_ordered_midi_events(notes: &[NoteEvent], ticks_per_second: f64) -> Vec<TrackEvent<'static>> {
    let mut track_events_absolute: Vec<TrackEventAbsolute> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let key = u7::new(note.pitch_midi);
        let vel = u7::new(note.velocity);

        track_events_absolute.push(TrackEventAbsolute {
            tick: seconds_to_tick(note.onset_time_s, ticks_per_second),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn { key, vel },
            },
        });

        track_events_absolute.push(TrackEventAbsolute {
            tick: seconds_to_tick(note.offset_time_s, ticks_per_second),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff { key, vel },
            },
        });
    }

    track_events_absolute.sort_by(|a, b| {
        a.tick
            .cmp(&b.tick)
            .then(is_note_off(&b.kind).cmp(&is_note_off(&a.kind)))
    });

    let mut previous_tick = 0;
    track_events_absolute
        .into_iter()
        .map(|event| {
            let delta = event.tick - previous_tick;
            previous_tick = event.tick;
            TrackEvent {
                delta: delta.into(),
                kind: event.kind,
            }
        })
        .collect()
}

/// Generate MIDI file data from a transcription.
///
/// # Arguments
///
/// * `transcription` - Notes to write, all on channel 0.
/// * `beats_per_minute` - Tempo written to the file and used for tick timing.
///
/// # Returns
///
/// * The bytes of a single-track Standard MIDI File.
pub fn generate_midi_file_data(transcription: &Transcription, beats_per_minute: u32) -> Result<Vec<u8>> {
    let beats_per_minute = beats_per_minute.max(1);
    let timing = Timing::Metrical(TICKS_PER_BEAT.into());
    let ticks_per_second = (TICKS_PER_BEAT as f64) * (beats_per_minute as f64) / 60.0;

    let mut smf = Smf::new(Header {
        format: Format::SingleTrack,
        timing,
    });
    let mut track = Track::new();

    // Set tempo to match the BPM
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo((60_000_000 / beats_per_minute).into())),
    });

    track.extend(generate_ordered_midi_events(transcription.notes(), ticks_per_second));

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    smf.tracks.push(track);

    let mut buffer = Vec::new();
    smf.write_std(&mut Cursor::new(&mut buffer))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, onset: f64, offset: f64) -> NoteEvent {
        NoteEvent {
            pitch_midi: pitch,
            onset_time_s: onset,
            offset_time_s: offset,
            velocity: 90,
            confidence: 0.5,
            provenance: "test".to_string(),
        }
    }

    #[test]
    fn note_off_precedes_note_on_at_same_tick() {
        // 120 bpm at 480 ticks per beat is 960 ticks per second
        let events = generate_ordered_midi_events(&[note(60, 0.0, 0.5), note(60, 0.5, 1.0)], 960.0);
        let deltas: Vec<u32> = events.iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![0, 480, 0, 480]);
        assert!(is_note_off(&events[1].kind));
        assert!(!is_note_off(&events[2].kind));
    }

    #[test]
    fn file_parses_back() {
        let t = Transcription::new("test", vec![note(60, 0.0, 0.5), note(64, 0.25, 0.75)], None);
        let bytes = generate_midi_file_data(&t, 120).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.tracks.len(), 1);
        let note_ons = smf.tracks[0]
            .iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
            .count();
        assert_eq!(note_ons, 2);
    }
}
