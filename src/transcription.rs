use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_VELOCITY, MAX_MIDI_PITCH, MAX_VELOCITY, MIN_VELOCITY,
};
use crate::error::{Result, TranscribeError};

/// Anything that can be scored for agreement: a pitch and a time span.
pub trait TimedNote {
    fn pitch_midi(&self) -> u8;
    fn onset_time_s(&self) -> f64;
    fn offset_time_s(&self) -> f64;
}

/// One played note. Flat record, ready for any tabular or MIDI writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch_midi: u8,
    pub onset_time_s: f64,
    pub offset_time_s: f64,
    pub velocity: u8,
    /// Not a calibrated probability for heuristic sources.
    pub confidence: f32,
    pub provenance: String,
}

impl NoteEvent {
    pub fn duration_s(&self) -> f64 {
        self.offset_time_s - self.onset_time_s
    }

    /// True if `time_s` falls inside `[onset, offset)`.
    pub fn contains(&self, time_s: f64) -> bool {
        self.onset_time_s <= time_s && time_s < self.offset_time_s
    }
}

impl TimedNote for NoteEvent {
    fn pitch_midi(&self) -> u8 {
        self.pitch_midi
    }

    fn onset_time_s(&self) -> f64 {
        self.onset_time_s
    }

    fn offset_time_s(&self) -> f64 {
        self.offset_time_s
    }
}

/// An immutable, onset-ordered set of notes from a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    source: String,
    notes: Vec<NoteEvent>,
    frame_rate: Option<f64>,
    pedals: Vec<Value>,
}

impl Transcription {
    /// Notes are ordered by onset, then pitch. The sort is stable.
    pub fn new(source: impl Into<String>, mut notes: Vec<NoteEvent>, frame_rate: Option<f64>) -> Self {
        notes.sort_by(|a, b| {
            a.onset_time_s
                .total_cmp(&b.onset_time_s)
                .then(a.pitch_midi.cmp(&b.pitch_midi))
        });

        Transcription {
            source: source.into(),
            notes,
            frame_rate,
            pedals: Vec::new(),
        }
    }

    /// Attach pedal events from an external source. They are carried through
    /// the interchange format untouched and play no part in scoring.
    pub fn with_pedals(mut self, pedals: Vec<Value>) -> Self {
        self.pedals = pedals;
        self
    }

    pub fn pedals(&self) -> &[Value] {
        &self.pedals
    }

    pub fn empty(source: impl Into<String>, frame_rate: Option<f64>) -> Self {
        Self::new(source, Vec::new(), frame_rate)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Frames per second of the grid the notes were extracted on, if known.
    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn summary(&self) -> TranscriptionSummary {
        let avg_confidence = if self.notes.is_empty() {
            0.0
        } else {
            self.notes.iter().map(|n| n.confidence as f64).sum::<f64>() / self.notes.len() as f64
        };

        let duration_s = self
            .notes
            .iter()
            .map(|n| n.offset_time_s)
            .fold(0.0, f64::max);

        TranscriptionSummary {
            source: self.source.clone(),
            num_notes: self.notes.len(),
            avg_confidence,
            duration_s,
        }
    }

    pub fn to_document(&self) -> TranscriptionDocument {
        TranscriptionDocument {
            model: self.source.clone(),
            notes: self
                .notes
                .iter()
                .enumerate()
                .map(|(i, note)| NoteRecord {
                    id: Some(format!("{}_{}", self.source, i)),
                    pitch_midi: note.pitch_midi as i64,
                    onset_time_s: note.onset_time_s,
                    offset_time_s: note.offset_time_s,
                    velocity: Some(note.velocity as i64),
                    confidence: Some(note.confidence),
                    model_provenance: vec![note.provenance.clone()],
                })
                .collect(),
            frame_rate: self.frame_rate,
            pedals: self.pedals.clone(),
            metadata: DocumentMetadata {
                num_notes: self.notes.len(),
            },
        }
    }

    /// Validate an interchange document and build a transcription from it.
    ///
    /// Missing velocity and confidence fall back to defaults; out-of-range
    /// values are clamped. Pitch and timing violations are errors.
    pub fn from_document(document: TranscriptionDocument) -> Result<Self> {
        let source = document.model;
        let notes = document
            .notes
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_note_event(index, &source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(source, notes, document.frame_rate).with_pedals(document.pedals))
    }

    pub fn read_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_document(serde_json::from_str(&contents)?)
    }

    pub fn write_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.to_document())?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Per-source totals for comparison tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionSummary {
    pub source: String,
    pub num_notes: usize,
    pub avg_confidence: f64,
    /// Latest offset in the transcription.
    pub duration_s: f64,
}

/// Standard JSON interchange format shared by every transcription source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionDocument {
    pub model: String,
    pub notes: Vec<NoteRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Opaque pedal events, kept so documents round-trip.
    #[serde(default)]
    pub pedals: Vec<Value>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub num_notes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pitch_midi: i64,
    pub onset_time_s: f64,
    pub offset_time_s: f64,
    #[serde(default)]
    pub velocity: Option<i64>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub model_provenance: Vec<String>,
}

impl NoteRecord {
    fn into_note_event(self, index: usize, source: &str) -> Result<NoteEvent> {
        let invalid = |reason: String| TranscribeError::InvalidNote { index, reason };

        if !(0..=MAX_MIDI_PITCH as i64).contains(&self.pitch_midi) {
            return Err(invalid(format!("pitch {} is outside 0..=127", self.pitch_midi)));
        }
        if !self.onset_time_s.is_finite() || self.onset_time_s < 0.0 {
            return Err(invalid(format!("onset {} is not a non-negative time", self.onset_time_s)));
        }
        if !self.offset_time_s.is_finite() || self.offset_time_s < self.onset_time_s {
            return Err(invalid(format!(
                "offset {} is before onset {}",
                self.offset_time_s, self.onset_time_s
            )));
        }

        let raw_velocity = self.velocity.unwrap_or(DEFAULT_VELOCITY as i64);
        let velocity = raw_velocity.clamp(MIN_VELOCITY as i64, MAX_VELOCITY as i64) as u8;
        if velocity as i64 != raw_velocity {
            log::warn!("note {}: velocity {} clamped to {}", index, raw_velocity, velocity);
        }

        let raw_confidence = self.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let confidence = if raw_confidence.is_nan() { 0.0 } else { raw_confidence.clamp(0.0, 1.0) };
        if confidence != raw_confidence {
            log::warn!("note {}: confidence {} clamped to {}", index, raw_confidence, confidence);
        }

        let provenance = self
            .model_provenance
            .into_iter()
            .next()
            .unwrap_or_else(|| source.to_string());

        Ok(NoteEvent {
            pitch_midi: self.pitch_midi as u8,
            onset_time_s: self.onset_time_s,
            offset_time_s: self.offset_time_s,
            velocity,
            confidence,
            provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, onset: f64, offset: f64) -> NoteEvent {
        NoteEvent {
            pitch_midi: pitch,
            onset_time_s: onset,
            offset_time_s: offset,
            velocity: 80,
            confidence: 0.5,
            provenance: "test".to_string(),
        }
    }

    #[test]
    fn notes_are_ordered_by_onset_then_pitch() {
        let t = Transcription::new(
            "test",
            vec![note(64, 1.0, 1.5), note(62, 0.0, 0.5), note(60, 1.0, 1.5)],
            None,
        );
        let order: Vec<u8> = t.notes().iter().map(|n| n.pitch_midi).collect();
        assert_eq!(order, vec![62, 60, 64]);
    }

    #[test]
    fn summary_of_empty_transcription() {
        let summary = Transcription::empty("none", None).summary();
        assert_eq!(summary.num_notes, 0);
        assert_eq!(summary.avg_confidence, 0.0);
        assert_eq!(summary.duration_s, 0.0);
    }

    #[test]
    fn document_fills_defaults() {
        let document: TranscriptionDocument = serde_json::from_str(
            r#"{"model": "basic_pitch", "notes": [
                {"pitch_midi": 60, "onset_time_s": 0.5, "offset_time_s": 1.0},
                {"pitch_midi": 62, "onset_time_s": 0.1, "offset_time_s": 0.2, "velocity": 300}
            ]}"#,
        )
        .unwrap();
        let t = Transcription::from_document(document).unwrap();

        assert_eq!(t.source(), "basic_pitch");
        assert_eq!(t.notes()[0].pitch_midi, 62);
        assert_eq!(t.notes()[0].velocity, 127);
        assert_eq!(t.notes()[1].velocity, 64);
        assert_eq!(t.notes()[1].confidence, 0.5);
        assert_eq!(t.notes()[1].provenance, "basic_pitch");
    }

    #[test]
    fn document_rejects_reversed_note() {
        let document: TranscriptionDocument = serde_json::from_str(
            r#"{"model": "m", "notes": [{"pitch_midi": 60, "onset_time_s": 1.0, "offset_time_s": 0.5}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Transcription::from_document(document).unwrap_err(),
            TranscribeError::InvalidNote { index: 0, .. }
        ));
    }

    #[test]
    fn document_rejects_pitch_out_of_range() {
        let document: TranscriptionDocument = serde_json::from_str(
            r#"{"model": "m", "notes": [{"pitch_midi": 128, "onset_time_s": 0.0, "offset_time_s": 0.5}]}"#,
        )
        .unwrap();
        assert!(Transcription::from_document(document).is_err());
    }

    #[test]
    fn pedals_survive_a_round_trip() {
        let document: TranscriptionDocument = serde_json::from_str(
            r#"{"model": "piano_transformer", "notes": [],
                "pedals": [{"onset_time_s": 0.0, "offset_time_s": 1.5, "type": "sustain"}]}"#,
        )
        .unwrap();
        let t = Transcription::from_document(document).unwrap();
        assert_eq!(t.pedals().len(), 1);
        assert_eq!(t.pedals()[0]["type"], "sustain");

        let written = serde_json::to_value(t.to_document()).unwrap();
        assert_eq!(written["pedals"][0]["offset_time_s"], 1.5);

        let missing: TranscriptionDocument =
            serde_json::from_str(r#"{"model": "m", "notes": []}"#).unwrap();
        assert!(Transcription::from_document(missing).unwrap().pedals().is_empty());
    }

    #[test]
    fn document_ids_carry_source() {
        let t = Transcription::new("spectral_peaks", vec![note(60, 0.0, 0.5)], Some(43.0));
        let document = t.to_document();
        assert_eq!(document.notes[0].id.as_deref(), Some("spectral_peaks_0"));
        assert_eq!(document.metadata.num_notes, 1);
        assert_eq!(document.frame_rate, Some(43.0));
    }
}
