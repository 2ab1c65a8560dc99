//! Note-event extraction from piano spectrograms and cross-source agreement
//! scoring for transcriptions.
//!
//! The spectral front end (audio decoding, CQT, onset detection) lives outside
//! this crate; it hands over an 88-bin dB spectrogram, a frame rate and onset
//! frame indices.

pub mod agreement;
pub mod config;
pub mod constants;
pub mod error;
pub mod transcription;
pub mod preprocessing {
    pub mod spectrogram;
}
pub mod postprocessing {
    pub mod helpers {
        pub mod ported {
            pub mod librosa;
            pub mod scipy;
        }
    }
    pub mod midi;
    pub mod note_events;
    pub mod note_segments;
    pub mod overlap;
    pub mod peaks;
}

pub use agreement::{
    evaluate_onsets, mean_agreement_by_pair, score, score_pairwise, AgreementResult,
};
pub use config::{AgreementConfig, Config, ExtractionConfig};
pub use error::{Result, TranscribeError};
pub use postprocessing::note_events::extract;
pub use preprocessing::spectrogram::{AnalysisInput, Spectrogram};
pub use transcription::{NoteEvent, TimedNote, Transcription};
