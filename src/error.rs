use thiserror::Error;

/// Errors surfaced by extraction, scoring and the interchange formats.
///
/// Every operation is deterministic, so none of these are worth retrying
/// with the same input.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// The spectrogram does not have one row per piano key.
    #[error("spectrogram must have {expected_bins} pitch bins, got {actual_bins}")]
    InvalidInputShape {
        expected_bins: usize,
        actual_bins: usize,
    },

    /// A spectrogram row has a different frame count than the first row.
    #[error("spectrogram row {row} has {actual_frames} frames, expected {expected_frames}")]
    RaggedSpectrogram {
        row: usize,
        expected_frames: usize,
        actual_frames: usize,
    },

    /// An onset frame index points past the end of the frame axis.
    #[error("onset frame {onset_frame} is out of range for {n_frames} frames")]
    OnsetOutOfRange { onset_frame: usize, n_frames: usize },

    #[error("frame rate must be finite and positive, got {0}")]
    InvalidFrameRate(f64),

    /// A note read from an external transcription breaks the note data model.
    #[error("note {index} is invalid: {reason}")]
    InvalidNote { index: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TranscribeError>;
