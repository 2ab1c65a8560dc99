use std::{fs, path::Path};

use ndarray::{Array2, ArrayView1, Axis};
use serde::Deserialize;

use crate::constants::{DEFAULT_HOP_LENGTH, DEFAULT_SAMPLE_RATE, N_PITCH_BINS};
use crate::error::{Result, TranscribeError};
use crate::postprocessing::helpers::ported::librosa::frame_rate;

/// Magnitude spectrogram in dB, indexed `[pitch_bin][frame]`, one semitone
/// bin per piano key starting at A0.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: Array2<f32>,
}

impl Spectrogram {
    /// Wrap a `(pitch_bins, frames)` array.
    ///
    /// An array with no rows is accepted as an empty spectrogram. Anything
    /// else must have exactly [`N_PITCH_BINS`] rows, even with zero frames.
    pub fn new(data: Array2<f32>) -> Result<Self> {
        if data.nrows() != 0 && data.nrows() != N_PITCH_BINS {
            return Err(TranscribeError::InvalidInputShape {
                expected_bins: N_PITCH_BINS,
                actual_bins: data.nrows(),
            });
        }
        Ok(Spectrogram { data })
    }

    /// Build from nested rows, one row per pitch bin.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_frames = rows.first().map_or(0, Vec::len);

        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_frames) {
            return Err(TranscribeError::RaggedSpectrogram {
                row,
                expected_frames: n_frames,
                actual_frames: bad.len(),
            });
        }

        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n_rows, n_frames), flat).map_err(|_| {
            TranscribeError::InvalidInputShape {
                expected_bins: N_PITCH_BINS,
                actual_bins: n_rows,
            }
        })?;

        Self::new(data)
    }

    pub fn n_bins(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_frames(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All bins of one analysis frame.
    pub fn column(&self, frame: usize) -> Result<ArrayView1<'_, f32>> {
        self.check_frame(frame)?;
        Ok(self.data.index_axis(Axis(1), frame))
    }

    /// Level of one bin in one frame.
    pub fn value(&self, bin: usize, frame: usize) -> f32 {
        self.data[[bin, frame]]
    }

    pub fn check_frame(&self, frame: usize) -> Result<()> {
        if frame >= self.n_frames() {
            return Err(TranscribeError::OnsetOutOfRange {
                onset_frame: frame,
                n_frames: self.n_frames(),
            });
        }
        Ok(())
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_hop_length() -> u32 {
    DEFAULT_HOP_LENGTH
}

/// Numeric output of the spectral-analysis stage, as handed over in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisInput {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_hop_length")]
    pub hop_length: u32,
    /// Rows are pitch bins, columns are frames.
    pub spectrogram_db: Vec<Vec<f32>>,
    pub onset_frames: Vec<usize>,
}

impl AnalysisInput {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn frame_rate(&self) -> Result<f64> {
        frame_rate(self.sample_rate, self.hop_length)
    }

    /// Split into a validated spectrogram, the onset frames and the frame rate.
    pub fn into_parts(self) -> Result<(Spectrogram, Vec<usize>, f64)> {
        let frame_rate = self.frame_rate()?;
        let spectrogram = Spectrogram::from_rows(self.spectrogram_db)?;
        Ok((spectrogram, self.onset_frames, frame_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_bin_count() {
        let err = Spectrogram::new(Array2::zeros((12, 4))).unwrap_err();
        assert!(matches!(
            err,
            TranscribeError::InvalidInputShape { expected_bins: 88, actual_bins: 12 }
        ));
    }

    #[test]
    fn empty_array_is_allowed() {
        assert!(Spectrogram::new(Array2::zeros((0, 0))).unwrap().is_empty());
        assert!(Spectrogram::from_rows(vec![]).unwrap().is_empty());
        assert!(Spectrogram::new(Array2::zeros((N_PITCH_BINS, 0))).unwrap().is_empty());
    }

    #[test]
    fn wrong_bin_count_without_frames_is_rejected() {
        let err = Spectrogram::new(Array2::zeros((12, 0))).unwrap_err();
        assert!(matches!(
            err,
            TranscribeError::InvalidInputShape { expected_bins: 88, actual_bins: 12 }
        ));
        assert!(Spectrogram::from_rows(vec![Vec::new(); 12]).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut rows = vec![vec![0.0; 3]; N_PITCH_BINS];
        rows[5].pop();
        let err = Spectrogram::from_rows(rows).unwrap_err();
        assert!(matches!(err, TranscribeError::RaggedSpectrogram { row: 5, .. }));
    }

    #[test]
    fn column_checks_range() {
        let spec = Spectrogram::new(Array2::from_elem((N_PITCH_BINS, 2), -80.0)).unwrap();
        assert_eq!(spec.column(1).unwrap().len(), N_PITCH_BINS);
        assert!(matches!(
            spec.column(2).unwrap_err(),
            TranscribeError::OnsetOutOfRange { onset_frame: 2, n_frames: 2 }
        ));
    }

    #[test]
    fn analysis_input_uses_default_grid() {
        let input: AnalysisInput =
            serde_json::from_str(r#"{"spectrogram_db": [], "onset_frames": []}"#).unwrap();
        let (spec, onsets, fr) = input.into_parts().unwrap();
        assert!(spec.is_empty());
        assert!(onsets.is_empty());
        assert!((fr - 22050.0 / 512.0).abs() < 1e-12);
    }
}
