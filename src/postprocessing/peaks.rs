use std::cmp::Ordering;

use super::helpers::ported::scipy::find_peaks;

/// A pitch bin picked from one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    pub bin_index: usize,
    pub magnitude_db: f32,
}

/// Pick candidate pitch bins from one spectrogram column.
///
/// # Arguments
///
/// * `frame_values` - Level in dB for every pitch bin of the frame.
/// * `min_db` - A peak must be strictly louder than this.
/// * `min_bin_distance` - Peaks closer than this lose to the louder neighbour.
///
/// # Returns
///
/// * Candidates ordered loudest first; equal levels keep ascending bin order.
///   Empty for a silent frame.
pub fn pick_peaks(frame_values: &[f32], min_db: f32, min_bin_distance: usize) -> Vec<PeakCandidate> {
    let mut candidates: Vec<PeakCandidate> = find_peaks(frame_values, min_db, min_bin_distance)
        .into_iter()
        .map(|bin_index| PeakCandidate {
            bin_index,
            magnitude_db: frame_values[bin_index],
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.magnitude_db
            .partial_cmp(&a.magnitude_db)
            .unwrap_or(Ordering::Equal)
            .then(a.bin_index.cmp(&b.bin_index))
    });

    candidates
}
