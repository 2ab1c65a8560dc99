/* PORTED SCIPY FUNCTIONS */

use std::cmp::Ordering;

/// Find the indices of local maxima in a 1D signal.
/// A Rust implementation of the core of scipy.signal.find_peaks
/// https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.find_peaks.html
///
/// A sample is a local maximum if it is larger than its left neighbour and
/// larger than the first differing sample to its right. Flat peaks report the
/// middle sample (rounded down). The first and last samples are never peaks.
///
/// # Arguments
///
/// * `x` - The signal.
///
/// # Returns
///
/// * Indices of the local maxima in ascending order.
pub fn local_maxima_1d(x: &[f32]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }

            if x[i_ahead] < x[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Drop peaks closer than `distance` samples to a higher peak.
///
/// Peaks are visited from highest to lowest (lower index first on equal
/// height); each surviving peak removes its weaker neighbours inside the
/// distance.
///
/// # Arguments
///
/// * `peaks` - Peak indices in ascending order.
/// * `x` - The signal the peaks were taken from.
/// * `distance` - Minimal horizontal distance between kept peaks.
///
/// # Returns
///
/// * The kept peak indices in ascending order.
pub fn select_by_peak_distance(peaks: &[usize], x: &[f32], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let mut by_priority: Vec<usize> = (0..peaks.len()).collect();
    by_priority.sort_by(|&a, &b| {
        x[peaks[b]]
            .partial_cmp(&x[peaks[a]])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; peaks.len()];
    for &j in by_priority.iter() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep.iter())
        .filter_map(|(&peak, &kept)| if kept { Some(peak) } else { None })
        .collect()
}

/// Find peaks above a height with a minimal spacing, like
/// `scipy.signal.find_peaks(x, height=height, distance=distance)` except that
/// the height bound is exclusive.
pub fn find_peaks(x: &[f32], height: f32, distance: usize) -> Vec<usize> {
    let peaks: Vec<usize> = local_maxima_1d(x)
        .into_iter()
        .filter(|&peak| x[peak] > height)
        .collect();

    select_by_peak_distance(&peaks, x, distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_never_peaks() {
        assert_eq!(local_maxima_1d(&[5.0, 1.0, 0.0, 1.0, 5.0]), Vec::<usize>::new());
        assert_eq!(local_maxima_1d(&[1.0, 2.0]), Vec::<usize>::new());
    }

    #[test]
    fn plateau_reports_middle_sample() {
        assert_eq!(local_maxima_1d(&[0.0, 1.0, 1.0, 1.0, 0.0]), vec![2]);
        assert_eq!(local_maxima_1d(&[0.0, 1.0, 1.0, 0.0]), vec![1]);
        // a plateau rising again is not a peak
        assert_eq!(local_maxima_1d(&[0.0, 1.0, 1.0, 2.0, 0.0]), vec![3]);
    }

    #[test]
    fn distance_keeps_the_higher_peak() {
        let x = [0.0, 3.0, 0.0, 5.0, 0.0, 4.0, 0.0];
        assert_eq!(find_peaks(&x, -1.0, 1), vec![1, 3, 5]);
        assert_eq!(find_peaks(&x, -1.0, 3), vec![3]);
        assert_eq!(find_peaks(&x, 3.5, 1), vec![3, 5]);
    }

    #[test]
    fn height_bound_is_exclusive() {
        let x = [0.0, 2.0, 0.0];
        assert!(find_peaks(&x, 2.0, 1).is_empty());
        assert_eq!(find_peaks(&x, 1.999, 1), vec![1]);
    }
}
