use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::AgreementConfig;
use crate::constants::{ONSET_ROUNDING_S, TIME_EPSILON_S};
use crate::transcription::{TimedNote, Transcription};

/// How well two sources agree on one recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementResult {
    pub source_a: String,
    pub source_b: String,
    pub matches: usize,
    /// Size of the larger note set.
    pub total: usize,
    /// `matches / total`, or 0 when both sets are empty.
    pub agreement_ratio: f64,
}

/// Mean agreement of one source pair over several recordings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMean {
    pub source_a: String,
    pub source_b: String,
    pub recordings: usize,
    pub mean_agreement: f64,
}

/// Set-based onset precision, recall and F1 against a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnsetEvaluation {
    pub onset_precision: f64,
    pub onset_recall: f64,
    pub onset_f1: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// True if two notes are within both tolerances. Both bounds are inclusive.
pub fn notes_match<A: TimedNote, B: TimedNote>(a: &A, b: &B, config: &AgreementConfig) -> bool {
    let pitch_distance = (a.pitch_midi() as i16 - b.pitch_midi() as i16).unsigned_abs();
    let onset_distance = (a.onset_time_s() - b.onset_time_s()).abs();

    pitch_distance <= config.pitch_tolerance as u16
        && onset_distance <= config.time_tolerance_s + TIME_EPSILON_S
}

/// Count the notes of `a` that find a tolerant match in `b`.
///
/// First-fit and one-sided: each note of `a` takes the first matching note of
/// `b`, and a note of `b` may be matched by any number of notes of `a`. Swapping
/// the arguments can change the count.
///
/// # Returns
///
/// * `(matches, max(|a|, |b|))`
pub fn score_notes<A: TimedNote, B: TimedNote>(
    a: &[A],
    b: &[B],
    config: &AgreementConfig,
) -> (usize, usize) {
    let matches = a
        .iter()
        .filter(|note_a| b.iter().any(|note_b| notes_match(*note_a, note_b, config)))
        .count();

    (matches, a.len().max(b.len()))
}

/// Score the agreement of `b` with `a`. See [`score_notes`] for the matching rule.
pub fn score(a: &Transcription, b: &Transcription, config: &AgreementConfig) -> AgreementResult {
    let (matches, total) = score_notes(a.notes(), b.notes(), config);

    AgreementResult {
        source_a: a.source().to_string(),
        source_b: b.source().to_string(),
        matches,
        total,
        agreement_ratio: ratio(matches as f64, total as f64),
    }
}

/// Score every unordered pair `(i, j)` with `i < j`, in input order.
pub fn score_pairwise(transcriptions: &[Transcription], config: &AgreementConfig) -> Vec<AgreementResult> {
    let mut results = Vec::new();
    for (i, a) in transcriptions.iter().enumerate() {
        for b in &transcriptions[i + 1..] {
            let result = score(a, b, config);
            log::info!(
                "{} vs {}: {}/{} ({:.2})",
                result.source_a,
                result.source_b,
                result.matches,
                result.total,
                result.agreement_ratio
            );
            results.push(result);
        }
    }
    results
}

/// Average agreement per `(source_a, source_b)` pair, in first-seen order.
pub fn mean_agreement_by_pair(results: &[AgreementResult]) -> Vec<PairMean> {
    let mut pairs: Vec<(String, String, Vec<f64>)> = Vec::new();

    for result in results {
        match pairs
            .iter_mut()
            .find(|(a, b, _)| *a == result.source_a && *b == result.source_b)
        {
            Some((_, _, ratios)) => ratios.push(result.agreement_ratio),
            None => pairs.push((
                result.source_a.clone(),
                result.source_b.clone(),
                vec![result.agreement_ratio],
            )),
        }
    }

    pairs
        .into_iter()
        .map(|(source_a, source_b, ratios)| PairMean {
            source_a,
            source_b,
            recordings: ratios.len(),
            mean_agreement: ratio(ratios.iter().sum(), ratios.len() as f64),
        })
        .collect()
}

fn onset_keys<N: TimedNote>(notes: &[N]) -> BTreeSet<(u8, i64)> {
    notes
        .iter()
        .map(|n| (n.pitch_midi(), (n.onset_time_s() / ONSET_ROUNDING_S).round() as i64))
        .collect()
}

/// Compare predicted onsets with a reference on `(pitch, onset to 10 ms)` keys.
pub fn evaluate_onsets(predicted: &Transcription, ground_truth: &Transcription) -> OnsetEvaluation {
    let predicted = onset_keys(predicted.notes());
    let expected = onset_keys(ground_truth.notes());

    let true_positives = predicted.intersection(&expected).count();
    let false_positives = predicted.difference(&expected).count();
    let false_negatives = expected.difference(&predicted).count();

    let precision = ratio(true_positives as f64, (true_positives + false_positives) as f64);
    let recall = ratio(true_positives as f64, (true_positives + false_negatives) as f64);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    OnsetEvaluation {
        onset_precision: precision,
        onset_recall: recall,
        onset_f1: f1,
        true_positives,
        false_positives,
        false_negatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::NoteEvent;

    fn note(pitch: u8, onset: f64, offset: f64) -> NoteEvent {
        NoteEvent {
            pitch_midi: pitch,
            onset_time_s: onset,
            offset_time_s: offset,
            velocity: 64,
            confidence: 0.5,
            provenance: "test".to_string(),
        }
    }

    fn transcription(source: &str, notes: &[(u8, f64, f64)]) -> Transcription {
        Transcription::new(
            source,
            notes.iter().map(|&(p, on, off)| note(p, on, off)).collect(),
            None,
        )
    }

    #[test]
    fn empty_sets_score_zero() {
        let empty = Transcription::empty("a", None);
        let result = score(&empty, &Transcription::empty("b", None), &AgreementConfig::default());
        assert_eq!(result.matches, 0);
        assert_eq!(result.total, 0);
        assert_eq!(result.agreement_ratio, 0.0);
    }

    #[test]
    fn one_empty_side() {
        let a = transcription("a", &[(60, 0.0, 0.5)]);
        let result = score(&a, &Transcription::empty("b", None), &AgreementConfig::default());
        assert_eq!((result.matches, result.total), (0, 1));
        assert_eq!(result.agreement_ratio, 0.0);
    }

    #[test]
    fn tolerance_bounds_are_inclusive() {
        let config = AgreementConfig::default();
        assert!(notes_match(&note(60, 1.0, 1.5), &note(61, 1.05, 1.5), &config));
        assert!(notes_match(&note(60, 0.0, 0.5), &note(59, 0.05, 0.5), &config));
        assert!(!notes_match(&note(60, 0.0, 0.5), &note(62, 0.0, 0.5), &config));
        assert!(!notes_match(&note(60, 0.0, 0.5), &note(60, 0.051, 0.5), &config));
    }

    #[test]
    fn one_note_can_match_many() {
        let a = transcription("a", &[(60, 0.0, 0.5), (61, 0.01, 0.5), (59, 0.02, 0.5)]);
        let b = transcription("b", &[(60, 0.0, 0.5)]);
        let result = score(&a, &b, &AgreementConfig::default());
        assert_eq!((result.matches, result.total), (3, 3));
        assert_eq!(result.agreement_ratio, 1.0);
    }

    #[test]
    fn pairwise_covers_each_unordered_pair_once() {
        let sources = vec![
            transcription("a", &[(60, 0.0, 0.5)]),
            transcription("b", &[(60, 0.0, 0.5)]),
            transcription("c", &[]),
        ];
        let results = score_pairwise(&sources, &AgreementConfig::default());
        let pairs: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.source_a.as_str(), r.source_b.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert_eq!(results[0].agreement_ratio, 1.0);
        assert_eq!(results[2].agreement_ratio, 0.0);
    }

    #[test]
    fn pair_means_group_by_sources() {
        let result = |a: &str, b: &str, r: f64| AgreementResult {
            source_a: a.to_string(),
            source_b: b.to_string(),
            matches: 0,
            total: 0,
            agreement_ratio: r,
        };
        let means = mean_agreement_by_pair(&[
            result("x", "y", 0.5),
            result("x", "z", 0.2),
            result("x", "y", 1.0),
        ]);

        assert_eq!(means.len(), 2);
        assert_eq!((means[0].source_a.as_str(), means[0].source_b.as_str()), ("x", "y"));
        assert_eq!(means[0].recordings, 2);
        assert!((means[0].mean_agreement - 0.75).abs() < 1e-12);
        assert!((means[1].mean_agreement - 0.2).abs() < 1e-12);
    }

    #[test]
    fn onset_evaluation_counts() {
        let predicted = transcription("p", &[(60, 0.001, 0.5), (62, 1.0, 1.5), (64, 2.0, 2.5)]);
        let truth = transcription("t", &[(60, 0.0, 0.5), (62, 1.0, 1.5), (65, 3.0, 3.5)]);
        let eval = evaluate_onsets(&predicted, &truth);

        assert_eq!(eval.true_positives, 2);
        assert_eq!(eval.false_positives, 1);
        assert_eq!(eval.false_negatives, 1);
        assert!((eval.onset_precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((eval.onset_recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((eval.onset_f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn onset_evaluation_of_empty_sets() {
        let eval = evaluate_onsets(&Transcription::empty("p", None), &Transcription::empty("t", None));
        assert_eq!(eval.onset_precision, 0.0);
        assert_eq!(eval.onset_recall, 0.0);
        assert_eq!(eval.onset_f1, 0.0);
    }
}
