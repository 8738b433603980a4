use ndarray::{ArrayView2, Axis};

use crate::error::TensorError;
use crate::processing::sentence_ranges;
use crate::tensor::NamedTensor;
use crate::types::HighlightedSentence;

/// Probability above which a token is highlighted.
pub const DEFAULT_HIGHLIGHT_THRESHOLD: f32 = 0.5;

/// Binary label per token (`1` iff `p > threshold`) and the positive count.
pub fn threshold_labels(probabilities: &[f32], threshold: f32) -> (Vec<i64>, i64) {
    let labels: Vec<i64> = probabilities
        .iter()
        .map(|&p| i64::from(p > threshold))
        .collect();
    let count = labels.iter().sum();
    (labels, count)
}

/// Softmax over the last axis of a `[.., tokens, classes]` logits tensor,
/// returning the probability of class 1 for every row. Rank-1 tensors are
/// rejected rather than read as a single row.
pub fn positive_class_probabilities(logits: &NamedTensor) -> Result<Vec<f32>, TensorError> {
    let values = logits
        .data()
        .and_then(|d| d.to_f32_vec())
        .ok_or_else(|| {
            TensorError::InvalidModelOutput(format!(
                "'{}' must hold float logits, got {}",
                logits.name(),
                logits.data_type()
            ))
        })?;

    if logits.shape().len() < 2 {
        return Err(TensorError::InvalidModelOutput(format!(
            "'{}' must be [tokens, classes], shape is {:?}",
            logits.name(),
            logits.shape()
        )));
    }
    let classes = logits.shape().last().copied().unwrap_or(0);
    if classes < 2 {
        return Err(TensorError::InvalidModelOutput(format!(
            "'{}' needs at least 2 classes on its last axis, shape is {:?}",
            logits.name(),
            logits.shape()
        )));
    }
    let rows = values.len() / classes;

    let view = ArrayView2::from_shape((rows, classes), &values).map_err(|e| {
        TensorError::InvalidModelOutput(format!("'{}' is not row-major: {}", logits.name(), e))
    })?;

    Ok(view
        .axis_iter(Axis(0))
        .map(|row| {
            let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
            let denom: f32 = row.iter().map(|&x| (x - max).exp()).sum();
            (row[1] - max).exp() / denom
        })
        .collect())
}

/// Sentences of `context` holding at least one positive context token.
///
/// Tokens up to and including the first separator belong to the question and
/// are skipped, as are tokens with an empty character offset (control
/// tokens). A token belongs to the sentence whose byte range contains its
/// start offset, so abbreviations and decimals inside a sentence never shift
/// the attribution.
pub fn highlighted_sentences(
    labels: &[i64],
    offsets: &[(usize, usize)],
    separator: Option<usize>,
    context: &str,
) -> Vec<HighlightedSentence> {
    let ranges = sentence_ranges(context);
    let scope_start = separator.map_or(0, |sep| sep.saturating_add(1));
    let mut selected: Vec<usize> = labels
        .iter()
        .zip(offsets)
        .skip(scope_start)
        .filter(|(&label, &(start, end))| label == 1 && start < end)
        .filter_map(|(_, &(start, _))| ranges.iter().position(|r| r.contains(&start)))
        .collect();
    selected.sort_unstable();
    selected.dedup();

    selected
        .into_iter()
        .map(|index| HighlightedSentence {
            index,
            text: context[ranges[index].clone()].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorData;

    #[test]
    fn test_threshold_is_strict() {
        let (labels, count) = threshold_labels(&[0.1, 0.6, 0.51, 0.4], DEFAULT_HIGHLIGHT_THRESHOLD);
        assert_eq!(labels, vec![0, 1, 1, 0]);
        assert_eq!(count, 2);

        let (labels, count) = threshold_labels(&[0.5], DEFAULT_HIGHLIGHT_THRESHOLD);
        assert_eq!(labels, vec![0]);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_empty_probabilities() {
        let (labels, count) = threshold_labels(&[], DEFAULT_HIGHLIGHT_THRESHOLD);
        assert!(labels.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_softmax_picks_class_one() {
        let logits = NamedTensor::new(
            "logits",
            vec![3, 2],
            TensorData::Float32(vec![0.0, 0.0, 0.0, 2.0, 5.0, -5.0]),
        )
        .unwrap();
        let probs = positive_class_probabilities(&logits).unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.880_797).abs() < 1e-5);
        assert!(probs[2] < 1e-4);
    }

    #[test]
    fn test_softmax_with_batch_axis_and_large_logits() {
        let logits = NamedTensor::new(
            "logits",
            vec![1, 2, 2],
            TensorData::Float64(vec![1000.0, 1001.0, -1000.0, -1000.0]),
        )
        .unwrap();
        let probs = positive_class_probabilities(&logits).unwrap();
        assert!((probs[0] - 0.731_058_6).abs() < 1e-5);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_rejects_single_class_and_integers() {
        let single = NamedTensor::new("logits", vec![2, 1], TensorData::Float32(vec![0.1, 0.2])).unwrap();
        assert!(positive_class_probabilities(&single).is_err());

        let ints = NamedTensor::new("logits", vec![1, 2], TensorData::Int64(vec![0, 1])).unwrap();
        assert!(positive_class_probabilities(&ints).is_err());
    }

    #[test]
    fn test_softmax_rejects_rank_one_logits() {
        let flat = NamedTensor::vector("logits", TensorData::Float32(vec![0.3; 16]));
        let err = positive_class_probabilities(&flat).unwrap_err();
        assert!(matches!(err, TensorError::InvalidModelOutput(_)));
    }

    #[test]
    fn test_highlighted_sentences_from_context_tokens() {
        // [CLS] what ? [SEP] cats are mammals . dogs bark . [SEP]
        let context = "Cats are mammals. Dogs bark.";
        let offsets = [
            (0, 0), (0, 4), (4, 5), (0, 0), (0, 4), (5, 8), (9, 16), (16, 17), (18, 22), (23, 27), (27, 28), (0, 0),
        ];
        let labels = [1, 1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 1];
        let picked = highlighted_sentences(&labels, &offsets, Some(3), context);
        assert_eq!(
            picked,
            vec![HighlightedSentence {
                index: 1,
                text: "Dogs bark.".to_string()
            }]
        );
    }

    #[test]
    fn test_decimal_point_does_not_shift_sentence() {
        // [CLS] q [SEP] version 1 . 2 shipped . next one . [SEP]
        let context = "Version 1.2 shipped. Next one.";
        let offsets = [
            (0, 0), (0, 1), (0, 0), (0, 7), (8, 9), (9, 10), (10, 11), (12, 19), (19, 20), (21, 25), (26, 29), (29, 30), (0, 0),
        ];
        let mut labels = [0; 13];
        labels[7] = 1;
        labels[12] = 1;
        let picked = highlighted_sentences(&labels, &offsets, Some(2), context);
        assert_eq!(
            picked,
            vec![HighlightedSentence {
                index: 0,
                text: "Version 1.2 shipped.".to_string()
            }]
        );
    }

    #[test]
    fn test_highlighted_sentences_without_separator_or_offsets() {
        let context = "Only one.";
        let picked = highlighted_sentences(&[1, 1], &[(0, 4), (5, 9)], None, context);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].text, "Only one.");

        assert!(highlighted_sentences(&[1, 1], &[], None, context).is_empty());
        assert!(highlighted_sentences(&[1, 1], &[(0, 4), (5, 9)], Some(usize::MAX), context).is_empty());
    }
}
