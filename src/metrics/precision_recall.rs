//! Precision-recall curves and 101-point interpolation.

use serde::Serialize;

/// Number of equally spaced recall levels sampled in [0, 1].
pub const RECALL_POINTS: usize = 101;

/// Cumulative precision and recall along a ranked detection sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
}

impl PrecisionRecallCurve {
    pub fn len(&self) -> usize {
        self.precision.len()
    }

    pub fn is_empty(&self) -> bool {
        self.precision.is_empty()
    }

    /// Recall reached after the last detection, 0.0 for an empty curve.
    pub fn final_recall(&self) -> f64 {
        self.recall.last().copied().unwrap_or(0.0)
    }
}

/// Calculate the precision-recall curve from ranked true/false-positive flags.
///
/// # Arguments
///
/// * `is_true_positive` - One flag per detection, sorted by confidence (descending)
/// * `num_ground_truth` - Total number of non-ignored ground truth instances
///
/// Recall is reported as 0.0 when there is no ground truth.
///
/// # Example
///
/// ```
/// use coco_detection_eval::metrics::precision_recall::calculate_precision_recall_curve;
///
/// let curve = calculate_precision_recall_curve(&[true, false, true], 4);
/// assert_eq!(curve.precision[1], 0.5);
/// assert_eq!(curve.recall[2], 0.5);
/// ```
pub fn calculate_precision_recall_curve(
    is_true_positive: &[bool],
    num_ground_truth: usize,
) -> PrecisionRecallCurve {
    let mut curve = PrecisionRecallCurve {
        precision: Vec::with_capacity(is_true_positive.len()),
        recall: Vec::with_capacity(is_true_positive.len()),
    };
    let mut tp = 0usize;
    let mut fp = 0usize;

    for &is_tp in is_true_positive {
        if is_tp {
            tp += 1;
        } else {
            fp += 1;
        }

        curve.precision.push(tp as f64 / (tp + fp) as f64);
        curve.recall.push(if num_ground_truth > 0 {
            tp as f64 / num_ground_truth as f64
        } else {
            0.0
        });
    }

    curve
}

/// Replace each precision with the maximum precision at any later point.
///
/// Since recall never decreases along the ranked sequence, this is the
/// maximum precision at equal-or-greater recall.
pub fn precision_envelope(precision: &[f64]) -> Vec<f64> {
    let mut envelope = precision.to_vec();
    for i in (0..envelope.len().saturating_sub(1)).rev() {
        envelope[i] = envelope[i].max(envelope[i + 1]);
    }
    envelope
}

/// Sample the precision envelope at the 101 COCO recall levels.
///
/// Each level takes the envelope value at the first point whose recall is at
/// least the level, or 0.0 if the curve never reaches it.
pub fn interpolate_precision(curve: &PrecisionRecallCurve) -> Vec<f64> {
    let envelope = precision_envelope(&curve.precision);

    (0..RECALL_POINTS)
        .map(|i| {
            let recall_level = i as f64 / (RECALL_POINTS - 1) as f64;
            let pos = curve.recall.partition_point(|&r| r < recall_level);
            envelope.get(pos).copied().unwrap_or(0.0)
        })
        .collect()
}
