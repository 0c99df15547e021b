//! Average Precision (AP), Average Recall (AR) and their means.

use crate::metrics::precision_recall::{calculate_precision_recall_curve, interpolate_precision};

/// Calculate Average Precision for one metric cell.
///
/// Uses the COCO-style 101-point interpolation method over the precision
/// envelope.
///
/// # Arguments
///
/// * `is_true_positive` - Ranked flags of the non-ignored detections
/// * `num_ground_truth` - Number of non-ignored ground truth instances
///
/// # Returns
///
/// Returns the AP in [0.0, 1.0], or NaN when there is no ground truth.
///
/// # Example
///
/// ```
/// use coco_detection_eval::metrics::ap::calculate_ap;
///
/// assert_eq!(calculate_ap(&[true, true], 2), 1.0);
/// assert_eq!(calculate_ap(&[], 3), 0.0);
/// assert!(calculate_ap(&[false], 0).is_nan());
/// ```
pub fn calculate_ap(is_true_positive: &[bool], num_ground_truth: usize) -> f64 {
    if num_ground_truth == 0 {
        return f64::NAN;
    }

    let curve = calculate_precision_recall_curve(is_true_positive, num_ground_truth);
    let interpolated = interpolate_precision(&curve);

    // Average over all 101 recall levels
    interpolated.iter().sum::<f64>() / interpolated.len() as f64
}

/// Calculate the recall reached by a cell's full detection sequence.
///
/// Returns NaN when there is no ground truth.
pub fn calculate_ar(is_true_positive: &[bool], num_ground_truth: usize) -> f64 {
    if num_ground_truth == 0 {
        return f64::NAN;
    }

    let tp = is_true_positive.iter().filter(|&&is_tp| is_tp).count();
    tp as f64 / num_ground_truth as f64
}

/// Arithmetic mean that propagates NaN.
///
/// An empty slice has no defined mean and yields NaN.
///
/// # Example
///
/// ```
/// use coco_detection_eval::metrics::ap::calculate_mean;
///
/// let aps = vec![0.8, 0.9, 0.75, 0.85];
/// assert!((calculate_mean(&aps) - 0.825).abs() < 1e-10);
/// assert!(calculate_mean(&[0.5, f64::NAN]).is_nan());
/// assert!(calculate_mean(&[]).is_nan());
/// ```
pub fn calculate_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate mean Average Precision across classes.
///
/// Classes whose score is NaN (no ground truth) are left out of the
/// denominator. Returns NaN if no class has a defined score.
///
/// # Example
///
/// ```
/// use coco_detection_eval::metrics::ap::calculate_map;
///
/// let class_aps = vec![1.0, f64::NAN, 0.5];
/// assert!((calculate_map(&class_aps) - 0.75).abs() < 1e-10);
/// ```
pub fn calculate_map(class_aps: &[f64]) -> f64 {
    let defined: Vec<f64> = class_aps.iter().copied().filter(|v| !v.is_nan()).collect();
    calculate_mean(&defined)
}
