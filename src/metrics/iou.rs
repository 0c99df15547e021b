//! Intersection over Union (IoU) calculation.

use crate::types::BoundingBox;

/// Area of the overlap between two boxes, zero when they are disjoint.
fn intersection_area(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let x_left = bbox1.x_min.max(bbox2.x_min);
    let y_top = bbox1.y_min.max(bbox2.y_min);
    let x_right = bbox1.x_max.min(bbox2.x_max);
    let y_bottom = bbox1.y_max.min(bbox2.y_max);

    if x_right < x_left || y_bottom < y_top {
        return 0.0;
    }

    (x_right - x_left) * (y_bottom - y_top)
}

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// IoU is defined as the area of intersection divided by the area of union.
///
/// # Returns
///
/// Returns a value between 0.0 (no overlap) and 1.0 (perfect overlap).
///
/// # Example
///
/// ```
/// use coco_detection_eval::metrics::iou::calculate_iou;
/// use coco_detection_eval::types::BoundingBox;
///
/// let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let bbox2 = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
/// let iou = calculate_iou(&bbox1, &bbox2);
/// assert!(iou > 0.0 && iou < 1.0);
/// ```
pub fn calculate_iou(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let intersection = intersection_area(bbox1, bbox2);
    let union_area = bbox1.area() + bbox2.area() - intersection;

    // Avoid division by zero
    if union_area <= 0.0 {
        return 0.0;
    }

    intersection / union_area
}

/// Overlap between a detection and a crowd region.
///
/// A crowd region may contain many objects, so the overlap is measured as
/// the fraction of the detection covered by the region.
pub fn calculate_crowd_iou(detection: &BoundingBox, crowd: &BoundingBox) -> f64 {
    let det_area = detection.area();
    if det_area <= 0.0 {
        return 0.0;
    }

    intersection_area(detection, crowd) / det_area
}

/// Calculate the overlap matrix between detections and ground truth.
///
/// `result[i][j]` is the overlap of `detections[i]` with `ground_truths[j]`,
/// using [`calculate_crowd_iou`] where `crowd[j]` is set.
pub fn calculate_iou_matrix(
    detections: &[BoundingBox],
    ground_truths: &[BoundingBox],
    crowd: &[bool],
) -> Vec<Vec<f64>> {
    detections
        .iter()
        .map(|det| {
            ground_truths
                .iter()
                .zip(crowd)
                .map(|(gt, &is_crowd)| {
                    if is_crowd {
                        calculate_crowd_iou(det, gt)
                    } else {
                        calculate_iou(det, gt)
                    }
                })
                .collect()
        })
        .collect()
}
