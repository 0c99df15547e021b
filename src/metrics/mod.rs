//! Metrics calculation modules for COCO evaluation.

pub mod ap;
pub mod iou;
pub mod precision_recall;

pub use ap::{calculate_ap, calculate_ar, calculate_map, calculate_mean};
pub use iou::{calculate_crowd_iou, calculate_iou, calculate_iou_matrix};
pub use precision_recall::{
    calculate_precision_recall_curve, interpolate_precision, precision_envelope,
    PrecisionRecallCurve, RECALL_POINTS,
};
