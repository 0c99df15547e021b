//! Evaluation parameters: IoU thresholds, area ranges and detection caps.

use crate::error::{CocoEvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound used by the open-ended `all` and `large` ranges.
pub const AREA_UNBOUNDED: f64 = 1e10;

/// A labelled closed interval on the annotation area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRange {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl AreaRange {
    pub fn new(label: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }

    /// Check whether `area` lies within `[min, max]`.
    pub fn contains(&self, area: f64) -> bool {
        area >= self.min && area <= self.max
    }
}

/// Parameters controlling which metric cells are computed.
///
/// Defaults follow the COCO protocol: 10 IoU thresholds (0.50:0.05:0.95),
/// the all/small/medium/large area ranges and caps of 1, 10 and 100
/// detections per image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationParams {
    /// IoU thresholds for matching, in ascending order.
    pub iou_thresholds: Vec<f64>,
    /// Area ranges; the first one is treated as the primary range.
    pub area_ranges: Vec<AreaRange>,
    /// Maximum detections per image, in ascending order.
    pub max_detections: Vec<usize>,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            iou_thresholds: default_iou_thresholds(),
            area_ranges: default_area_ranges(),
            max_detections: vec![1, 10, 100],
        }
    }
}

/// Default COCO evaluation thresholds: 0.5:0.05:0.95
pub fn default_iou_thresholds() -> Vec<f64> {
    (0..10).map(|i| 0.5 + 0.05 * i as f64).collect()
}

/// Default COCO area ranges.
pub fn default_area_ranges() -> Vec<AreaRange> {
    vec![
        AreaRange::new("all", 0.0, AREA_UNBOUNDED),
        AreaRange::new("small", 0.0, 32_f64.powi(2)),
        AreaRange::new("medium", 32_f64.powi(2), 96_f64.powi(2)),
        AreaRange::new("large", 96_f64.powi(2), AREA_UNBOUNDED),
    ]
}

impl EvaluationParams {
    /// Largest configured detection cap.
    pub fn max_detection_cap(&self) -> usize {
        self.max_detections.iter().copied().max().unwrap_or(0)
    }

    /// Index of an IoU threshold, compared with a small tolerance.
    pub fn iou_index(&self, threshold: f64) -> Option<usize> {
        self.iou_thresholds
            .iter()
            .position(|&t| (t - threshold).abs() < 1e-6)
    }

    /// Index of an area range by label.
    pub fn area_index(&self, label: &str) -> Option<usize> {
        self.area_ranges.iter().position(|r| r.label == label)
    }

    /// Index of a detection cap.
    pub fn max_detections_index(&self, cap: usize) -> Option<usize> {
        self.max_detections.iter().position(|&m| m == cap)
    }

    /// Check that the parameters describe a well-formed evaluation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.iou_thresholds.is_empty() {
            return Err(CocoEvalError::InvalidParams(
                "at least one IoU threshold is required".to_string(),
            ));
        }
        if let Some(t) = self
            .iou_thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(CocoEvalError::InvalidParams(format!(
                "IoU threshold {} is outside [0, 1]",
                t
            )));
        }
        if self.iou_thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CocoEvalError::InvalidParams(format!(
                "IoU thresholds must be strictly ascending: {:?}",
                self.iou_thresholds
            )));
        }
        if self.area_ranges.is_empty() {
            return Err(CocoEvalError::InvalidParams(
                "at least one area range is required".to_string(),
            ));
        }
        let mut labels = HashSet::new();
        for range in &self.area_ranges {
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(CocoEvalError::InvalidParams(format!(
                    "area range '{}' is inverted: [{}, {}]",
                    range.label, range.min, range.max
                )));
            }
            if !labels.insert(range.label.as_str()) {
                return Err(CocoEvalError::InvalidParams(format!(
                    "duplicate area range label '{}'",
                    range.label
                )));
            }
        }
        if self.max_detections.is_empty() || self.max_detections.contains(&0) {
            return Err(CocoEvalError::InvalidParams(
                "max detections must be non-empty and positive".to_string(),
            ));
        }
        Ok(())
    }
}
