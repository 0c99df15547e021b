//! Core data types for ground truth, detections and per-image records.

use crate::error::{CocoEvalError, Result};
use serde::{Deserialize, Serialize};

/// Represents a bounding box as corner coordinates in pixels.
///
/// Coordinates are in XYXY format where:
/// - x_min, y_min: top-left corner
/// - x_max, y_max: bottom-right corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Create a bounding box from COCO-style `[x, y, width, height]`.
    ///
    /// ```
    /// use coco_detection_eval::types::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_xywh(10.0, 20.0, 30.0, 40.0);
    /// assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 40.0, 60.0));
    /// ```
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Convert to COCO-style `[x, y, width, height]`.
    pub fn to_xywh(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.width(), self.height()]
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Get the area of the bounding box. Degenerate boxes have zero area.
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Check if the bounding box is valid (finite, non-inverted corners).
    pub fn is_valid(&self) -> bool {
        [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_max >= self.x_min
            && self.y_max >= self.y_min
    }
}

/// One ground-truth object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub bbox: BoundingBox,
    pub label: usize,
    /// Crowd regions may absorb several detections and are never penalized.
    #[serde(default)]
    pub crowd: bool,
    /// Externally supplied area (e.g. polygon area). Falls back to the box area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

impl Annotation {
    pub fn new(bbox: BoundingBox, label: usize) -> Self {
        Self {
            bbox,
            label,
            crowd: false,
            area: None,
        }
    }

    /// Mark this annotation as a crowd region.
    pub fn crowd(mut self) -> Self {
        self.crowd = true;
        self
    }

    /// Attach an explicit area used for area-range bucketing.
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    /// Area used for area-range bucketing.
    pub fn area(&self) -> f64 {
        self.area.unwrap_or_else(|| self.bbox.area())
    }
}

/// One predicted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: usize,
    pub score: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: usize, score: f64) -> Self {
        Self { bbox, label, score }
    }
}

/// Raw predictor output for a single image: three parallel lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePrediction {
    pub bboxes: Vec<BoundingBox>,
    pub labels: Vec<usize>,
    pub scores: Vec<f64>,
}

impl ImagePrediction {
    pub fn new(bboxes: Vec<BoundingBox>, labels: Vec<usize>, scores: Vec<f64>) -> Self {
        Self {
            bboxes,
            labels,
            scores,
        }
    }

    /// Zip the parallel lists into detections.
    ///
    /// # Errors
    ///
    /// Returns `CardinalityMismatch` when the lists differ in length and
    /// `InvalidBoundingBox` for non-finite or inverted boxes.
    pub fn into_detections(self) -> Result<Vec<Detection>> {
        if self.bboxes.len() != self.labels.len() || self.bboxes.len() != self.scores.len() {
            return Err(CocoEvalError::CardinalityMismatch(format!(
                "prediction lists differ in length: {} boxes, {} labels, {} scores",
                self.bboxes.len(),
                self.labels.len(),
                self.scores.len()
            )));
        }

        self.bboxes
            .into_iter()
            .zip(self.labels)
            .zip(self.scores)
            .map(|((bbox, label), score)| {
                if !bbox.is_valid() {
                    return Err(CocoEvalError::InvalidBoundingBox(format!(
                        "predicted box {:?} is not a valid XYXY box",
                        bbox
                    )));
                }
                Ok(Detection::new(bbox, label, score))
            })
            .collect()
    }
}

/// Ground truth and detections describing the same image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Position of the image in traversal order.
    pub index: usize,
    pub annotations: Vec<Annotation>,
    pub detections: Vec<Detection>,
}
