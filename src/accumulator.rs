//! Per-image collection of ground truth and detections across one traversal.

use crate::error::{CocoEvalError, Result};
use crate::types::{Annotation, Detection, ImageRecord};

/// Buffers ground truth and predictions image by image.
///
/// `add_ground_truth` and `add_predictions` must be called once per image, in
/// the same image order, before `finalize`.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    ground_truths: Vec<Vec<Annotation>>,
    predictions: Vec<Vec<Detection>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all buffers.
    pub fn reset(&mut self) {
        self.ground_truths.clear();
        self.predictions.clear();
    }

    /// Append the annotations of the next image.
    pub fn add_ground_truth(&mut self, annotations: Vec<Annotation>) {
        self.ground_truths.push(annotations);
    }

    /// Append the detections of the next image.
    pub fn add_predictions(&mut self, detections: Vec<Detection>) {
        self.predictions.push(detections);
    }

    /// Number of images with ground truth recorded so far.
    pub fn len(&self) -> usize {
        self.ground_truths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ground_truths.is_empty() && self.predictions.is_empty()
    }

    /// Drain the buffers into ordered image records.
    ///
    /// # Errors
    ///
    /// Returns `CardinalityMismatch` if ground truth and predictions were
    /// added a different number of times. The buffers are left untouched in
    /// that case.
    pub fn finalize(&mut self) -> Result<Vec<ImageRecord>> {
        if self.ground_truths.len() != self.predictions.len() {
            return Err(CocoEvalError::CardinalityMismatch(format!(
                "{} images with ground truth but {} with predictions",
                self.ground_truths.len(),
                self.predictions.len()
            )));
        }

        let ground_truths = std::mem::take(&mut self.ground_truths);
        let predictions = std::mem::take(&mut self.predictions);

        Ok(ground_truths
            .into_iter()
            .zip(predictions)
            .enumerate()
            .map(|(index, (annotations, detections))| ImageRecord {
                index,
                annotations,
                detections,
            })
            .collect())
    }
}
