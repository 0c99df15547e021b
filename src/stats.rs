//! Statistics tracking for one dataset traversal.
//!
//! Counts what the evaluator saw so a run can be sanity-checked from logs
//! (e.g. an empty dataset or a predictor that never fires).

use crate::types::{Annotation, Detection};
use serde::{Deserialize, Serialize};

/// Counters collected while traversing the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    /// Number of batches pulled from the iterator
    pub batches: usize,

    /// Number of images accumulated
    pub images: usize,

    /// Number of ground truth annotations, crowd regions included
    pub annotations: usize,

    /// Number of crowd annotations
    pub crowd_annotations: usize,

    /// Number of predicted detections
    pub detections: usize,

    /// Number of images for which the predictor returned nothing
    pub empty_predictions: usize,
}

impl TraversalStats {
    /// Create a new `TraversalStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch pulled from the iterator
    pub fn record_batch(&mut self) {
        self.batches += 1;
    }

    /// Record the ground truth and detections of one image
    pub fn record_image(&mut self, annotations: &[Annotation], detections: &[Detection]) {
        self.images += 1;
        self.annotations += annotations.len();
        self.crowd_annotations += annotations.iter().filter(|ann| ann.crowd).count();
        self.detections += detections.len();
        if detections.is_empty() {
            self.empty_predictions += 1;
        }
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "TraversalStats {{ batches: {}, images: {}, annotations: {} ({} crowd), \
             detections: {}, empty: {} }}",
            self.batches,
            self.images,
            self.annotations,
            self.crowd_annotations,
            self.detections,
            self.empty_predictions
        )
    }
}
