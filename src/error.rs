//! Error types for the coco-detection-eval library.

use thiserror::Error;

/// Result type for coco-detection-eval operations.
pub type Result<T> = std::result::Result<T, CocoEvalError>;

/// Error types that can occur during COCO evaluation.
///
/// A class without ground truth is not an error; it surfaces as NaN in the
/// evaluation result.
#[derive(Error, Debug)]
pub enum CocoEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ground-truth and prediction records are misaligned.
    #[error("Cardinality mismatch: {0}")]
    CardinalityMismatch(String),

    /// The dataset iterator repeated an image or stopped before a full pass.
    #[error("Iterator protocol violation: {0}")]
    IteratorProtocol(String),

    /// Invalid bounding box coordinates.
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// Invalid evaluation parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The predictor failed to produce detections for a batch.
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// Error raised while building a DataFrame.
    #[cfg(feature = "dataframe")]
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
