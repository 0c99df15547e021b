//! # coco-detection-eval
//!
//! A Rust library for evaluating object detectors with the COCO
//! (Common Objects in Context) mean-average-precision protocol.
//!
//! Predictions are collected online, batch by batch, during a single pass
//! over the dataset, then matched against ground truth and integrated into:
//! - **AP** per class, averaged over IoU thresholds 0.50:0.95
//! - **mAP**, the mean over classes that have ground truth
//! - **AP50**, **AP75** and small/medium/large area variants
//! - **AR** (average recall) at 1, 10 and 100 detections per image
//!
//! Classes without ground truth report NaN and are left out of the means.
//!
//! ## Quick Start
//!
//! ```rust
//! use coco_detection_eval::evaluator::DetectionCocoEvaluator;
//! use coco_detection_eval::iterator::SerialIterator;
//! use coco_detection_eval::types::{Annotation, BoundingBox, ImagePrediction};
//!
//! # fn main() -> coco_detection_eval::Result<()> {
//! let bbox = BoundingBox::new(10.0, 10.0, 60.0, 60.0);
//! let dataset = vec![("img0", vec![Annotation::new(bbox, 0)])];
//!
//! let predictor = |images: &[&&str]| -> coco_detection_eval::Result<Vec<ImagePrediction>> {
//!     Ok(images
//!         .iter()
//!         .map(|_| ImagePrediction::new(vec![bbox], vec![0], vec![0.9]))
//!         .collect())
//! };
//!
//! let mut evaluator = DetectionCocoEvaluator::new(SerialIterator::new(dataset, 2)?, predictor)
//!     .with_label_names(["person"]);
//! let result = evaluator.evaluate()?;
//!
//! assert_eq!(result.get("main/map/iou=0.50:0.95/area=all/maxDets=100"), Some(1.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Boxes
//!
//! Boxes are `(x_min, y_min, x_max, y_max)` in pixel coordinates. Use
//! [`BoundingBox::from_xywh`] for COCO-style `[x, y, width, height]` input.

pub mod accumulator;
pub mod aggregate;
pub mod error;
pub mod evaluator;
#[cfg(feature = "dataframe")]
pub mod frame;
pub mod iterator;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod observation;
pub mod params;
pub mod stats;
pub mod transforms;
pub mod types;

// Re-export commonly used types and functions
pub use accumulator::Accumulator;
pub use aggregate::{Aggregator, EvaluationResult};
pub use error::{CocoEvalError, Result};
pub use evaluator::{DetectionCocoEvaluator, EvaluatorState, Predictor};
pub use iterator::{DatasetIterator, Example, SerialIterator};
pub use loader::{load_from_file, load_from_string};
pub use matching::Matcher;
pub use observation::ObservationSink;
pub use params::{AreaRange, EvaluationParams};
pub use types::{Annotation, BoundingBox, Detection, ImagePrediction, ImageRecord};
