//! JSON loading utilities for evaluation parameters.

use crate::error::Result;
use crate::params::EvaluationParams;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load evaluation parameters from a JSON file.
///
/// Missing fields fall back to the COCO defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
///
/// # Example
///
/// ```no_run
/// use coco_detection_eval::loader::load_from_file;
///
/// let params = load_from_file("eval_params.json").unwrap();
/// println!("Evaluating {} IoU thresholds", params.iou_thresholds.len());
/// ```
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<EvaluationParams> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let params: EvaluationParams = serde_json::from_reader(reader)?;

    params.validate()?;

    Ok(params)
}

/// Load evaluation parameters from a JSON string.
///
/// # Example
///
/// ```
/// use coco_detection_eval::loader::load_from_string;
///
/// let params = load_from_string(r#"{ "max_detections": [20] }"#).unwrap();
/// assert_eq!(params.max_detections, vec![20]);
/// assert_eq!(params.iou_thresholds.len(), 10);
/// ```
pub fn load_from_string(json_str: &str) -> Result<EvaluationParams> {
    let params: EvaluationParams = serde_json::from_str(json_str)?;
    params.validate()?;
    Ok(params)
}
