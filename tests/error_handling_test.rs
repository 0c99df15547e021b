//! Error handling and validation tests.

use coco_detection_eval::accumulator::Accumulator;
use coco_detection_eval::error::CocoEvalError;
use coco_detection_eval::evaluator::{DetectionCocoEvaluator, EvaluatorState};
use coco_detection_eval::iterator::{DatasetIterator, Example, SerialIterator};
use coco_detection_eval::loader::{load_from_file, load_from_string};
use coco_detection_eval::types::{Annotation, BoundingBox, ImagePrediction};
use coco_detection_eval::Result;

fn annotation(x: f64) -> Annotation {
    Annotation::new(BoundingBox::new(x, x, x + 40.0, x + 40.0), 0)
}

fn dataset(n: usize) -> Vec<(usize, Vec<Annotation>)> {
    (0..n).map(|i| (i, vec![annotation(i as f64)])).collect()
}

fn empty_predictions(images: &[&usize]) -> Result<Vec<ImagePrediction>> {
    Ok(images.iter().map(|_| ImagePrediction::default()).collect())
}

/// Yields batches from a fixed script of image indices.
struct ScriptedIterator {
    batches: Vec<Vec<usize>>,
    position: usize,
    len: Option<usize>,
}

impl ScriptedIterator {
    fn new(batches: Vec<Vec<usize>>, len: Option<usize>) -> Self {
        Self {
            batches,
            position: 0,
            len,
        }
    }
}

impl DatasetIterator for ScriptedIterator {
    type Image = usize;

    fn reset(&mut self) {
        self.position = 0;
    }

    fn next_batch(&mut self) -> Result<Option<Vec<Example<usize>>>> {
        let Some(indices) = self.batches.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(
            indices
                .iter()
                .map(|&index| Example {
                    index,
                    image: index,
                    annotations: vec![annotation(index as f64)],
                })
                .collect(),
        ))
    }

    fn dataset_len(&self) -> Option<usize> {
        self.len
    }
}

// ============================================================================
// ITERATOR PROTOCOL
// ============================================================================

#[test]
fn test_repeating_iterator_is_rejected() {
    // Never signals the end of a pass on its own
    let iterator = ScriptedIterator::new(vec![vec![0, 1], vec![2, 0]], None);
    let mut evaluator = DetectionCocoEvaluator::new(iterator, empty_predictions);

    let result = evaluator.evaluate();
    assert!(matches!(result, Err(CocoEvalError::IteratorProtocol(_))));
    assert_eq!(evaluator.state(), EvaluatorState::Idle);
}

#[test]
fn test_early_exhaustion_is_rejected() {
    let iterator = ScriptedIterator::new(vec![vec![0, 1]], Some(4));
    let mut evaluator = DetectionCocoEvaluator::new(iterator, empty_predictions);

    assert!(matches!(
        evaluator.evaluate(),
        Err(CocoEvalError::IteratorProtocol(_))
    ));
}

#[test]
fn test_index_beyond_length_is_rejected() {
    let iterator = ScriptedIterator::new(vec![vec![0, 5]], Some(2));
    let mut evaluator = DetectionCocoEvaluator::new(iterator, empty_predictions);

    assert!(matches!(
        evaluator.evaluate(),
        Err(CocoEvalError::IteratorProtocol(_))
    ));
}

#[test]
fn test_unknown_length_iterator_is_accepted() {
    let iterator = ScriptedIterator::new(vec![vec![0, 1], vec![2]], None);
    let mut evaluator = DetectionCocoEvaluator::new(iterator, empty_predictions);

    let result = evaluator.evaluate().unwrap();
    assert_eq!(result.get("main/map/iou=0.50:0.95/area=all/maxDets=100"), Some(0.0));
    assert_eq!(evaluator.last_stats().images, 3);
}

#[test]
fn test_zero_batch_size() {
    let result = SerialIterator::new(dataset(3), 0);
    assert!(matches!(result, Err(CocoEvalError::InvalidParams(_))));
}

// ============================================================================
// PREDICTOR OUTPUT
// ============================================================================

#[test]
fn test_predictor_error_propagates() {
    let iterator = SerialIterator::new(dataset(3), 2).unwrap();
    let predictor = |_: &[&usize]| -> Result<Vec<ImagePrediction>> {
        Err(CocoEvalError::Prediction("model not loaded".to_string()))
    };
    let mut evaluator = DetectionCocoEvaluator::new(iterator, predictor);

    match evaluator.evaluate() {
        Err(CocoEvalError::Prediction(msg)) => assert_eq!(msg, "model not loaded"),
        other => panic!("expected a prediction error, got {:?}", other),
    }
    assert_eq!(evaluator.state(), EvaluatorState::Idle);
}

#[test]
fn test_mismatched_prediction_lists() {
    let iterator = SerialIterator::new(dataset(2), 2).unwrap();
    let predictor = |images: &[&usize]| -> Result<Vec<ImagePrediction>> {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        Ok(images
            .iter()
            .map(|_| ImagePrediction::new(vec![bbox, bbox], vec![0], vec![0.9, 0.8]))
            .collect())
    };
    let mut evaluator = DetectionCocoEvaluator::new(iterator, predictor);

    assert!(matches!(
        evaluator.evaluate(),
        Err(CocoEvalError::CardinalityMismatch(_))
    ));
}

#[test]
fn test_invalid_predicted_box() {
    let iterator = SerialIterator::new(dataset(1), 1).unwrap();
    let predictor = |_: &[&usize]| -> Result<Vec<ImagePrediction>> {
        Ok(vec![ImagePrediction::new(
            vec![BoundingBox::new(0.0, 0.0, f64::NAN, 10.0)],
            vec![0],
            vec![0.5],
        )])
    };
    let mut evaluator = DetectionCocoEvaluator::new(iterator, predictor);

    assert!(matches!(
        evaluator.evaluate(),
        Err(CocoEvalError::InvalidBoundingBox(_))
    ));
}

#[test]
fn test_invalid_ground_truth_box() {
    let data = vec![(
        0,
        vec![Annotation::new(BoundingBox::new(50.0, 50.0, 10.0, 10.0), 0)],
    )];
    let iterator = SerialIterator::new(data, 1).unwrap();
    let mut evaluator = DetectionCocoEvaluator::new(iterator, empty_predictions);

    assert!(matches!(
        evaluator.evaluate(),
        Err(CocoEvalError::InvalidBoundingBox(_))
    ));
}

// ============================================================================
// RECOVERY
// ============================================================================

#[test]
fn test_evaluator_recovers_after_failure() {
    let iterator = SerialIterator::new(dataset(4), 2).unwrap();
    let mut calls = 0;
    let predictor = move |images: &[&usize]| -> Result<Vec<ImagePrediction>> {
        calls += 1;
        if calls == 2 {
            return Err(CocoEvalError::Prediction("transient failure".to_string()));
        }
        Ok(images
            .iter()
            .map(|&&i| {
                let x = i as f64;
                ImagePrediction::new(
                    vec![BoundingBox::new(x, x, x + 40.0, x + 40.0)],
                    vec![0],
                    vec![0.9],
                )
            })
            .collect())
    };
    let mut evaluator = DetectionCocoEvaluator::new(iterator, predictor);

    assert!(evaluator.evaluate().is_err());
    assert_eq!(evaluator.state(), EvaluatorState::Idle);

    // A fresh run starts from empty buffers
    let result = evaluator.evaluate().unwrap();
    assert_eq!(evaluator.state(), EvaluatorState::Done);
    assert_eq!(result.get("main/map/iou=0.50:0.95/area=all/maxDets=100"), Some(1.0));
    assert_eq!(evaluator.last_stats().images, 4);
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

#[test]
fn test_accumulator_cardinality_mismatch() {
    let mut accumulator = Accumulator::new();
    accumulator.add_ground_truth(vec![annotation(0.0)]);
    accumulator.add_ground_truth(vec![annotation(1.0)]);
    accumulator.add_predictions(vec![]);

    assert!(matches!(
        accumulator.finalize(),
        Err(CocoEvalError::CardinalityMismatch(_))
    ));
    // Buffers survive a failed finalize
    assert_eq!(accumulator.len(), 2);
}

// ============================================================================
// PARAMETER LOADING
// ============================================================================

#[test]
fn test_load_invalid_json() {
    let result = load_from_string("{ not json");
    assert!(matches!(result, Err(CocoEvalError::Json(_))));
}

#[test]
fn test_load_out_of_range_threshold() {
    let result = load_from_string(r#"{ "iou_thresholds": [0.5, 1.5] }"#);
    assert!(matches!(result, Err(CocoEvalError::InvalidParams(_))));
}

#[test]
fn test_load_descending_thresholds() {
    let result = load_from_string(r#"{ "iou_thresholds": [0.95, 0.5] }"#);
    assert!(matches!(result, Err(CocoEvalError::InvalidParams(_))));
}

#[test]
fn test_load_empty_max_detections() {
    let result = load_from_string(r#"{ "max_detections": [] }"#);
    assert!(matches!(result, Err(CocoEvalError::InvalidParams(_))));
}

#[test]
fn test_load_inverted_area_range() {
    let json = r#"{ "area_ranges": [{ "label": "all", "min": 100.0, "max": 10.0 }] }"#;
    assert!(matches!(
        load_from_string(json),
        Err(CocoEvalError::InvalidParams(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let result = load_from_file("/nonexistent/params.json");
    assert!(matches!(result, Err(CocoEvalError::Io(_))));
}

#[test]
fn test_error_display() {
    let err = CocoEvalError::IteratorProtocol("image 3 was yielded twice".to_string());
    assert!(err.to_string().contains("image 3 was yielded twice"));
}
