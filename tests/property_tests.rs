//! Property-based tests using proptest
//!
//! These tests verify mathematical properties and invariants that should
//! always hold regardless of the input values.

use coco_detection_eval::aggregate::{Aggregator, IouSelection, MetricKind, SummaryMetric};
use coco_detection_eval::evaluator::DetectionCocoEvaluator;
use coco_detection_eval::iterator::SerialIterator;
use coco_detection_eval::matching::Matcher;
use coco_detection_eval::metrics::{calculate_ap, calculate_ar, calculate_crowd_iou, calculate_iou};
use coco_detection_eval::params::EvaluationParams;
use coco_detection_eval::transforms::flip_bbox;
use coco_detection_eval::types::{Annotation, BoundingBox, Detection, ImagePrediction, ImageRecord};
use coco_detection_eval::Result;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const NUM_CLASSES: usize = 3;

fn bbox_strategy() -> impl Strategy<Value = BoundingBox> {
    (0.0..200.0f64, 0.0..200.0f64, 1.0..100.0f64, 1.0..100.0f64)
        .prop_map(|(x, y, w, h)| BoundingBox::from_xywh(x, y, w, h))
}

fn annotation_strategy() -> impl Strategy<Value = Annotation> {
    (bbox_strategy(), 0..NUM_CLASSES, prop::bool::weighted(0.1)).prop_map(|(bbox, label, crowd)| {
        let ann = Annotation::new(bbox, label);
        if crowd {
            ann.crowd()
        } else {
            ann
        }
    })
}

fn detection_strategy() -> impl Strategy<Value = Detection> {
    (bbox_strategy(), 0..NUM_CLASSES, 0.0..1.0f64)
        .prop_map(|(bbox, label, score)| Detection::new(bbox, label, score))
}

fn to_prediction(detections: &[Detection]) -> ImagePrediction {
    ImagePrediction::new(
        detections.iter().map(|det| det.bbox).collect(),
        detections.iter().map(|det| det.label).collect(),
        detections.iter().map(|det| det.score).collect(),
    )
}

// Property: IoU is symmetric and lies in [0, 1]
proptest! {
    #[test]
    fn prop_iou_symmetric(a in bbox_strategy(), b in bbox_strategy()) {
        let ab = calculate_iou(&a, &b);
        let ba = calculate_iou(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&ab), "IoU should be in [0,1], got {}", ab);
    }

    #[test]
    fn prop_iou_self_is_one(a in bbox_strategy()) {
        prop_assert!((calculate_iou(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prop_crowd_iou_bounds(det in bbox_strategy(), crowd in bbox_strategy()) {
        let overlap = calculate_crowd_iou(&det, &crowd);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&overlap));
        // Never below the regular IoU
        prop_assert!(overlap + 1e-12 >= calculate_iou(&det, &crowd));
    }
}

// Property: AP and AR lie in [0, 1] whenever the ground truth count covers
// every true positive
proptest! {
    #[test]
    fn prop_ap_range(flags in prop::collection::vec(any::<bool>(), 0..200), extra in 0usize..50) {
        let tp = flags.iter().filter(|&&f| f).count();
        let num_ground_truth = tp + extra;
        prop_assume!(num_ground_truth > 0);

        let ap = calculate_ap(&flags, num_ground_truth);
        let ar = calculate_ar(&flags, num_ground_truth);
        prop_assert!((0.0..=1.0).contains(&ap), "AP should be in [0,1], got {}", ap);
        prop_assert!((0.0..=1.0).contains(&ar), "AR should be in [0,1], got {}", ar);
    }

    #[test]
    fn prop_ap_without_ground_truth_is_nan(flags in prop::collection::vec(Just(false), 0..20)) {
        prop_assert!(calculate_ap(&flags, 0).is_nan());
    }

    #[test]
    fn prop_ap_perfect_ranking(num_tp in 1usize..50, num_fp in 0usize..50) {
        // All true positives ranked before any false positive
        let flags: Vec<bool> = std::iter::repeat(true)
            .take(num_tp)
            .chain(std::iter::repeat(false).take(num_fp))
            .collect();
        prop_assert!((calculate_ap(&flags, num_tp) - 1.0).abs() < 1e-12);
    }
}

// Property: on a single image, raising the detection cap never lowers AP or AR
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_max_detections_monotone(
        annotations in prop::collection::vec(annotation_strategy(), 0..8),
        detections in prop::collection::vec(detection_strategy(), 0..30),
    ) {
        let params = EvaluationParams::default();
        let names: BTreeMap<usize, String> = (0..NUM_CLASSES).map(|c| (c, c.to_string())).collect();
        let class_ids: BTreeSet<usize> = names.keys().copied().collect();
        let record = ImageRecord { index: 0, annotations, detections };

        let table = Matcher::new(&params).match_records(&[record], &class_ids);
        let aggregator = Aggregator::new(&params, &names);

        for kind in [MetricKind::AveragePrecision, MetricKind::AverageRecall] {
            for class in 0..NUM_CLASSES {
                let scores: Vec<f64> = (0..params.max_detections.len())
                    .map(|m| {
                        let metric = SummaryMetric {
                            kind,
                            iou: IouSelection::All,
                            area: 0,
                            max_detections: m,
                        };
                        aggregator.class_score(&table, &metric, class)
                    })
                    .collect();

                for pair in scores.windows(2) {
                    if pair[0].is_nan() {
                        prop_assert!(pair[1].is_nan());
                    } else {
                        prop_assert!(
                            pair[0] <= pair[1] + 1e-12,
                            "{:?} decreased: {:?}",
                            kind,
                            scores
                        );
                    }
                }
            }
        }
    }
}

// Property: evaluation is a pure function of the dataset and predictions
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_evaluate_idempotent(
        images in prop::collection::vec(
            (
                prop::collection::vec(annotation_strategy(), 0..6),
                prop::collection::vec(detection_strategy(), 0..10),
            ),
            0..6,
        ),
        batch_size in 1usize..4,
    ) {
        let dataset: Vec<(usize, Vec<Annotation>)> = images
            .iter()
            .enumerate()
            .map(|(i, (anns, _))| (i, anns.clone()))
            .collect();
        let predictions: Vec<ImagePrediction> =
            images.iter().map(|(_, dets)| to_prediction(dets)).collect();

        let iterator = SerialIterator::new(dataset, batch_size).unwrap();
        let predictor = move |batch: &[&usize]| -> Result<Vec<ImagePrediction>> {
            Ok(batch.iter().map(|&&i| predictions[i].clone()).collect())
        };
        let mut evaluator = DetectionCocoEvaluator::new(iterator, predictor);

        let first = evaluator.evaluate().unwrap();
        let second = evaluator.evaluate().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_perfect_predictions(
        images in prop::collection::vec(
            prop::collection::vec((bbox_strategy(), 0..NUM_CLASSES), 1..6),
            1..5,
        ),
    ) {
        let dataset: Vec<(usize, Vec<Annotation>)> = images
            .iter()
            .enumerate()
            .map(|(i, objects)| {
                let anns = objects
                    .iter()
                    .map(|&(bbox, label)| Annotation::new(bbox, label))
                    .collect();
                (i, anns)
            })
            .collect();
        let predictions: Vec<ImagePrediction> = images
            .iter()
            .map(|objects| {
                ImagePrediction::new(
                    objects.iter().map(|&(bbox, _)| bbox).collect(),
                    objects.iter().map(|&(_, label)| label).collect(),
                    vec![1.0; objects.len()],
                )
            })
            .collect();

        let iterator = SerialIterator::new(dataset, 2).unwrap();
        let predictor = move |batch: &[&usize]| -> Result<Vec<ImagePrediction>> {
            Ok(batch.iter().map(|&&i| predictions[i].clone()).collect())
        };
        let result = DetectionCocoEvaluator::new(iterator, predictor).evaluate().unwrap();

        let map = result.get("main/map/iou=0.50:0.95/area=all/maxDets=100").unwrap();
        prop_assert!(
            (map - 1.0).abs() < 1e-12,
            "perfect predictions should give mAP 1, got {}",
            map
        );
    }
}

// Property: flipping twice restores the original boxes
proptest! {
    #[test]
    fn prop_flip_involution(
        boxes in prop::collection::vec(bbox_strategy(), 0..10),
        flip_x in any::<bool>(),
        flip_y in any::<bool>(),
    ) {
        let shape = (480, 640);
        let twice = flip_bbox(&flip_bbox(&boxes, shape, flip_x, flip_y), shape, flip_x, flip_y);

        for (original, restored) in boxes.iter().zip(&twice) {
            prop_assert!((original.x_min - restored.x_min).abs() < 1e-9);
            prop_assert!((original.y_min - restored.y_min).abs() < 1e-9);
            prop_assert!((original.x_max - restored.x_max).abs() < 1e-9);
            prop_assert!((original.y_max - restored.y_max).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_flip_preserves_area(
        bbox in bbox_strategy(),
        flip_x in any::<bool>(),
        flip_y in any::<bool>(),
    ) {
        let flipped = flip_bbox(&[bbox], (480, 640), flip_x, flip_y);
        prop_assert!((flipped[0].area() - bbox.area()).abs() < 1e-6);
    }
}
