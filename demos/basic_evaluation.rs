//! Basic evaluation example demonstrating core functionality.
//!
//! Run with `RUST_LOG=info cargo run --example basic_evaluation` to see the
//! traversal and aggregation log lines.

use coco_detection_eval::{
    load_from_string, metrics::iou::calculate_iou, transforms::flip_bbox, Annotation, BoundingBox,
    DetectionCocoEvaluator, ImagePrediction, SerialIterator,
};
use std::collections::BTreeMap;

/// Stand-in for a decoded image.
#[derive(Debug, Clone)]
struct Image {
    id: usize,
    height: u32,
    width: u32,
    flipped: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== COCO Evaluation Example ===\n");

    // Example 1: IoU Calculation
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
    let bbox2 = BoundingBox::new(30.0, 30.0, 70.0, 70.0);
    let iou = calculate_iou(&bbox1, &bbox2);
    println!("   IoU between overlapping boxes: {:.4}", iou);
    println!();

    // Example 2: Evaluation parameters
    println!("2. Loading Evaluation Parameters");
    let params = load_from_string(r#"{ "max_detections": [1, 10, 100] }"#)?;
    println!("   IoU thresholds: {:?}", params.iou_thresholds);
    println!(
        "   Area ranges: {:?}",
        params.area_ranges.iter().map(|r| r.label.as_str()).collect::<Vec<_>>()
    );
    println!();

    // Example 3: Dataset with a crowd region and a horizontally flipped image
    println!("3. Building the Dataset");
    let person = BoundingBox::from_xywh(100.0, 100.0, 200.0, 150.0);
    let car = BoundingBox::from_xywh(350.0, 200.0, 100.0, 120.0);
    let crowd = BoundingBox::from_xywh(20.0, 300.0, 200.0, 150.0);

    let images = vec![
        Image {
            id: 0,
            height: 480,
            width: 640,
            flipped: false,
        },
        Image {
            id: 1,
            height: 480,
            width: 640,
            flipped: true,
        },
    ];
    let dataset: Vec<(Image, Vec<Annotation>)> = images
        .into_iter()
        .map(|image| {
            let shape = (image.height, image.width);
            let boxes = flip_bbox(&[person, car, crowd], shape, image.flipped, false);
            let annotations = vec![
                Annotation::new(boxes[0], 0),
                Annotation::new(boxes[1], 1),
                Annotation::new(boxes[2], 0).crowd(),
            ];
            (image, annotations)
        })
        .collect();
    println!("   {} images, {} annotations each", dataset.len(), dataset[0].1.len());
    println!();

    // Example 4: A predictor that is slightly off and adds a spurious person
    println!("4. Running Full Evaluation");
    let predictor = |batch: &[&Image]| -> coco_detection_eval::Result<Vec<ImagePrediction>> {
        Ok(batch
            .iter()
            .map(|image| {
                let boxes = [
                    BoundingBox::from_xywh(105.0, 98.0, 195.0, 155.0),
                    BoundingBox::from_xywh(348.0, 198.0, 105.0, 125.0),
                    BoundingBox::from_xywh(50.0, 320.0, 60.0, 90.0),
                    BoundingBox::from_xywh(500.0, 20.0, 80.0, 90.0),
                ];
                let shape = (image.height, image.width);
                ImagePrediction::new(
                    flip_bbox(&boxes, shape, image.flipped, false),
                    vec![0, 1, 0, 0],
                    vec![0.95, 0.87, 0.40, 0.30 + 0.1 * image.id as f64],
                )
            })
            .collect())
    };

    let mut evaluator = DetectionCocoEvaluator::new(SerialIterator::new(dataset, 1)?, predictor)
        .with_params(params)
        .with_label_names(["person", "car"])
        .with_name("validation");

    let mut observation: BTreeMap<String, f64> = BTreeMap::new();
    let result = evaluator.report(Some(&mut observation))?;
    println!("   Evaluation complete! {}", evaluator.last_stats().summary_string());
    println!();

    println!("   Overall Metrics:");
    for (label, key) in [
        ("mAP (IoU=0.50:0.95)", "map/iou=0.50:0.95/area=all/maxDets=100"),
        ("mAP (IoU=0.50)", "map/iou=0.50/area=all/maxDets=100"),
        ("mAP (IoU=0.75)", "map/iou=0.75/area=all/maxDets=100"),
        ("mAR (maxDets=100)", "mar/iou=0.50:0.95/area=all/maxDets=100"),
    ] {
        let value = result.get(&format!("validation/main/{}", key)).unwrap_or(f64::NAN);
        println!("   ├─ {}: {:.4}", label, value);
    }
    println!();

    println!("   Per-Class AP:");
    for name in ["person", "car"] {
        let key = format!("validation/main/ap/iou=0.50:0.95/area=all/maxDets=100/{}", name);
        println!("   ├─ {}: {:.4}", name, result.get(&key).unwrap_or(f64::NAN));
    }
    println!();

    println!("   {} values written to the observation", observation.len());
    println!();

    println!("=== Example Complete ===");

    Ok(())
}
