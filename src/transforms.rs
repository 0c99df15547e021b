//! Bounding box remapping under image flips.

use crate::types::BoundingBox;

/// Flip bounding boxes to follow a horizontal and/or vertical image flip.
///
/// `img_shape` is `(height, width)` of the image. Coordinates are reflected
/// about `width - 1` and `height - 1`, and the min/max corners are swapped so
/// the result stays in XYXY order.
///
/// # Example
///
/// ```
/// use coco_detection_eval::transforms::flip_bbox;
/// use coco_detection_eval::types::BoundingBox;
///
/// let flipped = flip_bbox(&[BoundingBox::new(10.0, 20.0, 30.0, 40.0)], (100, 200), true, false);
/// assert_eq!(flipped[0], BoundingBox::new(169.0, 20.0, 189.0, 40.0));
/// ```
pub fn flip_bbox(
    bboxes: &[BoundingBox],
    img_shape: (u32, u32),
    flip_x: bool,
    flip_y: bool,
) -> Vec<BoundingBox> {
    let (height, width) = (img_shape.0 as f64, img_shape.1 as f64);

    bboxes
        .iter()
        .map(|bbox| {
            let mut flipped = *bbox;
            if flip_x {
                flipped.x_min = width - 1.0 - bbox.x_max;
                flipped.x_max = width - 1.0 - bbox.x_min;
            }
            if flip_y {
                flipped.y_min = height - 1.0 - bbox.y_max;
                flipped.y_max = height - 1.0 - bbox.y_min;
            }
            flipped
        })
        .collect()
}
