//! Greedy matching of detections to ground truth for every metric cell.
//!
//! A cell is one `(class, IoU threshold, area range, max detections)`
//! combination. For each cell the matcher produces the dataset-wide ranked
//! sequence of true/false-positive flags and the number of ground truth
//! instances that count towards recall.

use crate::metrics::iou::calculate_iou_matrix;
use crate::params::{AreaRange, EvaluationParams};
use crate::types::{Annotation, BoundingBox, Detection, ImageRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one detection at one IoU threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    TruePositive,
    FalsePositive,
    /// Matched a crowd or out-of-range annotation, or fell outside the area
    /// range unmatched. Excluded from precision and recall.
    Ignored,
}

/// Matching result for one image, class and area range.
#[derive(Debug, Clone, Default)]
pub struct ImageMatches {
    /// Detection scores, sorted descending and truncated to the cap.
    pub scores: Vec<f64>,
    /// `outcomes[t][d]` is the outcome of detection `d` at IoU threshold `t`.
    pub outcomes: Vec<Vec<MatchOutcome>>,
    /// Annotations that are neither crowd nor outside the area range.
    pub num_ground_truth: usize,
}

/// Match one image's detections of a single class against its annotations.
///
/// Detections are visited by descending score. Each one takes the
/// highest-IoU unmatched regular annotation meeting the threshold; failing
/// that, an ignored annotation (crowd or out of range) meeting the threshold
/// makes it ignored. Crowd regions can absorb any number of detections,
/// every other annotation matches at most once.
pub fn match_image(
    annotations: &[&Annotation],
    detections: &[&Detection],
    area_range: &AreaRange,
    iou_thresholds: &[f64],
    max_detections: usize,
) -> ImageMatches {
    // Regular annotations first, ignored ones last
    let mut gts: Vec<&Annotation> = annotations.to_vec();
    let is_ignored = |ann: &Annotation| ann.crowd || !area_range.contains(ann.area());
    gts.sort_by_key(|ann| is_ignored(*ann));
    let gt_ignore: Vec<bool> = gts.iter().map(|ann| is_ignored(*ann)).collect();
    let gt_crowd: Vec<bool> = gts.iter().map(|ann| ann.crowd).collect();
    let num_ground_truth = gt_ignore.iter().filter(|&&ignored| !ignored).count();

    let mut dts: Vec<&Detection> = detections.to_vec();
    dts.sort_by(|a, b| b.score.total_cmp(&a.score));
    dts.truncate(max_detections);

    let dt_boxes: Vec<BoundingBox> = dts.iter().map(|det| det.bbox).collect();
    let gt_boxes: Vec<BoundingBox> = gts.iter().map(|ann| ann.bbox).collect();
    let ious = calculate_iou_matrix(&dt_boxes, &gt_boxes, &gt_crowd);

    let outcomes: Vec<Vec<MatchOutcome>> = iou_thresholds
        .iter()
        .map(|&threshold| {
            let mut gt_matched = vec![false; gts.len()];

            dts.iter()
                .enumerate()
                .map(|(d, det)| {
                    let mut best_iou = threshold.min(1.0 - 1e-10);
                    let mut best_gt: Option<usize> = None;

                    for g in 0..gts.len() {
                        if gt_matched[g] && !gt_crowd[g] {
                            continue;
                        }
                        // A regular match beats any ignored annotation
                        if let Some(m) = best_gt {
                            if !gt_ignore[m] && gt_ignore[g] {
                                break;
                            }
                        }
                        if ious[d][g] < best_iou {
                            continue;
                        }
                        best_iou = ious[d][g];
                        best_gt = Some(g);
                    }

                    match best_gt {
                        Some(m) => {
                            gt_matched[m] = true;
                            if gt_ignore[m] {
                                MatchOutcome::Ignored
                            } else {
                                MatchOutcome::TruePositive
                            }
                        }
                        None if !area_range.contains(det.bbox.area()) => MatchOutcome::Ignored,
                        None => MatchOutcome::FalsePositive,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    ImageMatches {
        scores: dts.iter().map(|det| det.score).collect(),
        outcomes,
        num_ground_truth,
    }
}

/// Identifies one metric cell by index into the evaluation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub class: usize,
    pub iou: usize,
    pub area: usize,
    pub max_detections: usize,
}

/// Ranked true/false-positive flags of one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSequence {
    /// Non-ignored detections across the dataset, by descending score.
    pub is_true_positive: Vec<bool>,
    pub num_ground_truth: usize,
}

/// Match sequences for every cell of an evaluation.
///
/// Only the classes passed to [`Matcher::match_records`] get cells; label
/// values are used as keys and never as offsets.
#[derive(Debug, Clone)]
pub struct MatchTable {
    /// Sorted, distinct class ids.
    classes: Vec<usize>,
    num_ious: usize,
    num_areas: usize,
    num_max_detections: usize,
    cells: Vec<MatchSequence>,
}

impl MatchTable {
    fn index(&self, key: CellKey) -> Option<usize> {
        if key.iou >= self.num_ious
            || key.area >= self.num_areas
            || key.max_detections >= self.num_max_detections
        {
            return None;
        }
        let slot = self.classes.binary_search(&key.class).ok()?;
        Some(
            ((slot * self.num_areas + key.area) * self.num_max_detections + key.max_detections)
                * self.num_ious
                + key.iou,
        )
    }

    pub fn get(&self, key: CellKey) -> Option<&MatchSequence> {
        self.index(key).map(|i| &self.cells[i])
    }

    /// Class ids with cells, ascending.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Ground truth instances of a class within an area range.
    pub fn num_ground_truth(&self, class: usize, area: usize) -> usize {
        self.get(CellKey {
            class,
            iou: 0,
            area,
            max_detections: 0,
        })
        .map_or(0, |cell| cell.num_ground_truth)
    }
}

/// Annotations and detections of one class within one image.
#[derive(Default)]
struct ClassGroup<'r> {
    annotations: Vec<&'r Annotation>,
    detections: Vec<&'r Detection>,
}

/// Group an image's objects by class label.
fn group_by_class(record: &ImageRecord) -> BTreeMap<usize, ClassGroup<'_>> {
    let mut groups: BTreeMap<usize, ClassGroup<'_>> = BTreeMap::new();
    for ann in &record.annotations {
        groups.entry(ann.label).or_default().annotations.push(ann);
    }
    for det in &record.detections {
        groups.entry(det.label).or_default().detections.push(det);
    }
    groups
}

/// Runs the per-image matching for every cell and merges across images.
#[derive(Debug, Clone)]
pub struct Matcher<'p> {
    params: &'p EvaluationParams,
}

impl<'p> Matcher<'p> {
    pub fn new(params: &'p EvaluationParams) -> Self {
        Self { params }
    }

    /// Build the match table for the classes in `class_ids`.
    ///
    /// Objects with other labels are not evaluated.
    pub fn match_records(
        &self,
        records: &[ImageRecord],
        class_ids: &BTreeSet<usize>,
    ) -> MatchTable {
        let params = self.params;
        let largest_cap = params.max_detection_cap();
        let grouped: Vec<BTreeMap<usize, ClassGroup<'_>>> =
            records.iter().map(group_by_class).collect();

        let mut cells = Vec::with_capacity(
            class_ids.len()
                * params.area_ranges.len()
                * params.max_detections.len()
                * params.iou_thresholds.len(),
        );

        for &class in class_ids {
            for area_range in &params.area_ranges {
                // Matching with the largest cap; smaller caps take a prefix,
                // which is valid because greedy matching never looks ahead.
                let images: Vec<ImageMatches> = grouped
                    .iter()
                    .filter_map(|groups| groups.get(&class))
                    .map(|group| {
                        match_image(
                            &group.annotations,
                            &group.detections,
                            area_range,
                            &params.iou_thresholds,
                            largest_cap,
                        )
                    })
                    .collect();
                let num_ground_truth: usize =
                    images.iter().map(|img| img.num_ground_truth).sum();

                for &cap in &params.max_detections {
                    let ranked = rank_detections(&images, cap);

                    for t in 0..params.iou_thresholds.len() {
                        let is_true_positive = ranked
                            .iter()
                            .map(|&(img, d)| images[img].outcomes[t][d])
                            .filter(|&outcome| outcome != MatchOutcome::Ignored)
                            .map(|outcome| outcome == MatchOutcome::TruePositive)
                            .collect();
                        cells.push(MatchSequence {
                            is_true_positive,
                            num_ground_truth,
                        });
                    }
                }
            }
        }

        MatchTable {
            classes: class_ids.iter().copied().collect(),
            num_ious: params.iou_thresholds.len(),
            num_areas: params.area_ranges.len(),
            num_max_detections: params.max_detections.len(),
            cells,
        }
    }
}

/// Order the first `cap` detections of every image by descending score.
///
/// Ties keep traversal order, then per-image rank.
fn rank_detections(images: &[ImageMatches], cap: usize) -> Vec<(usize, usize)> {
    let mut ranked: Vec<(usize, usize)> = images
        .iter()
        .enumerate()
        .flat_map(|(img, matches)| (0..matches.scores.len().min(cap)).map(move |d| (img, d)))
        .collect();
    ranked.sort_by(|&(ia, da), &(ib, db)| {
        images[ib].scores[db].total_cmp(&images[ia].scores[da])
    });
    ranked
}
