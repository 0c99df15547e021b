//! Aggregation of metric cells into per-class and mean scores.

use crate::matching::{CellKey, MatchTable};
use crate::metrics::ap::{calculate_ap, calculate_ar, calculate_map, calculate_mean};
use crate::params::EvaluationParams;
use serde::Serialize;
use std::collections::BTreeMap;

/// Which quantity a summary metric integrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    AveragePrecision,
    AverageRecall,
}

impl MetricKind {
    fn prefix(self) -> &'static str {
        match self {
            MetricKind::AveragePrecision => "ap",
            MetricKind::AverageRecall => "ar",
        }
    }
}

/// IoU thresholds a summary metric averages over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IouSelection {
    All,
    Single(usize),
}

/// One reported quantity, identified by indices into the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryMetric {
    pub kind: MetricKind,
    pub iou: IouSelection,
    pub area: usize,
    pub max_detections: usize,
}

impl SummaryMetric {
    /// Format the key, e.g. `ap/iou=0.50:0.95/area=all/maxDets=100`.
    pub fn key(&self, params: &EvaluationParams) -> String {
        let thresholds = &params.iou_thresholds;
        let iou = match self.iou {
            IouSelection::Single(t) => format!("{:.2}", thresholds[t]),
            IouSelection::All if thresholds.len() == 1 => format!("{:.2}", thresholds[0]),
            IouSelection::All => format!(
                "{:.2}:{:.2}",
                thresholds[0],
                thresholds[thresholds.len() - 1]
            ),
        };
        format!(
            "{}/iou={}/area={}/maxDets={}",
            self.kind.prefix(),
            iou,
            params.area_ranges[self.area].label,
            params.max_detections[self.max_detections]
        )
    }

    fn iou_indices(&self, params: &EvaluationParams) -> Vec<usize> {
        match self.iou {
            IouSelection::All => (0..params.iou_thresholds.len()).collect(),
            IouSelection::Single(t) => vec![t],
        }
    }
}

/// The COCO summary metrics available under `params`.
///
/// The first area range is the primary one and the largest cap is used
/// wherever COCO reports `maxDets=100`. Entries whose IoU threshold is not
/// configured are left out.
pub fn summary_metrics(params: &EvaluationParams) -> Vec<SummaryMetric> {
    let mut metrics = Vec::new();
    let Some(largest) = params.max_detections_index(params.max_detection_cap()) else {
        return metrics;
    };
    let metric = |kind, iou, area, max_detections| SummaryMetric {
        kind,
        iou,
        area,
        max_detections,
    };

    metrics.push(metric(MetricKind::AveragePrecision, IouSelection::All, 0, largest));
    if params.iou_thresholds.len() > 1 {
        for threshold in [0.5, 0.75] {
            if let Some(t) = params.iou_index(threshold) {
                metrics.push(metric(
                    MetricKind::AveragePrecision,
                    IouSelection::Single(t),
                    0,
                    largest,
                ));
            }
        }
    }
    for area in 1..params.area_ranges.len() {
        metrics.push(metric(MetricKind::AveragePrecision, IouSelection::All, area, largest));
    }

    for m in 0..params.max_detections.len() {
        metrics.push(metric(MetricKind::AverageRecall, IouSelection::All, 0, m));
    }
    for area in 1..params.area_ranges.len() {
        metrics.push(metric(MetricKind::AverageRecall, IouSelection::All, area, largest));
    }

    metrics
}

/// Mapping from metric key to scalar produced by one evaluation run.
///
/// Values are NaN for classes without ground truth. Two results compare
/// equal when they hold the same keys and each value is equal or both are
/// NaN.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationResult {
    values: BTreeMap<String, f64>,
}

impl EvaluationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Return a copy with every key prefixed by `{prefix}/`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        self.iter()
            .map(|(key, value)| (format!("{}/{}", prefix, key), value))
            .collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.values
    }
}

impl PartialEq for EvaluationResult {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().zip(&other.values).all(|((ka, va), (kb, vb))| {
                ka == kb && (va == vb || (va.is_nan() && vb.is_nan()))
            })
    }
}

impl FromIterator<(String, f64)> for EvaluationResult {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Turns a match table into the evaluation result.
#[derive(Debug, Clone)]
pub struct Aggregator<'a> {
    params: &'a EvaluationParams,
    class_names: &'a BTreeMap<usize, String>,
}

impl<'a> Aggregator<'a> {
    /// `class_names` maps a class id to the suffix of its per-class keys.
    pub fn new(params: &'a EvaluationParams, class_names: &'a BTreeMap<usize, String>) -> Self {
        Self {
            params,
            class_names,
        }
    }

    /// Score of one class for a summary metric.
    ///
    /// The mean over the selected IoU cells; NaN when the class has no
    /// ground truth in the metric's area range.
    pub fn class_score(&self, table: &MatchTable, metric: &SummaryMetric, class: usize) -> f64 {
        let cells: Vec<f64> = metric
            .iou_indices(self.params)
            .into_iter()
            .map(|iou| {
                let key = CellKey {
                    class,
                    iou,
                    area: metric.area,
                    max_detections: metric.max_detections,
                };
                match table.get(key) {
                    Some(cell) => match metric.kind {
                        MetricKind::AveragePrecision => {
                            calculate_ap(&cell.is_true_positive, cell.num_ground_truth)
                        }
                        MetricKind::AverageRecall => {
                            calculate_ar(&cell.is_true_positive, cell.num_ground_truth)
                        }
                    },
                    None => f64::NAN,
                }
            })
            .collect();
        calculate_mean(&cells)
    }

    /// Compute every summary metric, per named class and as a class mean.
    ///
    /// The mean covers every class in the table with ground truth in the
    /// metric's area range, named or not.
    pub fn aggregate(&self, table: &MatchTable) -> EvaluationResult {
        let mut result = EvaluationResult::new();

        for metric in summary_metrics(self.params) {
            let key = metric.key(self.params);
            let scores: BTreeMap<usize, f64> = table
                .classes()
                .iter()
                .map(|&class| (class, self.class_score(table, &metric, class)))
                .collect();

            let with_instances: Vec<f64> = scores
                .iter()
                .filter(|&(&class, _)| table.num_ground_truth(class, metric.area) > 0)
                .map(|(_, &score)| score)
                .collect();
            result.insert(format!("m{}", key), calculate_map(&with_instances));

            for (class, name) in self.class_names {
                let score = scores.get(class).copied().unwrap_or(f64::NAN);
                result.insert(format!("{}/{}", key, name), score);
            }
        }

        result
    }
}
