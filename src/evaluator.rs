//! Main evaluation orchestrator for COCO object detection metrics.
//!
//! A run resets the accumulator, drains the dataset iterator once while
//! feeding predictor output and ground truth into it, then matches,
//! integrates and aggregates:
//!
//! ```text
//! Idle -> Traversing -> Aggregating -> Done
//! ```
//!
//! A failure at any stage returns the evaluator to `Idle` with empty buffers.

use crate::accumulator::Accumulator;
use crate::aggregate::{Aggregator, EvaluationResult};
use crate::error::{CocoEvalError, Result};
use crate::iterator::DatasetIterator;
use crate::matching::Matcher;
use crate::observation::ObservationSink;
use crate::params::EvaluationParams;
use crate::stats::TraversalStats;
use crate::types::{ImagePrediction, ImageRecord};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Observer name used when the predictor is not registered under another.
pub const DEFAULT_OBSERVER_NAME: &str = "main";

/// Turns a batch of images into per-image detections.
///
/// Must return exactly one [`ImagePrediction`] per image, in order.
pub trait Predictor<I> {
    fn predict(&mut self, images: &[&I]) -> Result<Vec<ImagePrediction>>;
}

impl<I, F> Predictor<I> for F
where
    F: FnMut(&[&I]) -> Result<Vec<ImagePrediction>>,
{
    fn predict(&mut self, images: &[&I]) -> Result<Vec<ImagePrediction>> {
        self(images)
    }
}

/// Lifecycle of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Traversing,
    Aggregating,
    Done,
}

/// Evaluates a detector over a dataset with the COCO protocol.
///
/// Not meant to be shared between concurrent runs; independent instances
/// are independent.
pub struct DetectionCocoEvaluator<It, P> {
    iterator: It,
    predictor: P,
    params: EvaluationParams,
    label_names: Option<Vec<String>>,
    name: Option<String>,
    observer_name: String,
    accumulator: Accumulator,
    state: EvaluatorState,
    last_stats: TraversalStats,
}

impl<It, P> DetectionCocoEvaluator<It, P>
where
    It: DatasetIterator,
    P: Predictor<It::Image>,
{
    pub fn new(iterator: It, predictor: P) -> Self {
        Self {
            iterator,
            predictor,
            params: EvaluationParams::default(),
            label_names: None,
            name: None,
            observer_name: DEFAULT_OBSERVER_NAME.to_string(),
            accumulator: Accumulator::new(),
            state: EvaluatorState::Idle,
            last_stats: TraversalStats::new(),
        }
    }

    pub fn with_params(mut self, params: EvaluationParams) -> Self {
        self.params = params;
        self
    }

    /// Names used as per-class key suffixes. Without names the label index
    /// is used.
    pub fn with_label_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.label_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Prefix for keys written by [`report`](Self::report).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name the predictor is registered under; prefixes every result key.
    pub fn with_observer_name(mut self, observer_name: impl Into<String>) -> Self {
        self.observer_name = observer_name.into();
        self
    }

    pub fn params(&self) -> &EvaluationParams {
        &self.params
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    /// Counters of the most recent traversal.
    pub fn last_stats(&self) -> &TraversalStats {
        &self.last_stats
    }

    /// Run a full evaluation over fresh state.
    ///
    /// Keys are prefixed with the observer name, e.g.
    /// `main/map/iou=0.50:0.95/area=all/maxDets=100`. Nothing is reported
    /// anywhere.
    ///
    /// # Errors
    ///
    /// Fails on invalid parameters, iterator protocol violations,
    /// misaligned predictor output, or a predictor error.
    pub fn evaluate(&mut self) -> Result<EvaluationResult> {
        self.params.validate()?;

        self.state = EvaluatorState::Traversing;
        let outcome = self.traverse().and_then(|records| {
            self.state = EvaluatorState::Aggregating;
            Ok(self.aggregate(&records))
        });

        match outcome {
            Ok(result) => {
                self.state = EvaluatorState::Done;
                Ok(result)
            }
            Err(e) => {
                self.accumulator.reset();
                self.state = EvaluatorState::Idle;
                Err(e)
            }
        }
    }

    /// Run [`evaluate`](Self::evaluate) and write every key into `sink`.
    ///
    /// When the evaluator has a name, keys are additionally prefixed with
    /// `{name}/`. The returned mapping is exactly what was written.
    pub fn report(&mut self, sink: Option<&mut dyn ObservationSink>) -> Result<EvaluationResult> {
        let result = self.evaluate()?;
        let result = match self.name.as_deref() {
            Some(name) if !name.is_empty() => result.prefixed(name),
            _ => result,
        };

        if let Some(sink) = sink {
            for (key, value) in result.iter() {
                sink.observe(key, value);
            }
        }

        Ok(result)
    }

    /// Drain the iterator once into the accumulator.
    fn traverse(&mut self) -> Result<Vec<ImageRecord>> {
        self.accumulator.reset();
        self.iterator.reset();
        let expected = self.iterator.dataset_len();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut stats = TraversalStats::new();

        while let Some(batch) = self.iterator.next_batch()? {
            for example in &batch {
                if expected.is_some_and(|len| example.index >= len) {
                    return Err(CocoEvalError::IteratorProtocol(format!(
                        "image index {} is beyond the dataset length {:?}",
                        example.index, expected
                    )));
                }
                if !seen.insert(example.index) {
                    return Err(CocoEvalError::IteratorProtocol(format!(
                        "image {} was yielded twice in one pass",
                        example.index
                    )));
                }
                if let Some(ann) = example.annotations.iter().find(|ann| !ann.bbox.is_valid()) {
                    return Err(CocoEvalError::InvalidBoundingBox(format!(
                        "ground truth box {:?} of image {} is not a valid XYXY box",
                        ann.bbox, example.index
                    )));
                }
            }

            let images: Vec<&It::Image> = batch.iter().map(|example| &example.image).collect();
            let predictions = self.predictor.predict(&images)?;
            if predictions.len() != batch.len() {
                return Err(CocoEvalError::CardinalityMismatch(format!(
                    "predictor returned {} results for a batch of {} images",
                    predictions.len(),
                    batch.len()
                )));
            }

            stats.record_batch();
            for (example, prediction) in batch.into_iter().zip(predictions) {
                let detections = prediction.into_detections()?;
                stats.record_image(&example.annotations, &detections);
                self.accumulator.add_ground_truth(example.annotations);
                self.accumulator.add_predictions(detections);
            }
            debug!(
                "batch {}: {} images accumulated",
                stats.batches,
                self.accumulator.len()
            );
        }

        if let Some(len) = expected {
            if seen.len() != len {
                return Err(CocoEvalError::IteratorProtocol(format!(
                    "iterator stopped after {} of {} images",
                    seen.len(),
                    len
                )));
            }
        }

        info!("traversal finished: {}", stats.summary_string());
        self.last_stats = stats;
        self.accumulator.finalize()
    }

    /// Match, integrate and aggregate the accumulated records.
    ///
    /// Classes are the labels that occur plus every named index; labels are
    /// never used to size anything.
    fn aggregate(&self, records: &[ImageRecord]) -> EvaluationResult {
        let seen: BTreeSet<usize> = records
            .iter()
            .flat_map(|record| {
                record
                    .annotations
                    .iter()
                    .map(|ann| ann.label)
                    .chain(record.detections.iter().map(|det| det.label))
            })
            .collect();

        let class_names: BTreeMap<usize, String> = match &self.label_names {
            Some(names) => {
                let unnamed = seen.range(names.len()..).count();
                if unnamed > 0 {
                    warn!(
                        "{} labels found beyond the {} label names given; \
                         unnamed classes only count towards the mean",
                        unnamed,
                        names.len()
                    );
                }
                names.iter().cloned().enumerate().collect()
            }
            None => seen.iter().map(|&label| (label, label.to_string())).collect(),
        };
        let mut class_ids = seen;
        class_ids.extend(class_names.keys().copied());

        let table = Matcher::new(&self.params).match_records(records, &class_ids);
        let result = Aggregator::new(&self.params, &class_names).aggregate(&table);
        info!(
            "aggregated {} metrics over {} images and {} classes",
            result.len(),
            records.len(),
            class_ids.len()
        );

        result.prefixed(&self.observer_name)
    }
}
