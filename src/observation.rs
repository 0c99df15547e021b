//! Destinations for reported metric values.

use crate::aggregate::EvaluationResult;
use std::collections::{BTreeMap, HashMap};

/// A reporting scope that accepts key to scalar writes.
///
/// Passed explicitly to [`crate::evaluator::DetectionCocoEvaluator::report`];
/// when no sink is given nothing is written anywhere.
pub trait ObservationSink {
    fn observe(&mut self, key: &str, value: f64);
}

impl ObservationSink for BTreeMap<String, f64> {
    fn observe(&mut self, key: &str, value: f64) {
        self.insert(key.to_string(), value);
    }
}

impl ObservationSink for HashMap<String, f64> {
    fn observe(&mut self, key: &str, value: f64) {
        self.insert(key.to_string(), value);
    }
}

impl ObservationSink for EvaluationResult {
    fn observe(&mut self, key: &str, value: f64) {
        self.insert(key, value);
    }
}
