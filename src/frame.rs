//! Polars export of per-class results.

use crate::aggregate::EvaluationResult;
use crate::error::Result;
use polars::prelude::*;

/// Build a long-format table of the per-class values in `result`.
///
/// One row per per-class key, with columns `metric` (the key without the
/// class suffix), `class` and `value`. Mean keys are left out. NaN values
/// are kept as NaN.
pub fn per_class_frame(result: &EvaluationResult, class_names: &[String]) -> Result<DataFrame> {
    let mut metrics: Vec<String> = Vec::new();
    let mut classes: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for (key, value) in result.iter() {
        let Some((metric, class)) = key.rsplit_once('/') else {
            continue;
        };
        if class_names.iter().any(|name| name == class) {
            metrics.push(metric.to_string());
            classes.push(class.to_string());
            values.push(value);
        }
    }

    let df = df! {
        "metric" => metrics,
        "class" => classes,
        "value" => values,
    }?;

    Ok(df)
}
