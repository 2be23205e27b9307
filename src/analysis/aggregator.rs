//! Cross-document aggregation.
//!
//! Builds [`AggregateRow`]s from documents in load order. Rows carry one
//! slot per document; missing readings stay missing all the way through.

use crate::analysis::stats::row_stats;
use crate::models::{AggregateRow, RawDocument};

/// Build a row for one (metric, condition) pair.
pub fn aggregate_row(documents: &[RawDocument], metric: &str, condition: &str) -> AggregateRow {
    let values: Vec<Option<f64>> = documents
        .iter()
        .map(|doc| doc.value(condition, metric))
        .collect();

    AggregateRow {
        metric: metric.to_string(),
        condition: condition.to_string(),
        stats: row_stats(&values),
        values,
    }
}

/// Compare one metric across documents.
///
/// With a condition, returns at most one row (none if no document
/// reports the metric under that condition). Without, returns one row
/// per condition that reports the metric anywhere, in first-seen order.
pub fn aggregate(
    documents: &[RawDocument],
    metric: &str,
    condition: Option<&str>,
) -> Vec<AggregateRow> {
    let conditions = conditions_with_metric(documents, metric);

    conditions
        .iter()
        .filter(|c| condition.map_or(true, |wanted| wanted == c.as_str()))
        .map(|c| aggregate_row(documents, metric, c))
        .collect()
}

/// Comprehensive view of one condition.
///
/// Without a selection, one row per metric present in the condition in
/// any document, in first-seen order. With a selection, exactly the
/// selected metrics in the given order.
pub fn aggregate_condition(
    documents: &[RawDocument],
    condition: &str,
    metrics: Option<&[String]>,
) -> Vec<AggregateRow> {
    let names = match metrics {
        Some(selected) => selected.to_vec(),
        None => metrics_in_condition(documents, condition),
    };

    names
        .iter()
        .map(|metric| aggregate_row(documents, metric, condition))
        .collect()
}

/// Conditions that report `metric` in at least one document, first-seen order.
pub fn conditions_with_metric(documents: &[RawDocument], metric: &str) -> Vec<String> {
    let mut seen = Vec::new();

    for condition in documents.iter().flat_map(|d| &d.conditions) {
        if condition.metric(metric).is_some() && !seen.contains(&condition.key) {
            seen.push(condition.key.clone());
        }
    }

    seen
}

/// Metric names present under `condition` across documents, first-seen order.
pub fn metrics_in_condition(documents: &[RawDocument], condition: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for reading in documents
        .iter()
        .filter_map(|d| d.condition(condition))
        .flat_map(|c| &c.metrics)
    {
        if !seen.contains(&reading.name) {
            seen.push(reading.name.clone());
        }
    }

    seen
}

/// All metric names across documents, first-seen order.
pub fn metric_catalog(documents: &[RawDocument]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for reading in documents
        .iter()
        .flat_map(|d| &d.conditions)
        .flat_map(|c| &c.metrics)
    {
        if !seen.contains(&reading.name) {
            seen.push(reading.name.clone());
        }
    }

    seen
}

/// All condition keys across documents, first-seen order.
pub fn condition_catalog(documents: &[RawDocument]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for condition in documents.iter().flat_map(|d| &d.conditions) {
        if !seen.contains(&condition.key) {
            seen.push(condition.key.clone());
        }
    }

    seen
}
