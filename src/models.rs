//! Data models for posturography reports.
//!
//! This module contains the core data structures shared by the parser,
//! the aggregator and the report generator: documents, test conditions,
//! metric readings and the derived aggregate rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single extracted metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Metric name as printed in the report (e.g. "Sway Path Length").
    pub name: String,
    /// Parsed numeric value. `None` when the value could not be read.
    pub value: Option<f64>,
    /// Raw value text after the label, kept for display.
    pub raw: String,
}

impl MetricReading {
    /// Creates a reading with a numeric value.
    pub fn numeric(name: impl Into<String>, value: f64, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            raw: raw.into(),
        }
    }

    /// Creates a reading whose value is missing.
    pub fn missing(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            raw: raw.into(),
        }
    }

    /// Returns true if the value is missing.
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// A named subsection of a report (one balance test protocol).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCondition {
    /// Join key used for cross-file comparison (e.g. "NSEO", "FEC Rt").
    pub key: String,
    /// Full name from the header line, without trailing colon.
    pub full_name: String,
    /// Readings in the order they appeared.
    pub metrics: Vec<MetricReading>,
}

impl TestCondition {
    /// Creates an empty condition.
    pub fn new(key: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            full_name: full_name.into(),
            metrics: Vec::new(),
        }
    }

    /// Look up a reading by metric name.
    pub fn metric(&self, name: &str) -> Option<&MetricReading> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Insert a reading, replacing an earlier one with the same name in place.
    pub fn upsert(&mut self, reading: MetricReading) {
        match self.metrics.iter_mut().find(|m| m.name == reading.name) {
            Some(existing) => *existing = reading,
            None => self.metrics.push(reading),
        }
    }
}

/// One parsed report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// User-visible label (usually the file name).
    pub label: String,
    /// First test date found in the report, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_date: Option<NaiveDate>,
    /// Test conditions in report order.
    pub conditions: Vec<TestCondition>,
}

impl RawDocument {
    /// Creates an empty document.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            test_date: None,
            conditions: Vec::new(),
        }
    }

    /// Look up a condition by key.
    pub fn condition(&self, key: &str) -> Option<&TestCondition> {
        self.conditions.iter().find(|c| c.key == key)
    }

    /// Numeric value of `metric` under `condition`, if present and parseable.
    pub fn value(&self, condition: &str, metric: &str) -> Option<f64> {
        self.condition(condition)
            .and_then(|c| c.metric(metric))
            .and_then(|m| m.value)
    }

    /// Returns true if no condition was recognized.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Total number of readings across all conditions.
    pub fn reading_count(&self) -> usize {
        self.conditions.iter().map(|c| c.metrics.len()).sum()
    }
}

/// Derived statistics for one aggregate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowStats {
    /// Mean of the present values.
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1) of the present values.
    pub std_dev: Option<f64>,
    /// Latest minus baseline; only with exactly two documents.
    pub change: Option<f64>,
    /// (latest - baseline) / baseline * 100; only with exactly two documents.
    pub percent_change: Option<f64>,
}

/// One (metric, condition) pair compared across documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub metric: String,
    pub condition: String,
    /// One slot per document, in document order.
    pub values: Vec<Option<f64>>,
    pub stats: RowStats,
}

impl AggregateRow {
    /// Number of documents that contributed a value.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Whether a higher or lower raw value means better balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::High => write!(f, "higher is better"),
            Direction::Low => write!(f, "lower is better"),
        }
    }
}
