//! Session-scoped document store.
//!
//! Holds the documents loaded during one session, per-upload failures,
//! the current selection and the interpretation state. Every aggregation
//! reads from here; nothing is global.

use crate::analysis::{condition_catalog, metric_catalog};
use crate::models::RawDocument;
use crate::narrative::NarrativeError;
use crate::parser::{self, ParseError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Metric selected by default when the data has it.
pub const DEFAULT_METRIC: &str = "Stability Score";

/// An upload that could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub label: String,
    pub message: String,
}

/// What the user is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// One metric compared across conditions (bar chart view).
    Metric {
        metric: String,
        condition: Option<String>,
    },
    /// Several metrics of one condition (radar view).
    Radar {
        condition: String,
        metrics: Vec<String>,
    },
}

/// Identifies one narrative request. Only the latest token may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// State of the narrative interpretation for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    Idle,
    Pending(RequestToken),
    Ready(String),
    Failed(String),
}

/// Documents and derived state for one interactive session.
#[derive(Debug)]
pub struct Session {
    documents: Vec<RawDocument>,
    failures: Vec<LoadFailure>,
    selection: Option<Selection>,
    generation: u64,
    interpretation: Interpretation,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            failures: Vec::new(),
            selection: None,
            generation: 0,
            interpretation: Interpretation::Idle,
        }
    }

    /// Parse an upload and add it to the session.
    ///
    /// A decode failure is recorded and returned; documents already
    /// loaded are unaffected.
    pub fn add_upload(&mut self, label: &str, bytes: &[u8]) -> Result<&RawDocument, ParseError> {
        match parser::parse_bytes(label, bytes) {
            Ok(document) => {
                if document.is_empty() {
                    warn!("{}: no test conditions recognized", label);
                }
                Ok(self.add_document(document))
            }
            Err(e) => {
                warn!("Rejected upload {}: {}", label, e);
                self.failures.push(LoadFailure {
                    label: label.to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Add an already parsed document.
    pub fn add_document(&mut self, document: RawDocument) -> &RawDocument {
        debug!(
            "Adding {} with {} conditions",
            document.label,
            document.conditions.len()
        );
        self.documents.push(document);
        self.invalidate();
        &self.documents[self.documents.len() - 1]
    }

    /// Record a failure that happened before parsing (e.g. unreadable file).
    pub fn record_failure(&mut self, label: &str, message: impl Into<String>) {
        self.failures.push(LoadFailure {
            label: label.to_string(),
            message: message.into(),
        });
    }

    /// Documents in load order.
    pub fn documents(&self) -> &[RawDocument] {
        &self.documents
    }

    /// Labels of loaded documents in order.
    pub fn labels(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.label.clone()).collect()
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// True when no document with at least one condition is loaded.
    pub fn has_data(&self) -> bool {
        self.documents.iter().any(|d| !d.is_empty())
    }

    /// Reorder documents by test date, oldest first.
    ///
    /// Undated documents keep their relative order after the dated ones.
    pub fn sort_by_test_date(&mut self) {
        self.documents
            .sort_by_key(|d| (d.test_date.is_none(), d.test_date));
        self.invalidate();
    }

    /// All metric names in first-seen order.
    pub fn metrics(&self) -> Vec<String> {
        metric_catalog(&self.documents)
    }

    /// All condition keys in first-seen order.
    pub fn conditions(&self) -> Vec<String> {
        condition_catalog(&self.documents)
    }

    /// The metric preselected for the bar view.
    pub fn default_metric(&self) -> Option<String> {
        let metrics = self.metrics();
        if metrics.iter().any(|m| m == DEFAULT_METRIC) {
            return Some(DEFAULT_METRIC.to_string());
        }
        metrics.into_iter().next()
    }

    /// Change the selection. A different selection invalidates any
    /// in-flight or finished interpretation.
    pub fn select(&mut self, selection: Selection) {
        if self.selection.as_ref() != Some(&selection) {
            debug!("Selection changed: {:?}", selection);
            self.selection = Some(selection);
            self.invalidate();
        }
    }

    /// Start a narrative request for the current selection.
    pub fn begin_request(&mut self) -> RequestToken {
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.interpretation = Interpretation::Pending(token);
        token
    }

    /// Apply a narrative result. Returns false and discards it when the
    /// token is stale.
    pub fn apply_result(
        &mut self,
        token: RequestToken,
        result: Result<String, NarrativeError>,
    ) -> bool {
        if token.0 != self.generation {
            info!("Discarding stale interpretation result");
            return false;
        }

        self.interpretation = match result {
            Ok(text) => Interpretation::Ready(text),
            Err(e) => Interpretation::Failed(e.to_string()),
        };
        true
    }

    pub fn interpretation(&self) -> &Interpretation {
        &self.interpretation
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.interpretation = Interpretation::Idle;
    }
}
