//! Report generation.
//!
//! This module renders a comparison view, its metadata, the optional
//! interpretation and any load failures as Markdown, JSON or plain text.

use crate::models::Direction;
use crate::report::chart::{ChartData, RadarChartData};
use crate::report::table::format_value;
use crate::report::view::ComparisonView;
use crate::session::{Interpretation, LoadFailure, Session};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Per-document metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub label: String,
    pub test_date: Option<NaiveDate>,
    pub conditions: usize,
    pub readings: usize,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub documents: Vec<DocumentInfo>,
    pub model_used: Option<String>,
}

/// Outcome of an interpretation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InterpretationSection {
    Ready { text: String },
    Failed { error: String },
}

impl InterpretationSection {
    /// Section for the session's interpretation state, if one was requested.
    pub fn from_state(state: &Interpretation) -> Option<Self> {
        match state {
            Interpretation::Ready(text) => Some(Self::Ready { text: text.clone() }),
            Interpretation::Failed(error) => Some(Self::Failed {
                error: error.clone(),
            }),
            Interpretation::Idle | Interpretation::Pending(_) => None,
        }
    }
}

/// A complete comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub metadata: ReportMetadata,
    #[serde(flatten)]
    pub view: ComparisonView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<InterpretationSection>,
    pub load_failures: Vec<LoadFailure>,
}

impl ComparisonReport {
    /// Assemble a report from the session state and a built view.
    pub fn new(session: &Session, view: ComparisonView, model_used: Option<String>) -> Self {
        let documents = session
            .documents()
            .iter()
            .map(|d| DocumentInfo {
                label: d.label.clone(),
                test_date: d.test_date,
                conditions: d.conditions.len(),
                readings: d.reading_count(),
            })
            .collect();

        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                documents,
                model_used,
            },
            view,
            interpretation: InterpretationSection::from_state(session.interpretation()),
            load_failures: session.failures().to_vec(),
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ComparisonReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# Posturography Comparison: {}\n\n",
        report.view.title
    ));

    output.push_str(&generate_metadata_section(&report.metadata));

    if let ChartData::Radar(ref radar) = report.view.chart {
        output.push_str(&generate_radar_section(radar));
    }

    output.push_str(&generate_table_section(report));

    if let Some(ref interpretation) = report.interpretation {
        output.push_str(&generate_interpretation_section(interpretation));
    }

    output.push_str(&generate_failures_section(&report.load_failures));

    output.push_str(&generate_footer(&report.metadata.tool_version));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Files Compared:** {}\n",
        metadata.documents.len()
    ));
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push('\n');

    if !metadata.documents.is_empty() {
        section.push_str("| # | File | Test Date | Conditions | Readings |\n");
        section.push_str("|---:|:---|:---|---:|---:|\n");
        for (i, doc) in metadata.documents.iter().enumerate() {
            let date = doc
                .test_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "—".to_string());
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                doc.label,
                date,
                doc.conditions,
                doc.readings
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the radar score section.
fn generate_radar_section(radar: &RadarChartData) -> String {
    let mut section = String::new();

    section.push_str("## Radar Profile\n\n");
    if radar.normalized {
        section.push_str(
            "Scores are scaled per metric to 0-100 against the largest value among the \
             loaded files; 100 is the best value. ↓ marks metrics where lower is better.\n\n",
        );
    } else {
        section.push_str("Raw values, not normalized.\n\n");
    }

    if radar.axes.is_empty() {
        section.push_str("*No metrics selected.*\n\n");
        return section;
    }

    section.push_str("| Metric |");
    for series in &radar.series {
        section.push_str(&format!(" {} |", series.name));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(radar.series.len()));
    section.push('\n');

    for (i, (axis, direction)) in radar.axes.iter().zip(&radar.directions).enumerate() {
        let arrow = match direction {
            Direction::High => "↑",
            Direction::Low => "↓",
        };
        section.push_str(&format!("| {} {} |", axis, arrow));
        for series in &radar.series {
            let score = series.scores.get(i).copied().flatten();
            section.push_str(&format!(" {} |", format_value(score, 1)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the summary table section.
fn generate_table_section(report: &ComparisonReport) -> String {
    let mut section = String::new();

    section.push_str("## Summary Table\n\n");
    if report.view.table.is_empty() {
        section.push_str("*No data for this selection.*\n\n");
        return section;
    }

    section.push_str(&report.view.table.to_markdown());
    section.push('\n');

    section
}

/// Generate the interpretation section.
fn generate_interpretation_section(interpretation: &InterpretationSection) -> String {
    let mut section = String::new();

    section.push_str("## Interpretation\n\n");
    match interpretation {
        InterpretationSection::Ready { text } => {
            section.push_str(text.trim());
            section.push_str("\n\n");
            section.push_str(
                "> Generated by a language model. Not a diagnosis; review with a clinician.\n\n",
            );
        }
        InterpretationSection::Failed { error } => {
            section.push_str(&format!("⚠️ Interpretation unavailable: {}\n\n", error));
        }
    }

    section
}

/// Generate the load failures section.
fn generate_failures_section(failures: &[LoadFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Load Failures\n\n");
    for failure in failures {
        section.push_str(&format!("- **{}:** {}\n", failure.label, failure.message));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer(version: &str) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!("*Report generated by posturo v{}*\n", version));

    footer
}

/// Generate a plain-text report: the summary table and interpretation.
pub fn generate_text_report(report: &ComparisonReport) -> String {
    let mut output = String::new();

    output.push_str(&report.view.title);
    output.push_str("\n\n");
    output.push_str(&report.view.table.to_text());

    if let Some(ref interpretation) = report.interpretation {
        output.push('\n');
        match interpretation {
            InterpretationSection::Ready { text } => output.push_str(text.trim()),
            InterpretationSection::Failed { error } => {
                output.push_str(&format!("Interpretation unavailable: {}", error))
            }
        }
        output.push('\n');
    }

    for failure in &report.load_failures {
        output.push_str(&format!("\nnot loaded: {}: {}", failure.label, failure.message));
    }
    if !report.load_failures.is_empty() {
        output.push('\n');
    }

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ComparisonReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
