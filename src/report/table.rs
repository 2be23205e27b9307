//! Summary tables.
//!
//! Formats aggregate rows for display. Formatting only touches the
//! rendered strings; the numeric rows are never modified.

use crate::config::ReportConfig;
use crate::models::AggregateRow;
use serde::Serialize;

/// Shown in place of a missing value.
pub const MISSING: &str = "—";

/// Derived statistic columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatColumn {
    Change,
    PercentChange,
    Mean,
    StdDev,
}

impl StatColumn {
    pub fn header(&self) -> &'static str {
        match self {
            StatColumn::Change => "Change",
            StatColumn::PercentChange => "% Change",
            StatColumn::Mean => "Mean",
            StatColumn::StdDev => "Std Dev",
        }
    }
}

/// Which statistics to show for a given number of documents.
pub fn stat_columns(document_count: usize) -> Vec<StatColumn> {
    match document_count {
        0 | 1 => Vec::new(),
        2 => vec![StatColumn::Change, StatColumn::PercentChange],
        _ => vec![StatColumn::Mean, StatColumn::StdDev],
    }
}

/// Format a value with a fixed number of decimals.
pub fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => MISSING.to_string(),
    }
}

/// Format a signed percentage with a trailing `%`.
pub fn format_percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:+.*}%", decimals, v),
        None => MISSING.to_string(),
    }
}

/// A display table: header plus string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SummaryTable {
    /// Build the table for rows over the given documents.
    pub fn from_rows(labels: &[String], rows: &[AggregateRow], format: &ReportConfig) -> Self {
        let stats = stat_columns(labels.len());

        let mut columns = vec!["Metric".to_string(), "Condition".to_string()];
        columns.extend(labels.iter().cloned());
        columns.extend(stats.iter().map(|s| s.header().to_string()));

        let rows = rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.metric.clone(), row.condition.clone()];
                cells.extend(
                    row.values
                        .iter()
                        .map(|v| format_value(*v, format.decimals)),
                );
                cells.extend(stats.iter().map(|stat| match stat {
                    StatColumn::Change => format_value(row.stats.change, format.decimals),
                    StatColumn::PercentChange => {
                        format_percent(row.stats.percent_change, format.percent_decimals)
                    }
                    StatColumn::Mean => format_value(row.stats.mean, format.decimals),
                    StatColumn::StdDev => format_value(row.stats.std_dev, format.decimals),
                }));
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render as aligned plain text.
    ///
    /// This is the form substituted into narrative prompts.
    pub fn to_text(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    // Name columns left-aligned, numbers right-aligned.
                    if i < 2 {
                        format!("{:<width$}", cell, width = *width)
                    } else {
                        format!("{:>width$}", cell, width = *width)
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        out.push_str(&line(&self.columns));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }

        out
    }

    /// Render as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("| {} |\n", self.columns.join(" | ")));
        let align: Vec<&str> = (0..self.columns.len())
            .map(|i| if i < 2 { ":---" } else { "---:" })
            .collect();
        out.push_str(&format!("|{}|\n", align.join("|")));

        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        out
    }
}
