//! Chart-ready data.
//!
//! Plain series shapes for an external renderer. Missing values stay
//! `None` so the renderer draws a gap instead of a zero.

use crate::analysis::RadarProfile;
use crate::models::{AggregateRow, Direction};
use serde::Serialize;

/// One document's bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Grouped bar chart: one group per condition, one bar per document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartData {
    pub metric: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChartData {
    pub fn from_rows(metric: &str, labels: &[String], rows: &[AggregateRow]) -> Self {
        let categories = rows.iter().map(|r| r.condition.clone()).collect();

        let series = labels
            .iter()
            .enumerate()
            .map(|(i, label)| BarSeries {
                name: label.clone(),
                values: rows
                    .iter()
                    .map(|r| r.values.get(i).copied().flatten())
                    .collect(),
            })
            .collect();

        Self {
            metric: metric.to_string(),
            categories,
            series,
        }
    }
}

/// One document's radar polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub name: String,
    /// Plotted values, one per axis.
    pub scores: Vec<Option<f64>>,
    /// Original values, one per axis, for hover text.
    pub values: Vec<Option<f64>>,
}

/// Radar chart of one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChartData {
    pub condition: String,
    pub normalized: bool,
    pub axes: Vec<String>,
    pub directions: Vec<Direction>,
    pub series: Vec<RadarSeries>,
}

impl RadarChartData {
    pub fn from_profile(labels: &[String], profile: &RadarProfile) -> Self {
        let series = labels
            .iter()
            .enumerate()
            .map(|(i, label)| RadarSeries {
                name: label.clone(),
                scores: profile
                    .axes
                    .iter()
                    .map(|a| a.scores.get(i).copied().flatten())
                    .collect(),
                values: profile
                    .axes
                    .iter()
                    .map(|a| a.values.get(i).copied().flatten())
                    .collect(),
            })
            .collect();

        Self {
            condition: profile.condition.clone(),
            normalized: profile.normalized,
            axes: profile.axes.iter().map(|a| a.metric.clone()).collect(),
            directions: profile.axes.iter().map(|a| a.direction).collect(),
            series,
        }
    }
}

/// Chart data for either view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    Bar(BarChartData),
    Radar(RadarChartData),
}
