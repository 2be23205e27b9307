//! Radar profile normalization.
//!
//! Each metric is scaled on its own: the basis is the largest absolute
//! value of that metric among the loaded documents for the selected
//! condition. Lower-is-better metrics are inverted so that 100 is always
//! the best score.

use crate::config::RadarConfig;
use crate::models::{AggregateRow, Direction};
use serde::Serialize;

/// One radar axis (one metric) with per-document scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub metric: String,
    pub direction: Direction,
    /// Normalization basis (max absolute value, 1.0 when all zero).
    pub basis: f64,
    /// Plotted values per document: 0-100 scores, or raw values when
    /// normalization is off.
    pub scores: Vec<Option<f64>>,
    /// Original values per document.
    pub values: Vec<Option<f64>>,
}

/// A comprehensive profile of one condition across documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarProfile {
    pub condition: String,
    pub normalized: bool,
    pub axes: Vec<RadarAxis>,
}

/// Normalization basis for one metric's values.
pub fn basis(values: &[Option<f64>]) -> f64 {
    let max = values
        .iter()
        .flatten()
        .map(|v| v.abs())
        .fold(0.0_f64, f64::max);

    if max > 0.0 {
        max
    } else {
        1.0
    }
}

/// Score a single value on the 0-100 scale.
pub fn score(value: f64, basis: f64, direction: Direction) -> f64 {
    let mut normalized = value / basis;

    if direction == Direction::Low {
        normalized = 1.0 - normalized.abs();
    }

    normalized.max(0.0) * 100.0
}

/// Build a radar profile from comprehensive-view rows of one condition.
pub fn build_profile(condition: &str, rows: &[AggregateRow], radar: &RadarConfig) -> RadarProfile {
    let axes = rows
        .iter()
        .map(|row| {
            let direction = radar.direction(&row.metric);
            let basis = basis(&row.values);

            let scores = row
                .values
                .iter()
                .map(|v| {
                    v.map(|v| {
                        if radar.normalize {
                            score(v, basis, direction)
                        } else {
                            v
                        }
                    })
                })
                .collect();

            RadarAxis {
                metric: row.metric.clone(),
                direction,
                basis,
                scores,
                values: row.values.clone(),
            }
        })
        .collect();

    RadarProfile {
        condition: condition.to_string(),
        normalized: radar.normalize,
        axes,
    }
}

/// Radar metrics to show by default: configured key metrics that exist
/// in the loaded data, in configured order.
pub fn default_selection(radar: &RadarConfig, available: &[String]) -> Vec<String> {
    radar
        .key_metrics
        .iter()
        .filter(|k| available.contains(&k.name))
        .map(|k| k.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::aggregate_condition;
    use crate::parser::parse;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-6).unwrap_or(false)
    }

    #[test]
    fn test_basis() {
        assert_eq!(basis(&[Some(-8.0), Some(4.0), None]), 8.0);
        assert_eq!(basis(&[Some(0.0), None]), 1.0);
        assert_eq!(basis(&[]), 1.0);
    }

    #[test]
    fn test_score_directions() {
        assert!((score(50.0, 100.0, Direction::High) - 50.0).abs() < 1e-9);
        assert!((score(25.0, 100.0, Direction::Low) - 75.0).abs() < 1e-9);
        assert!((score(100.0, 100.0, Direction::Low) - 0.0).abs() < 1e-9);
        // Negative values on a higher-is-better axis clamp to zero.
        assert_eq!(score(-5.0, 10.0, Direction::High), 0.0);
    }

    #[test]
    fn test_profile_per_metric_scaling() {
        let docs = vec![
            parse("A.txt", "Test 1: NSEO\nStability Score: 80\nSway Path Length: 40\n"),
            parse("B.txt", "Test 1: NSEO\nStability Score: 100\nSway Path Length: 10\n"),
            parse("C.txt", "Test 1: NSEO\nStability Score: 90\n"),
        ];
        let rows = aggregate_condition(&docs, "NSEO", None);
        let profile = build_profile("NSEO", &rows, &RadarConfig::default());

        assert!(profile.normalized);
        assert_eq!(profile.axes.len(), 2);

        let stability = &profile.axes[0];
        assert_eq!(stability.basis, 100.0);
        assert!(approx(stability.scores[0], 80.0));
        assert!(approx(stability.scores[1], 100.0));

        let sway = &profile.axes[1];
        assert_eq!(sway.direction, Direction::Low);
        assert!(approx(sway.scores[0], 0.0));
        assert!(approx(sway.scores[1], 75.0));
        assert_eq!(sway.scores[2], None);
        assert_eq!(sway.values, vec![Some(40.0), Some(10.0), None]);
    }

    #[test]
    fn test_profile_without_normalization() {
        let docs = vec![parse("A.txt", "Test 1: NSEO\nSway Path Length: 40\n")];
        let rows = aggregate_condition(&docs, "NSEO", None);
        let radar = RadarConfig {
            normalize: false,
            ..RadarConfig::default()
        };

        let profile = build_profile("NSEO", &rows, &radar);
        assert!(!profile.normalized);
        assert_eq!(profile.axes[0].scores, vec![Some(40.0)]);
    }

    #[test]
    fn test_default_selection_keeps_config_order() {
        let available = vec![
            "Directionality".to_string(),
            "Stability Score".to_string(),
            "Heel Load".to_string(),
        ];
        let selection = default_selection(&RadarConfig::default(), &available);
        assert_eq!(selection, vec!["Stability Score", "Directionality"]);
    }
}
