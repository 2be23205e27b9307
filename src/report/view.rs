//! Comparison views.
//!
//! Turns the session and a selection into everything needed to render
//! one comparison: chart data, the numeric rows, the display table and
//! the narrative prompt.

use crate::analysis::aggregator::metrics_in_condition;
use crate::analysis::{aggregate, aggregate_condition, build_profile, default_selection};
use crate::config::Config;
use crate::models::AggregateRow;
use crate::narrative::NarrativePrompt;
use crate::report::chart::{BarChartData, ChartData, RadarChartData};
use crate::report::table::SummaryTable;
use crate::session::{Selection, Session};
use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

/// One rendered comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub title: String,
    pub chart: ChartData,
    pub rows: Vec<AggregateRow>,
    pub table: SummaryTable,
    #[serde(skip)]
    pub prompt: NarrativePrompt,
}

impl ComparisonView {
    /// Prompt with this view's table filled in.
    pub fn filled_prompt(&self) -> NarrativePrompt {
        self.prompt.with_summary(&self.table.to_text())
    }
}

fn ensure_known(kind: &str, name: &str, known: &[String]) -> Result<()> {
    if !known.iter().any(|k| k == name) {
        bail!(
            "Unknown {} '{}'. Available: {}",
            kind,
            name,
            known.join(", ")
        );
    }
    Ok(())
}

/// Resolve a selection against the session, filling in defaults.
pub fn resolve_selection(
    session: &Session,
    config: &Config,
    radar: bool,
    metric: Option<&str>,
    condition: Option<&str>,
    radar_metrics: Option<&[String]>,
) -> Result<Selection> {
    let metrics = session.metrics();
    let conditions = session.conditions();

    if let Some(condition) = condition {
        ensure_known("condition", condition, &conditions)?;
    }

    if !radar {
        let metric = match metric {
            Some(m) => {
                ensure_known("metric", m, &metrics)?;
                m.to_string()
            }
            None => match session.default_metric() {
                Some(m) => m,
                None => bail!("No metrics found in the loaded files"),
            },
        };

        return Ok(Selection::Metric {
            metric,
            condition: condition.map(str::to_string),
        });
    }

    let condition = match condition {
        Some(c) => c.to_string(),
        None => match conditions.first() {
            Some(c) => c.clone(),
            None => bail!("No test conditions found in the loaded files"),
        },
    };

    let selected = match radar_metrics {
        Some(selected) => {
            for m in selected {
                ensure_known("metric", m, &metrics)?;
            }
            selected.to_vec()
        }
        None => {
            let present = metrics_in_condition(session.documents(), &condition);
            let defaults = default_selection(&config.radar, &present);
            if defaults.is_empty() {
                present
            } else {
                defaults
            }
        }
    };

    Ok(Selection::Radar {
        condition,
        metrics: selected,
    })
}

/// Build the view for a resolved selection.
pub fn build_view(session: &Session, selection: &Selection, config: &Config) -> ComparisonView {
    let labels = session.labels();
    let documents = session.documents();

    match selection {
        Selection::Metric { metric, condition } => {
            let rows = aggregate(documents, metric, condition.as_deref());
            debug!(
                "{}: {} rows, {} values",
                metric,
                rows.len(),
                rows.iter().map(AggregateRow::present_count).sum::<usize>()
            );

            let title = match condition {
                Some(c) => format!("{} ({})", metric, c),
                None => metric.clone(),
            };

            ComparisonView {
                title,
                chart: ChartData::Bar(BarChartData::from_rows(metric, &labels, &rows)),
                table: SummaryTable::from_rows(&labels, &rows, &config.report),
                prompt: NarrativePrompt::for_metric(metric),
                rows,
            }
        }
        Selection::Radar { condition, metrics } => {
            let rows = aggregate_condition(documents, condition, Some(metrics.as_slice()));
            let profile = build_profile(condition, &rows, &config.radar);
            debug!("{}: {} radar axes", condition, profile.axes.len());

            ComparisonView {
                title: format!("Comprehensive Profile: {}", condition),
                chart: ChartData::Radar(RadarChartData::from_profile(&labels, &profile)),
                table: SummaryTable::from_rows(&labels, &rows, &config.report),
                prompt: NarrativePrompt::for_condition(condition),
                rows,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new();
        session
            .add_upload(
                "visit1.txt",
                b"Test 1: NSEO\nStability Score: 90\nSway Path Length: 30\nHeel Load: 55\n\
                  Test 2: NSEC\nStability Score: 70\n",
            )
            .unwrap();
        session
            .add_upload(
                "visit2.txt",
                b"Test 1: NSEO\nStability Score: 99\nSway Path Length: 15\n",
            )
            .unwrap();
        session
    }

    #[test]
    fn test_default_metric_selection() {
        let session = session();
        let selection =
            resolve_selection(&session, &Config::default(), false, None, None, None).unwrap();

        assert_eq!(
            selection,
            Selection::Metric {
                metric: "Stability Score".to_string(),
                condition: None
            }
        );
    }

    #[test]
    fn test_unknown_names_rejected() {
        let session = session();
        let config = Config::default();

        let err = resolve_selection(&session, &config, false, Some("Pulse"), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown metric 'Pulse'"));

        assert!(resolve_selection(&session, &config, false, None, Some("PSEO"), None).is_err());

        let wanted = vec!["Pulse".to_string()];
        assert!(
            resolve_selection(&session, &config, true, None, None, Some(wanted.as_slice()))
                .is_err()
        );
    }

    #[test]
    fn test_radar_defaults_to_key_metrics() {
        let session = session();
        let selection =
            resolve_selection(&session, &Config::default(), true, None, None, None).unwrap();

        assert_eq!(
            selection,
            Selection::Radar {
                condition: "NSEO".to_string(),
                metrics: vec!["Stability Score".to_string(), "Sway Path Length".to_string()],
            }
        );
    }

    #[test]
    fn test_radar_falls_back_to_all_metrics() {
        let mut session = Session::new();
        session
            .add_upload("a.txt", b"Test 1: NSEO\nHeel Load: 55\nToe Load: 45\n")
            .unwrap();

        let selection =
            resolve_selection(&session, &Config::default(), true, None, None, None).unwrap();
        let Selection::Radar { metrics, .. } = selection else {
            panic!("expected radar selection");
        };
        assert_eq!(metrics, vec!["Heel Load", "Toe Load"]);
    }

    #[test]
    fn test_metric_view() {
        let session = session();
        let config = Config::default();
        let selection = Selection::Metric {
            metric: "Stability Score".to_string(),
            condition: None,
        };

        let view = build_view(&session, &selection, &config);

        assert_eq!(view.title, "Stability Score");
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[1].values, vec![Some(70.0), None]);
        assert!(matches!(view.chart, ChartData::Bar(_)));

        let prompt = view.filled_prompt();
        assert!(prompt.is_filled());
        assert!(prompt.user.contains("visit2.txt"));
    }

    #[test]
    fn test_radar_view() {
        let session = session();
        let selection = Selection::Radar {
            condition: "NSEO".to_string(),
            metrics: vec!["Sway Path Length".to_string()],
        };

        let view = build_view(&session, &selection, &Config::default());

        assert_eq!(view.title, "Comprehensive Profile: NSEO");
        let ChartData::Radar(chart) = &view.chart else {
            panic!("expected radar chart");
        };
        assert_eq!(chart.series[0].scores, vec![Some(0.0)]);
        assert_eq!(chart.series[1].scores, vec![Some(50.0)]);
        // The table shows original values.
        assert_eq!(view.table.rows[0][2], "30.000");
    }
}
