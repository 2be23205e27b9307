//! Descriptive statistics over values with missing slots.

use crate::models::RowStats;

/// Mean of the present values. Missing when nothing is present.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Sample standard deviation (n - 1 denominator) of the present values.
///
/// Missing with fewer than two present values.
pub fn sample_std_dev(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() < 2 {
        return None;
    }

    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (present.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Latest minus baseline, when both are present.
pub fn change(baseline: Option<f64>, latest: Option<f64>) -> Option<f64> {
    Some(latest? - baseline?)
}

/// Relative change in percent. Missing for a zero or missing baseline.
pub fn percent_change(baseline: Option<f64>, latest: Option<f64>) -> Option<f64> {
    let baseline = baseline?;
    let latest = latest?;

    if baseline == 0.0 {
        return None;
    }

    Some((latest - baseline) / baseline * 100.0)
}

/// Compute all row statistics for one per-document value sequence.
///
/// Change and percent change are only defined for exactly two documents.
pub fn row_stats(values: &[Option<f64>]) -> RowStats {
    let (change, percent_change) = match values {
        [baseline, latest] => (
            change(*baseline, *latest),
            percent_change(*baseline, *latest),
        ),
        _ => (None, None),
    };

    RowStats {
        mean: mean(values),
        std_dev: sample_std_dev(values),
        change,
        percent_change,
    }
}
