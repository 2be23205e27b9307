//! Line classification and value extraction.
//!
//! Every line of an export falls into exactly one [`LineKind`]. Anything
//! that does not match a known pattern is [`LineKind::Ignorable`].

use crate::models::MetricReading;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Classification of a single report line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    /// `Test <n>: <name>` introducing a new condition.
    ConditionHeader { key: String, full_name: String },
    /// `Test Date: mm/dd/yyyy` metadata.
    TestDate(NaiveDate),
    /// `label: value` or `label    value`.
    Metric { label: &'a str, value: &'a str },
    Ignorable,
}

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("Invalid regex"))
        }
    };
}

static_regex!(header_re, r"(?i)^test\s+\d+\s*:\s*(.*)$");
static_regex!(test_date_re, r"(?i)^test\s+date\s*:\s*(.*)$");
static_regex!(date_re, r"(\d{1,2})/(\d{1,2})/(\d{4})");
static_regex!(colon_metric_re, r"^([^:]+?)\s*:\s*(.*)$");
static_regex!(
    spaced_metric_re,
    r"^(\S.*?)(?:\s{2,}|\t+)([+-]?(?:\d+(?:\.\d+)?|\.\d+).*)$"
);
static_regex!(number_re, r"^[+-]?(?:\d+(?:\.\d+)?|\.\d+)");
static_regex!(acronym_re, r"([\w\s]+) \(([A-Z]{4})\)");
static_regex!(trailing_acronym_re, r"([A-Z]{4}):?$");
static_regex!(
    sway_center_re,
    r"\[\s*([+-]?(?:\d+(?:\.\d+)?|\.\d+))[^,\]]*,\s*([+-]?(?:\d+(?:\.\d+)?|\.\d+))[^\]]*\]"
);
static_regex!(pair_label_re, r"^(.*?)\s*\((Max & 95%|Max & Ave|Max & Min)\)\s*$");
static_regex!(
    pair_value_re,
    r"^([+-]?(?:\d+(?:\.\d+)?|\.\d+))[^&]*&\s*([+-]?(?:\d+(?:\.\d+)?|\.\d+))"
);

/// Classify one line of a report.
pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = strip_bullet(line.trim());

    if trimmed.is_empty() {
        return LineKind::Ignorable;
    }

    if let Some(caps) = header_re().captures(trimmed) {
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        let full_name = name.trim_end_matches(':').trim().to_string();
        return LineKind::ConditionHeader {
            key: condition_key(name),
            full_name,
        };
    }

    if let Some(caps) = test_date_re().captures(trimmed) {
        return caps
            .get(1)
            .and_then(|m| parse_date(m.as_str()))
            .map_or(LineKind::Ignorable, LineKind::TestDate);
    }

    let spaced = spaced_metric(trimmed);

    // A column gap before any colon means the colon belongs to the value.
    if let Some((label, value)) = spaced {
        if !label.contains(':') {
            return LineKind::Metric { label, value };
        }
    }

    if let Some(caps) = colon_metric_re().captures(trimmed) {
        let label = caps.get(1).map_or("", |m| m.as_str()).trim();
        let value = caps.get(2).map_or("", |m| m.as_str()).trim();
        // A bare "Section:" line is a sub-heading, not a metric.
        if is_label(label) && !value.is_empty() {
            return LineKind::Metric { label, value };
        }
        return LineKind::Ignorable;
    }

    spaced.map_or(LineKind::Ignorable, |(label, value)| LineKind::Metric {
        label,
        value,
    })
}

fn spaced_metric(line: &str) -> Option<(&str, &str)> {
    let caps = spaced_metric_re().captures(line)?;
    let label = caps.get(1)?.as_str().trim();
    let value = caps.get(2)?.as_str().trim();
    is_label(label).then_some((label, value))
}

/// Derive the cross-file join key from a header's condition name.
///
/// `Normal Stance Eyes Open (NSEO)` becomes `NSEO`; the foam eyes-closed
/// variants keep their side (`FEC Rt`). Falls back to a trailing acronym,
/// then to the text before the first colon.
pub fn condition_key(name: &str) -> String {
    if let Some(caps) = acronym_re().captures(name) {
        let description = caps.get(1).map_or("", |m| m.as_str()).trim();
        let acronym = caps.get(2).map_or("", |m| m.as_str()).trim();

        if !description.is_empty() && !acronym.is_empty() {
            if description.starts_with("Foam Eyes Closed") {
                let variant = description.split(' ').last().unwrap_or_default();
                return format!("{} {}", acronym, variant);
            }
            return acronym.to_string();
        }
    }

    if let Some(caps) = trailing_acronym_re().captures(name) {
        if let Some(m) = caps.get(1) {
            return m.as_str().to_string();
        }
    }

    name.split(':').next().unwrap_or_default().trim().to_string()
}

/// Extract the leading number of a value, ignoring trailing units.
pub fn leading_number(value: &str) -> Option<f64> {
    number_re()
        .find(value.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Turn a metric line into one or more readings.
///
/// Compound values (sway center coordinates, `Max & 95%` pairs) expand
/// into two readings. A compound value that does not match its pattern
/// is read as a plain number under the label as printed.
pub fn readings(label: &str, value: &str) -> Vec<MetricReading> {
    if label.contains("Sway Center") {
        if let Some(caps) = sway_center_re().captures(value) {
            let x = caps.get(1).and_then(|m| leading_number(m.as_str()));
            let y = caps.get(2).and_then(|m| leading_number(m.as_str()));
            if let (Some(x), Some(y)) = (x, y) {
                return vec![
                    MetricReading::numeric(format!("{} Xo", label), x, value),
                    MetricReading::numeric(format!("{} Yo", label), y, value),
                ];
            }
        }
        return vec![single(label, value)];
    }

    if let Some(label_caps) = pair_label_re().captures(label) {
        let root = label_caps.get(1).map_or("", |m| m.as_str()).trim();
        let kinds = label_caps.get(2).map_or("", |m| m.as_str());
        let (first, second) = kinds.split_once(" & ").unwrap_or(("Max", "Other"));

        let values = pair_value_re().captures(value.trim()).and_then(|caps| {
            let a = caps.get(1).and_then(|m| leading_number(m.as_str()))?;
            let b = caps.get(2).and_then(|m| leading_number(m.as_str()))?;
            Some((a, b))
        });

        return match values {
            Some((a, b)) => vec![
                MetricReading::numeric(format!("{} ({})", root, first), a, value),
                MetricReading::numeric(format!("{} ({})", root, second), b, value),
            ],
            None => vec![single(label, value)],
        };
    }

    vec![single(label, value)]
}

fn single(label: &str, value: &str) -> MetricReading {
    match leading_number(value) {
        Some(v) => MetricReading::numeric(label, v, value),
        None => MetricReading::missing(label, value),
    }
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix(['*', '-', '•'])
        .map(str::trim_start)
        .unwrap_or(line)
}

fn is_label(label: &str) -> bool {
    label.chars().any(char::is_alphabetic)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = date_re().captures(text)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let day = caps.get(2)?.as_str().parse().ok()?;
    let year = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
