//! Posturography report parser.
//!
//! Turns a plain-text export into a [`RawDocument`]. Parsing is
//! best-effort: unknown lines are skipped, unreadable values become
//! missing readings, and only undecodable bytes are an error.

pub mod decode;
pub mod lines;

pub use decode::ParseError;

use crate::models::{RawDocument, TestCondition};
use lines::LineKind;
use tracing::debug;

/// Parser state: the document built so far plus the open condition.
struct ReportParser {
    document: RawDocument,
    state: State,
}

enum State {
    /// Before the first condition header.
    Preamble,
    /// Inside a recognized condition.
    InCondition(TestCondition),
    /// Inside a section whose header yielded no usable key.
    Skipping,
}

impl ReportParser {
    fn new(label: &str) -> Self {
        Self {
            document: RawDocument::new(label),
            state: State::Preamble,
        }
    }

    fn feed(&mut self, line: &str) {
        match lines::classify(line) {
            LineKind::ConditionHeader { key, full_name } => {
                self.close_condition();
                self.state = if key.is_empty() {
                    debug!("Skipping section with unusable header: {:?}", line.trim());
                    State::Skipping
                } else {
                    State::InCondition(TestCondition::new(key, full_name))
                };
            }
            LineKind::TestDate(date) => {
                if self.document.test_date.is_none() {
                    self.document.test_date = Some(date);
                }
            }
            LineKind::Metric { label, value } => {
                if let State::InCondition(condition) = &mut self.state {
                    for reading in lines::readings(label, value) {
                        condition.upsert(reading);
                    }
                }
            }
            LineKind::Ignorable => {}
        }
    }

    /// Move the open condition into the document.
    ///
    /// Conditions without readings are dropped. A repeated key merges
    /// into the earlier condition.
    fn close_condition(&mut self) {
        let State::InCondition(condition) = std::mem::replace(&mut self.state, State::Preamble)
        else {
            return;
        };

        if condition.metrics.is_empty() {
            debug!("Dropping condition {} with no readings", condition.key);
            return;
        }

        match self
            .document
            .conditions
            .iter_mut()
            .find(|c| c.key == condition.key)
        {
            Some(existing) => {
                for reading in condition.metrics {
                    existing.upsert(reading);
                }
            }
            None => self.document.conditions.push(condition),
        }
    }

    fn finish(mut self) -> RawDocument {
        self.close_condition();
        self.document
    }
}

/// Parse decoded report text.
pub fn parse(label: &str, text: &str) -> RawDocument {
    let mut parser = ReportParser::new(label);

    for line in text.lines() {
        parser.feed(line);
    }

    let document = parser.finish();
    let unreadable = document
        .conditions
        .iter()
        .flat_map(|c| &c.metrics)
        .filter(|m| m.is_missing())
        .count();
    debug!(
        "Parsed {}: {} conditions, {} readings ({} without a number)",
        label,
        document.conditions.len(),
        document.reading_count(),
        unreadable
    );
    document
}

/// Decode raw upload bytes and parse them.
pub fn parse_bytes(label: &str, bytes: &[u8]) -> Result<RawDocument, ParseError> {
    let text = decode::decode_text(label, bytes)?;
    Ok(parse(label, &text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE_REPORT: &str = "\
Balance Assessment Export
Patient ID: 00421

Test 1: Normal Stance Eyes Open (NSEO):
* Test Date: 03/14/2024 09:12
* Stability Score: 92.4
* Stability Class: A | Normal
* Sway Path Length: 31.25 cm
* Sway Velocity (Max & Ave): 0.41 m/s & 0.11 m/s
* Sway Center: [0.004 m, -0.012 m]

Test 2: Foam Eyes Closed Head Rt (FECH):
* Stability Score: 61
* Fatigue Ratio: -0.35
* Directionality: n/a
";

    fn value(doc: &RawDocument, condition: &str, metric: &str) -> Option<f64> {
        doc.value(condition, metric)
    }

    #[test]
    fn test_parse_sample_report() {
        let doc = parse("visit1.txt", SAMPLE_REPORT);

        assert_eq!(doc.label, "visit1.txt");
        assert_eq!(doc.test_date, NaiveDate::from_ymd_opt(2024, 3, 14));

        let keys: Vec<_> = doc.conditions.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["NSEO", "FECH Rt"]);
        assert_eq!(
            doc.conditions[0].full_name,
            "Normal Stance Eyes Open (NSEO)"
        );

        assert_eq!(value(&doc, "NSEO", "Stability Score"), Some(92.4));
        assert_eq!(value(&doc, "NSEO", "Sway Path Length"), Some(31.25));
        assert_eq!(value(&doc, "NSEO", "Sway Velocity (Max)"), Some(0.41));
        assert_eq!(value(&doc, "NSEO", "Sway Velocity (Ave)"), Some(0.11));
        assert_eq!(value(&doc, "NSEO", "Sway Center Xo"), Some(0.004));
        assert_eq!(value(&doc, "NSEO", "Sway Center Yo"), Some(-0.012));
        assert_eq!(value(&doc, "FECH Rt", "Stability Score"), Some(61.0));
        assert_eq!(value(&doc, "FECH Rt", "Fatigue Ratio"), Some(-0.35));
    }

    #[test]
    fn test_unparseable_value_kept_as_missing() {
        let doc = parse("visit1.txt", SAMPLE_REPORT);

        let fech = doc.condition("FECH Rt").unwrap();
        let directionality = fech.metric("Directionality").unwrap();
        assert!(directionality.is_missing());
        assert_eq!(directionality.raw, "n/a");

        let class = doc.condition("NSEO").unwrap().metric("Stability Class").unwrap();
        assert!(class.is_missing());
        assert_eq!(class.raw, "A | Normal");
    }

    #[test]
    fn test_preamble_metrics_ignored() {
        let doc = parse("visit1.txt", SAMPLE_REPORT);
        assert!(doc
            .conditions
            .iter()
            .all(|c| c.metric("Patient ID").is_none()));
    }

    #[test]
    fn test_round_trip_synthetic_report() {
        let expected = [
            ("NSEO", vec![("Stability Score", 88.5), ("Sway Path Length", 12.0)]),
            ("NSEC", vec![("Stability Score", 71.25), ("Directionality", -0.5)]),
            ("PSEO", vec![("Adaptation Ratio", 1.05)]),
        ];

        let mut text = String::new();
        for (i, (key, metrics)) in expected.iter().enumerate() {
            text.push_str(&format!("Test {}: {}\n", i + 1, key));
            for (name, v) in metrics {
                text.push_str(&format!("  {}: {} units\n", name, v));
            }
            text.push('\n');
        }

        let doc = parse("synthetic.txt", &text);
        assert_eq!(doc.conditions.len(), expected.len());

        for (key, metrics) in &expected {
            let condition = doc.condition(key).unwrap();
            assert_eq!(condition.metrics.len(), metrics.len());
            for (name, v) in metrics {
                let parsed = condition.metric(name).and_then(|m| m.value).unwrap();
                assert!((parsed - v).abs() < 1e-9, "{} {}", key, name);
            }
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse("a.txt", SAMPLE_REPORT);
        let second = parse("a.txt", SAMPLE_REPORT);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_lines_and_blanks_tolerated() {
        let text = "\r\n\
   ***** DEVICE FIRMWARE 4.2 *****   \r\n\
Test 1: Normal Stance Eyes Open (NSEO)\r\n\
\r\n\
   Operator notes follow\r\n\
*   Stability Score   :   77.7  \r\n\
\t\r\n\
Sway Path Length      18.2 cm\r\n\
#### end of block ####\r\n";

        let doc = parse("messy.txt", text);
        let nseo = doc.condition("NSEO").unwrap();

        assert_eq!(nseo.metrics.len(), 2);
        assert_eq!(nseo.metric("Stability Score").and_then(|m| m.value), Some(77.7));
        assert_eq!(nseo.metric("Sway Path Length").and_then(|m| m.value), Some(18.2));
    }

    #[test]
    fn test_zero_conditions_is_empty_document() {
        let doc = parse("notes.txt", "Just some notes\nwithout any test blocks\n");
        assert!(doc.is_empty());
        assert_eq!(doc.label, "notes.txt");

        assert!(parse("empty.txt", "").is_empty());
    }

    #[test]
    fn test_condition_without_readings_dropped() {
        let doc = parse("a.txt", "Test 1: NSEO\nTest 2: NSEC\nStability Score: 50\n");
        let keys: Vec<_> = doc.conditions.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["NSEC"]);
    }

    #[test]
    fn test_repeated_condition_merges() {
        let text = "Test 1: NSEO\nA: 1\nB: 2\nTest 2: NSEC\nA: 9\nTest 3: NSEO\nB: 5\nC: 6\n";
        let doc = parse("a.txt", text);

        assert_eq!(doc.conditions.len(), 2);
        let nseo = doc.condition("NSEO").unwrap();
        let names: Vec<_> = nseo.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(nseo.metric("B").and_then(|m| m.value), Some(5.0));
    }

    #[test]
    fn test_section_with_empty_header_skipped() {
        let doc = parse("a.txt", "Test 1:\nA: 1\nTest 2: NSEC\nA: 2\n");
        assert_eq!(doc.conditions.len(), 1);
        assert_eq!(doc.value("NSEC", "A"), Some(2.0));
    }

    #[test]
    fn test_parse_bytes_decode_error() {
        let result = parse_bytes("image.png", &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]);
        assert!(matches!(result, Err(ParseError::Decode { .. })));
    }

    #[test]
    fn test_parse_bytes_latin1_export() {
        let bytes = b"Test 1: Normal Stance Eyes Open (NSEO)\n\
                      * Stability Score: 92.4\n\
                      * Sway Area: 2.8 m\xB2\n";
        let doc = parse_bytes("latin1.txt", bytes).unwrap();

        assert_eq!(doc.value("NSEO", "Stability Score"), Some(92.4));
        assert_eq!(doc.value("NSEO", "Sway Area"), Some(2.8));
    }

    #[test]
    fn test_parse_bytes_ok() {
        let doc = parse_bytes("a.txt", SAMPLE_REPORT.as_bytes()).unwrap();
        assert_eq!(doc.conditions.len(), 2);
    }
}
