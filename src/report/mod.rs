//! Presentation of comparisons.
//!
//! Maps aggregate rows to chart data and display tables, and renders
//! complete reports.

pub mod chart;
pub mod generator;
pub mod table;
pub mod view;

pub use generator::{
    generate_json_report, generate_markdown_report, generate_text_report, write_report,
    ComparisonReport,
};
pub use view::{build_view, resolve_selection};
