//! Cross-document analysis.
//!
//! Aggregation of parsed documents into comparison rows, descriptive
//! statistics and radar normalization.

pub mod aggregator;
pub mod radar;
pub mod stats;

pub use aggregator::{aggregate, aggregate_condition, condition_catalog, metric_catalog};
pub use radar::{build_profile, default_selection, RadarProfile};
