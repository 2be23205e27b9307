//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// posturo - compare posturography test exports across sessions
///
/// Parses the plain-text exports of a balance platform, lines up every
/// metric per test condition across files, and prints comparison tables
/// and chart data. Optionally asks a language model for a clinical summary.
///
/// Examples:
///   posturo baseline.txt followup.txt
///   posturo exports/ --metric "Sway Path Length" --condition NSEC
///   posturo a.txt b.txt c.txt --view radar --condition NSEO --format json
///   posturo a.txt b.txt --interpret --output comparison.md
///   posturo --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Export files or directories to load, in comparison order
    ///
    /// Directories are expanded to the .txt files they contain, sorted by path.
    #[arg(value_name = "PATH", required_unless_present = "init_config")]
    pub inputs: Vec<PathBuf>,

    /// Metric to compare in the bar view
    ///
    /// Defaults to "Stability Score" when present, else the first metric found.
    #[arg(short, long, value_name = "NAME")]
    pub metric: Option<String>,

    /// Restrict to one test condition (e.g. NSEO, FECH Rt)
    ///
    /// Required context for the radar view; defaults to the first condition found.
    #[arg(long, value_name = "KEY")]
    pub condition: Option<String>,

    /// Metrics to plot on the radar view (comma-separated)
    ///
    /// Example: --radar-metrics "Stability Score,Sway Path Length"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub radar_metrics: Option<Vec<String>>,

    /// Which comparison to build
    #[arg(long, default_value = "bar", value_name = "VIEW")]
    pub view: View,

    /// Output format (markdown, json, text)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Prints to stdout when not given.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Request a clinical interpretation from the language model
    #[arg(short, long)]
    pub interpret: bool,

    /// API key for the narrative model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Narrative model identifier
    ///
    /// Can also be set via POSTURO_MODEL env var or .posturo.toml config.
    #[arg(long, env = "POSTURO_MODEL", value_name = "MODEL")]
    pub model: Option<String>,

    /// Narrative request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Plot raw values on the radar view instead of 0-100 scores
    #[arg(long)]
    pub raw_radar: bool,

    /// Order documents by their test date instead of command-line order
    #[arg(long)]
    pub sort_by_date: bool,

    /// List the conditions and metrics found in the inputs and exit
    #[arg(short, long)]
    pub list: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .posturo.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .posturo.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Comparison view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    /// One metric across conditions and documents (default)
    #[default]
    Bar,
    /// Several metrics of one condition, normalized
    Radar,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// Plain-text table
    Text,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.inputs.is_empty() {
            return Err("At least one input file or directory is required".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.metric.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err("Metric name must not be empty".to_string());
        }
        if self.condition.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("Condition must not be empty".to_string());
        }

        if let Some(ref metrics) = self.radar_metrics {
            if self.view != View::Radar {
                return Err("--radar-metrics requires --view radar".to_string());
            }
            if metrics.iter().any(|m| m.trim().is_empty()) {
                return Err("--radar-metrics contains an empty name".to_string());
            }
        }

        if self.view == View::Radar && self.metric.is_some() {
            return Err("--metric applies to the bar view; use --radar-metrics".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            inputs: vec![PathBuf::from("baseline.txt"), PathBuf::from("followup.txt")],
            metric: None,
            condition: None,
            radar_metrics: None,
            view: View::Bar,
            format: OutputFormat::Markdown,
            output: None,
            interpret: false,
            api_key: None,
            model: None,
            timeout: None,
            raw_radar: false,
            sort_by_date: false,
            list: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_requires_inputs() {
        let mut args = make_args();
        args.inputs.clear();
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_radar_metrics_need_radar_view() {
        let mut args = make_args();
        args.radar_metrics = Some(vec!["Stability Score".to_string()]);
        assert!(args.validate().is_err());

        args.view = View::Radar;
        assert!(args.validate().is_ok());

        args.metric = Some("Stability Score".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_blank_names() {
        let mut args = make_args();
        args.metric = Some("  ".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.condition = Some(String::new());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "posturo",
            "a.txt",
            "b.txt",
            "--view",
            "radar",
            "--radar-metrics",
            "Stability Score,Directionality",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.view, View::Radar);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(
            args.radar_metrics,
            Some(vec!["Stability Score".to_string(), "Directionality".to_string()])
        );
    }
}
