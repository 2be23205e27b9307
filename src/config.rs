//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.posturo.toml` files.

use crate::models::Direction;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".posturo.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Narrative model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Radar profile settings.
    #[serde(default)]
    pub radar: RadarConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path. Prints to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Order documents by their test date instead of load order.
    #[serde(default)]
    pub sort_by_date: bool,
}

/// Narrative generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier passed to the generation API.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the generation API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API credential. Usually supplied through GEMINI_API_KEY instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries on rate limiting or transient network failures.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: None,
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "models/gemini-2.5-pro".to_string()
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> usize {
    2
}

/// A metric offered on the radar profile, with its preferred direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub name: String,
    pub direction: Direction,
}

impl KeyMetric {
    fn new(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            direction,
        }
    }
}

/// Radar profile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Scale each metric to 0-100 (100 = best).
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Metrics shown by default, in axis order.
    #[serde(default = "default_key_metrics")]
    pub key_metrics: Vec<KeyMetric>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            key_metrics: default_key_metrics(),
        }
    }
}

fn default_key_metrics() -> Vec<KeyMetric> {
    vec![
        KeyMetric::new("Stability Score", Direction::High),
        KeyMetric::new("Sway Path Length", Direction::Low),
        KeyMetric::new("Sway Velocity (Ave)", Direction::Low),
        KeyMetric::new("Area 95% Conf. Ellipse", Direction::Low),
        KeyMetric::new("Fatigue Ratio", Direction::Low),
        KeyMetric::new("Adaptation Ratio", Direction::High),
        KeyMetric::new("Directionality", Direction::Low),
    ]
}

impl RadarConfig {
    /// Direction for a metric; metrics not listed count as higher-is-better.
    pub fn direction(&self, metric: &str) -> Direction {
        self.key_metrics
            .iter()
            .find(|k| k.name == metric)
            .map_or(Direction::High, |k| k.direction)
    }
}

/// Report formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for values and derived statistics.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Decimal places for percent change.
    #[serde(default = "default_percent_decimals")]
    pub percent_decimals: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            percent_decimals: default_percent_decimals(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_decimals() -> usize {
    3
}

fn default_percent_decimals() -> usize {
    1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref key) = args.api_key {
            self.model.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if args.raw_radar {
            self.radar.normalize = false;
        }

        // Flags always override
        if args.sort_by_date {
            self.general.sort_by_date = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: quiet wins over `general.verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The credential, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.model
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
