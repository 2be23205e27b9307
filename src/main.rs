//! posturo - posturography report comparison
//!
//! Parses plain-text exports from a balance-testing platform, compares
//! every metric per test condition across files, and renders tables and
//! chart data. An optional language-model interpretation can be added.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (no readable inputs, unknown selection, bad config, etc.)

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod narrative;
mod parser;
mod report;
mod session;

use anyhow::{bail, Context, Result};
use cli::{Args, OutputFormat, View};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use report::view::ComparisonView;
use report::ComparisonReport;
use session::Session;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration; it decides the log level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("posturo v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Inputs: {:?}", args.inputs);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Comparison failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .posturo.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, radar metrics, and number formatting.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so the report can be piped from stdout.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }
}

/// A spinner on stderr, hidden in quiet mode.
fn spinner(args: &Args, message: &str) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run one comparison. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    // Step 1: Load the exports
    let mut session = Session::new();

    let pb = spinner(&args, "Parsing exports...");
    let loaded = loader::load_into_session(&mut session, &args.inputs);
    pb.finish_and_clear();

    for failure in session.failures() {
        eprintln!("⚠️  Skipped {}: {}", failure.label, failure.message);
    }

    if loaded == 0 {
        bail!("None of the inputs could be loaded");
    }
    if !session.has_data() {
        bail!("No test conditions found in the loaded files");
    }

    if !args.quiet {
        eprintln!("📂 Loaded {} file(s)", loaded);
    }

    if config.general.sort_by_date {
        info!("Ordering files by test date");
        session.sort_by_test_date();
    }

    if args.list {
        print_catalog(&session);
        return Ok(0);
    }

    // Step 2: Resolve the selection and build the view
    let selection = report::resolve_selection(
        &session,
        &config,
        args.view == View::Radar,
        args.metric.as_deref(),
        args.condition.as_deref(),
        args.radar_metrics.as_deref(),
    )?;
    session.select(selection.clone());

    let view = report::build_view(&session, &selection, &config);
    if view.rows.is_empty() {
        warn!("No data for {}", view.title);
    }

    // Step 3: Optional interpretation
    if args.interpret {
        request_interpretation(&args, &config, &mut session, &view).await;
    }

    // Step 4: Render and write
    let model_used = args.interpret.then(|| config.model.name.clone());
    let report = ComparisonReport::new(&session, view, model_used);

    let output = match args.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Text => report::generate_text_report(&report),
    };

    match config.general.output {
        Some(ref path) => {
            report::write_report(&output, Path::new(path))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path);
            }
        }
        None => print!("{}", output),
    }

    Ok(0)
}

/// Ask the model for an interpretation of the current view.
///
/// Failures are reported and recorded on the session, never propagated.
async fn request_interpretation(
    args: &Args,
    config: &Config,
    session: &mut Session,
    view: &ComparisonView,
) {
    let token = session.begin_request();
    let prompt = view.filled_prompt();

    let pb = spinner(
        args,
        &format!("Requesting interpretation from {}...", config.model.name),
    );
    let result = narrative::interpret(config, &prompt).await;
    pb.finish_and_clear();

    if let Err(ref e) = result {
        warn!("Interpretation failed: {}", e);
        eprintln!("⚠️  {}", e);
    }

    session.apply_result(token, result);
}

/// Print the conditions and metrics found in the session.
fn print_catalog(session: &Session) {
    let conditions = session.conditions();

    println!("📋 {} file(s), {} condition(s)\n", session.documents().len(), conditions.len());
    for document in session.documents() {
        let date = document
            .test_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "no test date".to_string());
        println!("   📄 {} ({})", document.label, date);
    }

    for condition in &conditions {
        println!("\n🧪 {}", condition);
        for metric in analysis::aggregator::metrics_in_condition(session.documents(), condition) {
            println!("   - {}", metric);
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.display().to_string())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::Default)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Invalid(format!("{:#}", e)))),
    }
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigOrigin {
    Explicit(String),
    Default,
    Builtin,
    Invalid(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path),
            ConfigOrigin::Default => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Invalid(e) => warn!("Failed to load config: {}", e),
        }
    }
}
