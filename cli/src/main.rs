use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use clonebuddy_provision::config::DEFAULT_SAMPLE_URL;
use clonebuddy_provision::{LogSink, WorkflowConfig, auto_fix, registration, scan, workflow};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "clonebuddy", version = PACKAGE_VERSION)]
#[command(about = "Clone, validate, auto-fix and register pyRevit extension repositories")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Option<Command>,
    /// Repository to clone when no subcommand is given.
    url: Option<String>,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory repositories are cloned into.
    #[arg(long, global = true)]
    clone_root: Option<PathBuf>,
    /// Also require a `name` key in extension.json.
    #[arg(long, global = true)]
    strict: bool,
    /// Register the extension with the host after a single run.
    #[arg(long, global = true)]
    register: bool,
    /// Print debug diagnostics to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clone, fix and register a list of repositories.
    Batch(BatchArgs),
    /// Check an extension folder and list its issues.
    Validate(ValidateArgs),
    /// Repair an extension folder in place.
    Fix(FixArgs),
    /// Report issues and load status for every folder in the clone root.
    Check,
    /// Register every extension in the clone root the host has not loaded.
    Refresh,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Repository URLs (defaults to the configured list).
    urls: Vec<String>,
    /// Write a JSON report of every outcome to this file.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Log to the console only.
    #[arg(long)]
    no_log_file: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Extension folder to validate.
    path: PathBuf,
}

#[derive(Debug, Args)]
struct FixArgs {
    /// Extension folder to repair.
    path: PathBuf,
    /// Repository URL written into a synthesized extension.json.
    #[arg(long, default_value = "")]
    url: String,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = load_config(&cli.global).and_then(|config| match cli.command {
        None => run_single(&config, cli.url.as_deref().unwrap_or(DEFAULT_SAMPLE_URL)),
        Some(Command::Batch(args)) => run_batch(config, args),
        Some(Command::Validate(args)) => run_validate(&config, args),
        Some(Command::Fix(args)) => run_fix(&config, args),
        Some(Command::Check) => run_check(&config),
        Some(Command::Refresh) => run_refresh(&config),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Builds the configuration from the optional file, then applies flags.
fn load_config(global: &GlobalArgs) -> Result<WorkflowConfig, String> {
    let mut config = match &global.config {
        Some(path) => WorkflowConfig::load(path)
            .map_err(|e| format!("failed to load config '{}': {e}", path.display()))?,
        None => WorkflowConfig::default(),
    };
    if let Some(root) = &global.clone_root {
        config.clone_root = root.clone();
    }
    if global.strict {
        config.strict_manifest_check = true;
    }
    if global.register {
        config.register_after_fix = true;
    }
    Ok(config)
}

fn run_single(config: &WorkflowConfig, url: &str) -> Result<(), String> {
    let mut log = LogSink::new(&config.log_tag);
    let outcome = workflow::run_single(config, url, &mut log).map_err(|e| e.to_string())?;
    log.line(format!("Result: {}", outcome.status));
    Ok(())
}

fn run_batch(mut config: WorkflowConfig, args: BatchArgs) -> Result<(), String> {
    let urls = if args.urls.is_empty() {
        config.repositories.clone()
    } else {
        args.urls
    };
    if urls.is_empty() {
        return Err("no repositories to process".to_string());
    }
    if args.no_log_file {
        config.batch_log_file = None;
    }

    let mut log = workflow::open_batch_log(&config);
    let report = workflow::run_batch(&config, &urls, &mut log).map_err(|e| e.to_string())?;
    if let Err(err) = log.finish() {
        warn!(error = %err, "Failed to flush batch log");
    }

    println!("\nSummary:");
    for (status, count) in report.summary() {
        println!("  {status}: {count}");
    }

    if let Some(path) = args.report {
        let json = report
            .to_json()
            .map_err(|e| format!("failed to serialize report: {e}"))?;
        fs::write(&path, json)
            .map_err(|e| format!("failed to write report '{}': {e}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_validate(config: &WorkflowConfig, args: ValidateArgs) -> Result<(), String> {
    require_dir(&args.path)?;
    let mut log = LogSink::new(&config.log_tag);
    let issues = workflow::validate_and_log(&args.path, config.validation_rules(), &mut log);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(format!("{} structure issue(s) found", issues.len()))
    }
}

fn run_fix(config: &WorkflowConfig, args: FixArgs) -> Result<(), String> {
    require_dir(&args.path)?;
    let mut log = LogSink::new(&config.log_tag);
    let report = auto_fix(&args.path, &args.url, config, &mut log);
    workflow::validate_and_log(&report.path, config.validation_rules(), &mut log);
    Ok(())
}

fn run_check(config: &WorkflowConfig) -> Result<(), String> {
    let mut log = LogSink::new(&config.log_tag);
    let entries = scan::check_extensions(config, &mut log).map_err(|e| e.to_string())?;
    let with_issues = entries.iter().filter(|entry| !entry.is_valid()).count();
    let loaded = entries.iter().filter(|entry| entry.loaded).count();
    log.line(format!(
        "{} extension(s) checked: {with_issues} with issues, {loaded} loaded",
        entries.len()
    ));
    Ok(())
}

fn run_refresh(config: &WorkflowConfig) -> Result<(), String> {
    let mut log = LogSink::new(&config.log_tag);
    let report =
        registration::refresh_extensions(config, &mut log).map_err(|e| e.to_string())?;
    for (path, reason) in &report.failed {
        log.line(format!("Could not register {}: {reason}", path.display()));
    }
    log.line(format!(
        "Refresh complete: {} registered, {} already loaded",
        report.registered.len(),
        report.already_loaded.len()
    ));
    Ok(())
}

fn require_dir(path: &Path) -> Result<(), String> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(format!("'{}' is not a directory", path.display()))
    }
}
