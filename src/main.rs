//! codeaudit - Per-file language-model review of a codebase, consolidated
//! into one report.
//!
//! Usage:
//!   codeaudit [INPUT]            Analyze a report document or directory
//!   codeaudit analyze [INPUT]    Same, with explicit subcommand
//!   codeaudit github <URL>       Clone a GitHub repository and analyze it
//!   codeaudit clean [DIR]        Remove final reports and metadata
//!   codeaudit --help             Show help

use std::path::{Path, PathBuf};
use std::thread;

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use codeaudit_analyze::{
    API_KEY_ENV, AnalysisPipeline, GeminiClient, RunOutcome, RunState, clean_reports,
};
use codeaudit_core::{AnalysisConfig, AnalysisTarget, Settings};
use codeaudit_scan::{EligibilityFilter, SourceWalker, WalkItem};

#[derive(Parser)]
#[command(
    name = "codeaudit",
    version,
    about = "Review a codebase file by file with a language model",
    long_about = "codeaudit walks a codebase, asks a language model to review each \
                  eligible file, stores one report per file and consolidates them into \
                  a final report.\n\n\
                  When INPUT is an existing file it is treated as a whole-codebase report \
                  and analyzed by six specialized reviewers instead."
)]
struct Cli {
    /// Report document or directory to analyze (falls back to the current
    /// directory when it does not exist)
    #[arg(default_value = "codebase_report.md")]
    input: PathBuf,

    #[command(flatten)]
    options: RunOptions,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a report document or a directory
    Analyze {
        /// Report document or directory to analyze
        #[arg(default_value = "codebase_report.md")]
        input: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Shallow-clone a GitHub repository and analyze it
    #[cfg(feature = "git")]
    Github {
        /// Repository URL (https://github.com/<owner>/<repo>)
        url: String,

        /// Keep the clone on disk after the run
        #[arg(long)]
        keep_clone: bool,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Remove final reports and metadata files left by earlier runs
    Clean {
        /// Directory to clean
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Also remove per-file report directories
        #[arg(short, long)]
        all: bool,
    },
}

#[derive(Args, Clone, Default)]
struct RunOptions {
    /// Maximum number of files to analyze
    #[arg(long)]
    max_files: Option<usize>,

    /// Skip files larger than this (e.g., "500KB", "2MB")
    #[arg(long)]
    max_size: Option<String>,

    /// Characters of each file sent to the model
    #[arg(long)]
    max_chars: Option<usize>,

    /// Directory receiving reports and metadata
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Seconds before a single service request is abandoned
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// API key for the analysis service
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Settings file (defaults to ./codeaudit.toml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the files that would be analyzed without calling the service
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Analyze { input, options }) => {
            run_analyze(&input, &options)?;
        }
        #[cfg(feature = "git")]
        Some(Command::Github {
            url,
            keep_clone,
            options,
        }) => {
            run_github(&url, keep_clone, options)?;
        }
        Some(Command::Clean { dir, all }) => {
            run_clean(&dir, all)?;
        }
        None => {
            run_analyze(&cli.input, &cli.options)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Defaults a subcommand puts in place of the built-in ones. The settings
/// file and the flags still take precedence.
#[derive(Debug, Default, Clone, Copy)]
struct CommandDefaults {
    max_files: Option<usize>,
    max_size_bytes: Option<u64>,
}

#[cfg(feature = "git")]
const GITHUB_DEFAULTS: CommandDefaults = CommandDefaults {
    max_files: Some(20),
    max_size_bytes: Some(10 * 1024 * 1024),
};

/// Settings file, then command-line flags, on top of the defaults.
fn build_config(options: &RunOptions, defaults: CommandDefaults) -> Result<AnalysisConfig> {
    let (settings, source) =
        Settings::discover(options.config.as_deref()).context("Failed to load settings")?;
    if let Some(path) = source {
        info!(path = %path.display(), "loaded settings");
    }
    layer_config(&settings, options, defaults)
}

fn layer_config(
    settings: &Settings,
    options: &RunOptions,
    defaults: CommandDefaults,
) -> Result<AnalysisConfig> {
    let mut builder = settings.to_builder();
    if let (None, Some(max_files)) = (settings.max_files, defaults.max_files) {
        builder.max_files(max_files);
    }
    if let (None, Some(max_size)) = (settings.max_size_bytes, defaults.max_size_bytes) {
        builder.max_size_bytes(max_size);
    }

    if let Some(max_files) = options.max_files {
        builder.max_files(max_files);
    }
    if let Some(ref max_size) = options.max_size {
        builder.max_size_bytes(parse_size(max_size)?);
    }
    if let Some(max_chars) = options.max_chars {
        builder.max_chars(max_chars);
    }
    if let Some(ref output_dir) = options.output_dir {
        builder.output_dir(output_dir.clone());
    }
    if let Some(ref model) = options.model {
        builder.model(model.clone());
    }

    builder.build().context("Invalid configuration")
}

fn build_client(options: &RunOptions, config: &AnalysisConfig) -> Result<GeminiClient> {
    let client = GeminiClient::new(options.api_key.as_deref(), config.model.clone())?;
    match options.timeout {
        Some(secs) => Ok(client.with_timeout(secs)?),
        None => Ok(client),
    }
}

/// Analyze a document or directory.
fn run_analyze(input: &Path, options: &RunOptions) -> Result<()> {
    let config = build_config(options, CommandDefaults::default())?;
    if options.dry_run {
        return run_dry(input, &config);
    }

    let client = build_client(options, &config)?;
    run_pipeline(client, config, input)
}

/// Clone a GitHub repository into a temporary directory and analyze it.
#[cfg(feature = "git")]
fn run_github(url: &str, keep_clone: bool, options: RunOptions) -> Result<()> {
    let config = build_config(&options, GITHUB_DEFAULTS)?;
    // Fail on a missing key before spending time on the clone.
    let client = if options.dry_run {
        None
    } else {
        Some(build_client(&options, &config)?)
    };

    eprintln!("Cloning {url}...");
    let repo = codeaudit_scan::clone_github_repo(url)
        .with_context(|| format!("Failed to clone {url}"))?;

    let result = match client {
        Some(client) => run_pipeline(client, config, repo.path()),
        None => run_dry(repo.path(), &config),
    };

    if keep_clone {
        let path = repo.keep();
        println!("Clone kept at {}", path.display());
    }
    result
}

fn run_pipeline(client: GeminiClient, config: AnalysisConfig, input: &Path) -> Result<()> {
    info!(
        model = %config.model,
        key = %format!("{}...", client.key_prefix()),
        "analysis service ready"
    );

    let pipeline = AnalysisPipeline::new(client, config);
    let mut rx = pipeline.subscribe();
    let progress = thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(update) => {
                    if update.state == RunState::Executing {
                        if let Some(path) = update.current_path {
                            eprintln!(
                                "[{}/{}] {}",
                                update.files_analyzed + 1,
                                update.max_files,
                                path.display()
                            );
                        }
                    } else if update.state == RunState::Specialized {
                        eprintln!("Running specialized analyses...");
                    } else if update.state == RunState::Consolidating {
                        eprintln!("Consolidating...");
                    }
                    if update.state.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = pipeline.run(input);
    drop(pipeline);
    let _ = progress.join();

    let outcome = result?;
    print_summary(&outcome);
    Ok(())
}

/// Show which files a run would analyze.
fn run_dry(input: &Path, config: &AnalysisConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let target = AnalysisTarget::resolve(input, &cwd);
    if !target.is_tree() {
        println!(
            "{} is a report document: six specialized analyses and one synthesis would run",
            target.path().display()
        );
        return Ok(());
    }

    let walker = SourceWalker::new(EligibilityFilter::from_config(config))
        .with_output_dir(&config.output_dir);
    let mut count = 0usize;
    let mut total = 0u64;

    println!("Files under {}:", target.path().display());
    for item in walker.walk(target.path()).context("Walk failed")? {
        if count >= config.max_files {
            break;
        }
        match item {
            WalkItem::Eligible(file) => {
                println!("  {:>10}  {}", format_size(file.size_bytes), file.display_path());
                count += 1;
                total += file.size_bytes;
            }
            WalkItem::Skipped(warning) => {
                println!("  {:>10}  {}", "skipped", warning.message);
            }
        }
    }

    println!();
    println!(
        "{count} file(s) would be analyzed ({}, limit {})",
        format_size(total),
        config.max_files
    );
    Ok(())
}

fn run_clean(dir: &Path, all: bool) -> Result<()> {
    let summary = clean_reports(dir, all).context("Cleanup failed")?;
    if summary.is_empty() {
        println!("Nothing to clean in {}", dir.display());
        return Ok(());
    }
    for path in summary.removed_files.iter().chain(&summary.removed_dirs) {
        println!("Removed {}", path.display());
    }
    println!(
        "{} file(s) and {} dir(s) removed",
        summary.removed_files.len(),
        summary.removed_dirs.len()
    );
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" Final report: {}", outcome.output_file.display());
    println!(" Metadata:     {}", outcome.metadata_file.display());
    if let Some(ref dir) = outcome.reports_dir {
        println!(" Reports:      {}", dir.display());
    }
    println!(
        " {} file(s) analyzed, {} skipped, {} of reports{}",
        outcome.total_files_analyzed(),
        outcome.skipped_files(),
        format_size(outcome.reports_bytes()),
        if outcome.fallback { ", fallback used" } else { "" }
    );
    if let Some(ref error) = outcome.error {
        println!(" Consolidation error: {error}");
    }
    println!("{}", "─".repeat(60));
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "10MB", "1.5G").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let number = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');

    let multiplier: u64 = if s.ends_with("GB") || s.ends_with('G') {
        1024 * 1024 * 1024
    } else if s.ends_with("MB") || s.ends_with('M') {
        1024 * 1024
    } else if s.ends_with("KB") || s.ends_with('K') {
        1024
    } else {
        1
    };

    let num: f64 = number
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;
    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("2m").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_cli_shorthand() {
        let cli = Cli::try_parse_from(["codeaudit"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input, PathBuf::from("codebase_report.md"));

        let cli = Cli::try_parse_from(["codeaudit", "analyze", "src", "--max-files", "3", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Command::Analyze { input, options }) => {
                assert_eq!(input, PathBuf::from("src"));
                assert_eq!(options.max_files, Some(3));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_layering_precedence() {
        let defaults = CommandDefaults {
            max_files: Some(20),
            max_size_bytes: Some(10 * 1024 * 1024),
        };

        let config = layer_config(&Settings::default(), &RunOptions::default(), defaults).unwrap();
        assert_eq!(config.max_files, 20);
        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);

        let settings = Settings {
            max_files: Some(7),
            ..Settings::default()
        };
        let config = layer_config(&settings, &RunOptions::default(), defaults).unwrap();
        assert_eq!(config.max_files, 7);
        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);

        let options = RunOptions {
            max_files: Some(3),
            max_size: Some("1KB".to_string()),
            ..RunOptions::default()
        };
        let config = layer_config(&settings, &options, defaults).unwrap();
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_size_bytes, 1024);
    }

    #[test]
    fn test_analyze_keeps_built_in_defaults() {
        let config = layer_config(
            &Settings::default(),
            &RunOptions::default(),
            CommandDefaults::default(),
        )
        .unwrap();
        assert_eq!(config.max_files, 20);
        assert_eq!(config.max_size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_cli_timeout_flag() {
        let cli = Cli::try_parse_from(["codeaudit", "src", "--timeout", "45"]).unwrap();
        assert_eq!(cli.options.timeout, Some(45));
    }

    #[test]
    fn test_cli_clean() {
        let cli = Cli::try_parse_from(["codeaudit", "clean", "out", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Clean { ref dir, all: true }) if dir == Path::new("out")
        ));
    }
}
