//! deadcss CLI - unused CSS rule detector.
//!
//! Features:
//! - Any number of page URLs (or local HTML files), analyzed concurrently
//! - Console report of unused rules, plain or JSON
//! - Full rule dump (used and unused) for downstream tooling
//! - Optional deadcss.toml for loader and output settings

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use deadcss_core::{
    init_structured_logging, load_config, log_error, log_info, log_warn, print_json, print_plain,
    print_summary, write_dump, AnalysisResult, Deadcss, DeadcssConfig,
};

/// Dump path used when neither the CLI nor the config names one.
const DEFAULT_DUMP: &str = "output.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Find CSS rules that match nothing on your pages")]
pub struct Cli {
    /// Page URLs or local HTML files to analyze
    #[arg(num_args = 0..)]
    urls: Vec<String>,

    /// Read additional URLs from a file (one per line, `#` starts a comment)
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Output the report in JSON format
    #[arg(long)]
    json: bool,

    /// Write the full rule dump to this file
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Do not write the rule dump
    #[arg(long, conflicts_with = "dump")]
    no_dump: bool,

    /// Directory containing deadcss.toml (default: current directory)
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Maximum number of pages analyzed at once (default: all)
    #[arg(long)]
    jobs: Option<usize>,

    /// Stylesheet file name never loaded (repeatable or comma-separated)
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    exclude_stylesheet: Vec<String>,

    /// Only load stylesheets from each page's own origin
    #[arg(long)]
    same_origin: bool,

    /// Exit with code 1 when unused rules are found
    #[arg(long)]
    fail_on_unused: bool,

    /// Verbose logging when RUST_LOG is not set
    #[arg(short, long)]
    verbose: bool,
}

/// Parses a URL list file: one entry per line, blank lines and `#` comments skipped.
fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Collects positional URLs followed by those of `--urls-file`.
fn collect_urls(cli: &Cli) -> Result<Vec<String>> {
    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.urls_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read URL list: {}", path.display()))?;
        urls.extend(parse_url_list(&content));
    }
    Ok(urls)
}

/// Applies CLI flags on top of the configuration file.
fn merge_config(mut config: DeadcssConfig, cli: &Cli) -> DeadcssConfig {
    if let Some(jobs) = cli.jobs {
        config.analysis.jobs = Some(jobs);
    }
    config
        .loader
        .excluded_stylesheets
        .extend(cli.exclude_stylesheet.iter().cloned());
    if cli.same_origin {
        config.loader.same_origin_only = true;
    }
    if cli.json {
        config.output.format = Some("json".to_string());
    }
    config
}

/// Resolves where the dump goes, if anywhere.
fn dump_path(cli: &Cli, config: &DeadcssConfig) -> Option<PathBuf> {
    if cli.no_dump {
        return None;
    }
    cli.dump.clone().or_else(|| {
        Some(PathBuf::from(
            config.output.dump.as_deref().unwrap_or(DEFAULT_DUMP),
        ))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_structured_logging(if cli.verbose { "deadcss_core=debug" } else { "warn" });

    let config_dir = cli.config.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = load_config(&config_dir)?.unwrap_or_default();
    let config = merge_config(config, &cli);

    let urls = collect_urls(&cli)?;
    if urls.iter().all(|u| u.trim().is_empty()) {
        log_warn("No URLs given; nothing to analyze");
    }

    let result = Deadcss::new(urls)
        .with_config(config.clone())
        .analyze()
        .context("Analysis failed to start")?;

    let code = report_and_dump(&result, &config, dump_path(&cli, &config).as_deref(), cli.fail_on_unused)?;
    std::process::exit(code);
}

/// Prints the report, writes the dump and returns the process exit code.
fn report_and_dump(
    result: &AnalysisResult,
    config: &DeadcssConfig,
    dump: Option<&Path>,
    fail_on_unused: bool,
) -> Result<i32> {
    // 1. Report (stdout)
    if config.output.format.as_deref() == Some("json") {
        print_json(result)?;
    } else {
        print_plain(result);
    }
    print_summary(result);

    // 2. Dump (the only step whose failure changes the exit code)
    if let Some(path) = dump {
        if let Err(e) = write_dump(result, path) {
            log_error(&format!("Failed to write rule dump: {}", e));
            eprintln!("[ERROR] Failed to write rule dump: {}", e);
            return Ok(2);
        }
        log_info(&format!("Rule dump written to {}", path.display()));
    }

    // 3. Exit code (opt-in CI mode)
    Ok(if fail_on_unused && result.has_unused() { 1 } else { 0 })
}
