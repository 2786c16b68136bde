//! Output formatting - plaintext, JSON, and the persisted rule dump.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::builder::{AnalysisResult, Summary};
use crate::error::{DeadcssError, DeadcssResult, IoResultExt};
use crate::registry::RuleRecord;

/// One report line per unused rule: `<stylesheet>: <selector>`.
pub fn plain_lines(result: &AnalysisResult) -> Vec<String> {
    result
        .unused()
        .into_iter()
        .map(|r| format!("{}: {}", r.stylesheet_label(), r.selector))
        .collect()
}

/// Prints unused rules in plain text format.
pub fn print_plain(result: &AnalysisResult) {
    for line in plain_lines(result) {
        println!("{}", line);
    }
}

/// Render the JSON report: summary, failures and unused rules.
pub fn json_report(result: &AnalysisResult) -> DeadcssResult<String> {
    let report = json!({
        "summary": result.summary(),
        "pages": result.pages,
        "failures": result.failures,
        "unused": result.unused(),
    });
    serde_json::to_string_pretty(&report).map_err(DeadcssError::serialize)
}

/// Prints the JSON report.
pub fn print_json(result: &AnalysisResult) -> DeadcssResult<()> {
    println!("{}", json_report(result)?);
    Ok(())
}

/// Prints a short summary and any page failures to stderr.
pub fn print_summary(result: &AnalysisResult) {
    let s = result.summary();
    eprintln!(
        "Analyzed {} page(s): {} rule(s), {} used, {} unused ({:.1}%)",
        result.pages.len(),
        s.total_rules,
        s.used_rules,
        s.unused_rules,
        s.unused_percentage
    );
    for failure in &result.failures {
        eprintln!("[WARN] {} skipped: {}", failure.url, failure.error);
    }
}

/// Contents of the dump file.
#[derive(Debug, Serialize)]
struct Dump<'a> {
    generated_at: String,
    urls: &'a [String],
    summary: Summary,
    rules: &'a [RuleRecord],
}

/// Write every rule, used and unused, to `path` as pretty JSON.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so an interrupted write never leaves a truncated dump behind.
pub fn write_dump(result: &AnalysisResult, path: &Path) -> DeadcssResult<()> {
    let dump = Dump {
        generated_at: Utc::now().to_rfc3339(),
        urls: &result.urls,
        summary: result.summary(),
        rules: &result.rules,
    };
    let json = serde_json::to_string_pretty(&dump).map_err(DeadcssError::serialize)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_path(dir)?;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.json".to_string());
    let temp_path = path.with_file_name(format!("{}.{}.{}.tmp", file_name, std::process::id(), nanos));

    fs::write(&temp_path, json).with_path(&temp_path)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        DeadcssError::io(path, e)
    })
}
