//! Builder pattern API for unused CSS analysis.
//!
//! Fans the page list out to concurrent [`PageAnalyzer`] runs sharing one
//! [`RuleRegistry`], waits for all of them, then reduces the registry:
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//!
//! let result = Deadcss::new(["https://example.com/", "https://example.com/about"])
//!     .exclude_stylesheets(["bootstrap.min.css"])
//!     .analyze()?;
//!
//! for rule in result.unused() {
//!     println!("{}: {}", rule.stylesheet_label(), rule.selector);
//! }
//! ```

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::analyze::{PageAnalyzer, PageStats};
use crate::config::DeadcssConfig;
use crate::document::DocumentProvider;
use crate::error::{DeadcssError, DeadcssResult};
use crate::registry::{RuleRecord, RuleRegistry};

/// Builder for configuring an analysis run.
#[derive(Debug, Clone)]
pub struct Deadcss {
    /// Page URLs as given, before deduplication
    urls: Vec<String>,

    /// Loader, scheduling and output settings
    config: DeadcssConfig,
}

impl Deadcss {
    /// Create a new analysis over the given page URLs.
    pub fn new(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            config: DeadcssConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: DeadcssConfig) -> Self {
        self.config = config;
        self
    }

    /// Cap concurrent page workers (default: one per URL).
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.analysis.jobs = Some(jobs);
        self
    }

    /// Never load stylesheets with these file names.
    pub fn exclude_stylesheets(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config
            .loader
            .excluded_stylesheets
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Only load stylesheets from each page's own origin.
    pub fn same_origin_only(mut self, enabled: bool) -> Self {
        self.config.loader.same_origin_only = enabled;
        self
    }

    pub fn config(&self) -> &DeadcssConfig {
        &self.config
    }

    /// Page URLs to analyze: trimmed, blanks dropped, duplicates removed
    /// keeping first occurrence.
    pub fn urls(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .filter(|u| seen.insert(*u))
            .map(String::from)
            .collect()
    }

    /// Run the analysis over HTTP(S) and local files.
    #[cfg(feature = "http")]
    pub fn analyze(&self) -> DeadcssResult<AnalysisResult> {
        let provider = crate::http::HttpProvider::new(&self.config.loader)?;
        self.analyze_with(&provider)
    }

    /// Run the analysis with a custom document provider.
    ///
    /// Page failures are isolated: they are logged, recorded in
    /// [`AnalysisResult::failures`] and do not stop other pages. The only
    /// error returned is failure to start the worker pool.
    pub fn analyze_with<P: DocumentProvider + ?Sized>(&self, provider: &P) -> DeadcssResult<AnalysisResult> {
        let urls = self.urls();
        let registry = RuleRegistry::new();

        let workers = self.config.analysis.jobs.unwrap_or(urls.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("deadcss-page-{i}"))
            .build()
            .map_err(|e| DeadcssError::internal(format!("failed to start page workers: {e}")))?;

        info!(pages = urls.len(), workers, "starting analysis");

        let outcomes: Vec<Result<PageStats, PageFailure>> = pool.install(|| {
            urls.par_iter()
                .map(|url| {
                    PageAnalyzer::new(provider, &registry)
                        .analyze(url)
                        .map_err(|e| {
                            // Bulkhead: one page failing never affects the others
                            warn!(url = %url, error = %e, "page skipped");
                            PageFailure {
                                url: url.clone(),
                                error: e.to_string(),
                            }
                        })
                })
                .collect()
        });

        let mut pages = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(stats) => pages.push(stats),
                Err(failure) => failures.push(failure),
            }
        }

        let rules = registry.records();
        info!(rules = rules.len(), failures = failures.len(), "analysis finished");

        Ok(AnalysisResult {
            urls,
            pages,
            failures,
            rules,
        })
    }
}

/// A page that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

/// Rule counts of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total_rules: usize,
    pub used_rules: usize,
    pub unused_rules: usize,
    pub unused_percentage: f64,
}

/// Result of an analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Deduplicated page URLs that were dispatched
    pub urls: Vec<String>,

    /// Statistics of pages analyzed successfully, in input order
    pub pages: Vec<PageStats>,

    /// Pages that failed, in input order
    pub failures: Vec<PageFailure>,

    /// Every rule seen, sorted by stylesheet then selector
    pub rules: Vec<RuleRecord>,
}

impl AnalysisResult {
    /// Unused rules, sorted by stylesheet then selector.
    pub fn unused(&self) -> Vec<&RuleRecord> {
        self.rules.iter().filter(|r| !r.is_used()).collect()
    }

    /// Check if any unused rule was found.
    pub fn has_unused(&self) -> bool {
        self.rules.iter().any(|r| !r.is_used())
    }

    pub fn summary(&self) -> Summary {
        let total_rules = self.rules.len();
        let unused_rules = self.rules.iter().filter(|r| !r.is_used()).count();
        let unused_percentage = if total_rules == 0 {
            0.0
        } else {
            (unused_rules as f64 / total_rules as f64) * 100.0
        };
        Summary {
            total_rules,
            used_rules: total_rules - unused_rules,
            unused_rules,
            unused_percentage,
        }
    }
}
