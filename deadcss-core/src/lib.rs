//! deadcss-core: unused CSS rule detection library
//!
//! Loads pages, walks the style rules of every stylesheet they attach, and
//! records which atomic selectors match at least one element on at least
//! one page. Whatever never matched is reported as unused.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//!
//! let result = Deadcss::new(["https://example.com/"]).analyze()?;
//! for rule in result.unused() {
//!     println!("{}: {}", rule.stylesheet_label(), rule.selector);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`selector`]: Selector lists, decomposition, pseudo-class normalization
//! - [`stylesheet`]: Stylesheet rule trees
//! - [`registry`]: Shared insert-once rule registry with claim-once usage
//! - [`document`]: Document and provider abstractions
//! - [`analyze`]: Per-page analysis
//! - [`builder`]: Fluent builder running pages concurrently
//! - [`report`]: Console report and rule dump
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `http` (default): fetch pages over HTTP(S) and from `file://` URLs

pub mod analyze;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod logging;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod selector;
pub mod stylesheet;

#[cfg(feature = "http")]
pub mod http;

// Error types
pub use error::{DeadcssError, DeadcssResult, IoResultExt};

// Builder API
pub use builder::{AnalysisResult, Deadcss, PageFailure, Summary};

// Analysis
pub use analyze::{PageAnalyzer, PageStats};

// Registry
pub use registry::{sort_records, Rule, RuleKey, RuleRecord, RuleRegistry, INLINE_LABEL};

// Selectors
pub use selector::{compile_query, decompose, normalize, parse_selector, QuerySelector, Selector};

// Stylesheets
pub use stylesheet::{parse_rules, RuleNode, Stylesheet};

// Documents and loading
pub use document::{
    discover_stylesheets, parse_page_url, Document, DocumentProvider, HtmlDocument,
    StaticProvider, StylesheetSource,
};
pub use loader::{LoadPolicy, LoaderConfig};

#[cfg(feature = "http")]
pub use http::HttpProvider;

// Configuration
pub use config::{load_config, AnalysisConfig, DeadcssConfig, OutputConfig, CONFIG_FILE};

// Logging
pub use logging::{init_structured_logging, log_error, log_info, log_warn};

// Reporting
pub use report::{json_report, plain_lines, print_json, print_plain, print_summary, write_dump};

#[cfg(test)]
mod tests;
