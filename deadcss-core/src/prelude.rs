//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use deadcss_core::prelude::*;
//! ```

// Errors
pub use crate::error::{DeadcssError, DeadcssResult};

// Orchestration
pub use crate::builder::{AnalysisResult, Deadcss, PageFailure, Summary};
pub use crate::analyze::{PageAnalyzer, PageStats};

// Registry
pub use crate::registry::{Rule, RuleKey, RuleRecord, RuleRegistry};

// Documents
pub use crate::document::{Document, DocumentProvider, StaticProvider};
#[cfg(feature = "http")]
pub use crate::http::HttpProvider;

// Configuration
pub use crate::config::{load_config, DeadcssConfig};
