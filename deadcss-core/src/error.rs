//! Typed error handling for deadcss.
//!
//! Errors are split by blast radius: URL-level and selector-level failures
//! are recoverable and only cost one page or one selector, while failures to
//! persist the final report are fatal to the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadcss operations.
#[derive(Error, Debug)]
pub enum DeadcssError {
    /// The page address could not be parsed or resolved
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Fetching a page or stylesheet failed at the transport level
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// The server answered with a non-success status
    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// A selector could not be compiled into a DOM query
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// I/O error when reading pages or writing reports
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Report serialization failed
    #[error("Serialization error: {message}")]
    Serialize { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeadcssError {
    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a selector compilation error.
    pub fn selector(selector: impl Into<String>, message: impl ToString) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialize(message: impl ToString) -> Self {
        Self::Serialize {
            message: message.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (the run can continue without
    /// the page or selector that produced it).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::Fetch { .. } | Self::Status { .. } | Self::Selector { .. }
        )
    }

    /// Get the URL associated with this error, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::InvalidUrl { url, .. } => Some(url),
            Self::Fetch { url, .. } => Some(url),
            Self::Status { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Convenience type alias for deadcss results.
pub type DeadcssResult<T> = Result<T, DeadcssError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadcssResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadcssResult<T> {
        self.map_err(|e| DeadcssError::io(path, e))
    }
}
