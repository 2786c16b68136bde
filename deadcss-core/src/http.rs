//! Network and filesystem page loading.
//!
//! `http(s)://` URLs are fetched with a blocking `reqwest` client (one shared
//! connection pool across all page workers); `file://` URLs are read from
//! disk so that built sites can be checked without serving them.

use std::fs;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};
use url::Url;

use crate::document::{Document, DocumentProvider, HtmlDocument};
use crate::error::{DeadcssError, DeadcssResult, IoResultExt};
use crate::loader::{LoadPolicy, LoaderConfig};

/// [`DocumentProvider`] for live sites and local files.
pub struct HttpProvider {
    client: Client,
    policy: LoadPolicy,
}

impl HttpProvider {
    pub fn new(config: &LoaderConfig) -> DeadcssResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DeadcssError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy: LoadPolicy::new(config),
        })
    }

    /// Fetch the body of `url` as text.
    fn fetch_text(&self, url: &Url) -> DeadcssResult<String> {
        match url.scheme() {
            "http" | "https" => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .map_err(|e| DeadcssError::fetch(url.as_str(), e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(DeadcssError::status(url.as_str(), status.as_u16()));
                }
                response.text().map_err(|e| DeadcssError::fetch(url.as_str(), e))
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| DeadcssError::invalid_url(url.as_str(), "not a local file path"))?;
                fs::read_to_string(&path).with_path(path)
            }
            other => Err(DeadcssError::invalid_url(
                url.as_str(),
                format!("unsupported scheme '{other}'"),
            )),
        }
    }
}

impl DocumentProvider for HttpProvider {
    fn fetch_and_parse(&self, url: &Url) -> DeadcssResult<Box<dyn Document>> {
        let markup = match self.fetch_text(url) {
            // A missing local page is a page-level failure like a 404
            Err(DeadcssError::Io { message, .. }) => {
                return Err(DeadcssError::fetch(url.as_str(), message))
            }
            other => other?,
        };

        let doc = HtmlDocument::parse(&markup, url, |css_url| {
            if !self.policy.should_load(css_url, url) {
                debug!(page = %url, stylesheet = %css_url, "stylesheet blocked by load policy");
                return None;
            }
            match self.fetch_text(css_url) {
                Ok(css) => Some(css),
                Err(e) => {
                    warn!(page = %url, stylesheet = %css_url, error = %e, "stylesheet not loaded");
                    None
                }
            }
        });
        Ok(Box::new(doc))
    }
}
