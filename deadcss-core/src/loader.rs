//! Resource load policy.
//!
//! Decides which requests a page load may make. Navigation to the page
//! itself is always allowed; of the subresources only stylesheets are of
//! interest, so anything carrying a non-`.css` extension is refused.

use serde::Deserialize;
use url::Url;

/// Loader settings, the `[loader]` table of `deadcss.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Stylesheet file names never loaded (e.g. a vendored framework)
    pub excluded_stylesheets: Vec<String>,
    /// Only load stylesheets from the page's own origin
    pub same_origin_only: bool,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            excluded_stylesheets: Vec::new(),
            same_origin_only: false,
            timeout_secs: 30,
            user_agent: concat!("deadcss/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Pure request filter applied before any fetch.
#[derive(Debug, Clone, Default)]
pub struct LoadPolicy {
    excluded: Vec<String>,
    same_origin_only: bool,
}

impl LoadPolicy {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            excluded: config.excluded_stylesheets.clone(),
            same_origin_only: config.same_origin_only,
        }
    }

    /// Should `request` be loaded while analyzing `page`?
    pub fn should_load(&self, request: &Url, page: &Url) -> bool {
        if without_fragment(request) == without_fragment(page) {
            return true;
        }
        if self.same_origin_only && !same_origin(request, page) {
            return false;
        }
        self.should_load_path(request.path())
    }

    /// Path-only part of the policy: `.css` and extensionless paths pass,
    /// other extensions and excluded file names do not.
    pub fn should_load_path(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if self.excluded.iter().any(|ex| ex == file_name) {
            return false;
        }
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.eq_ignore_ascii_case("css"),
            // Dotfiles and bare names carry no extension
            _ => true,
        }
    }
}

/// `file:` URLs have opaque origins that never compare equal; local files
/// are treated as one origin.
fn same_origin(a: &Url, b: &Url) -> bool {
    if a.scheme() == "file" && b.scheme() == "file" {
        return true;
    }
    a.origin() == b.origin()
}

fn without_fragment(url: &Url) -> Url {
    let mut u = url.clone();
    u.set_fragment(None);
    u
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_css_and_extensionless_allowed() {
        let policy = LoadPolicy::default();
        assert!(policy.should_load_path("/static/site.css"));
        assert!(policy.should_load_path("/static/SITE.CSS"));
        assert!(policy.should_load_path("/styles"));
        assert!(policy.should_load_path("/"));
    }

    #[test]
    fn test_other_extensions_denied() {
        let policy = LoadPolicy::default();
        assert!(!policy.should_load_path("/app.js"));
        assert!(!policy.should_load_path("/logo.png"));
        assert!(!policy.should_load_path("/font.woff2"));
        // Only the final extension counts
        assert!(!policy.should_load_path("/site.css.gz"));
        assert!(!policy.should_load_path("/site.css.map"));
    }

    #[test]
    fn test_excluded_file_names() {
        let policy = LoadPolicy::new(&LoaderConfig {
            excluded_stylesheets: vec!["bootstrap.min.css".into()],
            ..LoaderConfig::default()
        });
        assert!(!policy.should_load_path("/vendor/bootstrap.min.css"));
        assert!(policy.should_load_path("/vendor/site.min.css"));
    }

    #[test]
    fn test_page_itself_always_allowed() {
        let policy = LoadPolicy::default();
        let page = url("https://site.test/index.html");
        assert!(policy.should_load(&page, &page));
        assert!(policy.should_load(&url("https://site.test/index.html#top"), &page));
        assert!(!policy.should_load(&url("https://site.test/other.html"), &page));
    }

    #[test]
    fn test_same_origin_only() {
        let policy = LoadPolicy::new(&LoaderConfig {
            same_origin_only: true,
            ..LoaderConfig::default()
        });
        let page = url("https://site.test/");
        assert!(policy.should_load(&url("https://site.test/a.css"), &page));
        assert!(!policy.should_load(&url("https://cdn.test/a.css"), &page));
    }
}
