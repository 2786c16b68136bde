//! Documents and the providers that produce them.
//!
//! A [`Document`] is a parsed page plus the stylesheets attached to it, in
//! document order. A [`DocumentProvider`] turns a page URL into a document;
//! it is shared by every page worker, hence the `Sync` bound. Documents
//! themselves are created and consumed on a single worker.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::error::{DeadcssError, DeadcssResult};
use crate::selector::QuerySelector;
use crate::stylesheet::Stylesheet;

/// A parsed page that can be queried for matching elements.
pub trait Document {
    /// Name of the first element matching `selector`, if any.
    fn query_first_match(&self, selector: &QuerySelector) -> Option<String>;

    /// Stylesheets attached to the page, in document order.
    fn stylesheets(&self) -> &[Stylesheet];
}

/// Fetches and parses pages.
pub trait DocumentProvider: Sync {
    fn fetch_and_parse(&self, url: &Url) -> DeadcssResult<Box<dyn Document>>;
}

/// A stylesheet reference found in page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// Contents of a `<style>` element
    Inline(String),
    /// Resolved `href` of a `<link rel="stylesheet">`
    Linked(Url),
}

fn stylesheet_elements() -> &'static scraper::Selector {
    static SELECTOR: OnceLock<scraper::Selector> = OnceLock::new();
    // Hardcoded selector, exercised by the tests below
    SELECTOR.get_or_init(|| scraper::Selector::parse("style, link[href]").expect("valid stylesheet selector"))
}

/// Find stylesheet references in document order.
///
/// `<link>` elements count when their `rel` token list contains
/// `stylesheet` (and not `alternate`); hrefs are resolved against `base`,
/// unresolvable ones are skipped.
pub fn discover_stylesheets(html: &Html, base: &Url) -> Vec<StylesheetSource> {
    let mut sources = Vec::new();
    for el in html.select(stylesheet_elements()) {
        let value = el.value();
        if value.name() == "style" {
            sources.push(StylesheetSource::Inline(el.text().collect()));
            continue;
        }

        let rel = value.attr("rel").unwrap_or_default().to_ascii_lowercase();
        let mut tokens = rel.split_ascii_whitespace();
        if !tokens.clone().any(|t| t == "stylesheet") || tokens.any(|t| t == "alternate") {
            continue;
        }
        let Some(href) = value.attr("href") else { continue };
        match base.join(href.trim()) {
            Ok(resolved) => sources.push(StylesheetSource::Linked(resolved)),
            Err(e) => warn!(page = %base, href = %href, error = %e, "unresolvable stylesheet link"),
        }
    }
    sources
}

/// [`Document`] backed by `scraper`'s HTML tree.
pub struct HtmlDocument {
    html: Html,
    stylesheets: Vec<Stylesheet>,
}

impl HtmlDocument {
    /// Parse page markup and load its stylesheets.
    ///
    /// `load` returns the text of a linked stylesheet, or `None` when it was
    /// filtered out or could not be fetched; such stylesheets are omitted.
    pub fn parse(markup: &str, base: &Url, mut load: impl FnMut(&Url) -> Option<String>) -> Self {
        let html = Html::parse_document(markup);
        let stylesheets = discover_stylesheets(&html, base)
            .into_iter()
            .filter_map(|source| match source {
                StylesheetSource::Inline(css) => Some(Stylesheet::parse(None, &css)),
                StylesheetSource::Linked(url) => {
                    let css = load(&url)?;
                    debug!(stylesheet = %url, bytes = css.len(), "stylesheet loaded");
                    Some(Stylesheet::parse(Some(url.to_string()), &css))
                }
            })
            .collect();
        Self { html, stylesheets }
    }
}

impl Document for HtmlDocument {
    fn query_first_match(&self, selector: &QuerySelector) -> Option<String> {
        self.html
            .select(selector.compiled())
            .next()
            .map(|el| el.value().name().to_string())
    }

    fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }
}

/// Serves pages and stylesheets from memory.
///
/// Useful when content is already at hand (build output, snapshots) and
/// for exercising the analyzer without I/O.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pages: HashMap<String, String>,
    stylesheets: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register page markup under `url`.
    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(normalize_key(url), markup.to_string());
        self
    }

    /// Register stylesheet text under `url`.
    pub fn with_stylesheet(mut self, url: &str, css: &str) -> Self {
        self.stylesheets.insert(normalize_key(url), css.to_string());
        self
    }
}

fn normalize_key(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

impl DocumentProvider for StaticProvider {
    fn fetch_and_parse(&self, url: &Url) -> DeadcssResult<Box<dyn Document>> {
        let markup = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| DeadcssError::status(url.as_str(), 404))?;

        let doc = HtmlDocument::parse(markup, url, |css_url| {
            let css = self.stylesheets.get(css_url.as_str()).cloned();
            if css.is_none() {
                warn!(page = %url, stylesheet = %css_url, "stylesheet not found");
            }
            css
        });
        Ok(Box::new(doc))
    }
}

/// Parse a page address given by the user.
///
/// Absolute URLs are taken as-is; anything else is treated as a filesystem
/// path and turned into a `file://` URL.
pub fn parse_page_url(input: &str) -> DeadcssResult<Url> {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) if url.cannot_be_a_base() => Err(DeadcssError::invalid_url(input, "not a page address")),
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(input);
            let absolute = std::path::absolute(path).map_err(|e| DeadcssError::invalid_url(input, e))?;
            Url::from_file_path(&absolute)
                .map_err(|_| DeadcssError::invalid_url(input, "path cannot be expressed as a file URL"))
        }
        Err(e) => Err(DeadcssError::invalid_url(input, e)),
    }
}
