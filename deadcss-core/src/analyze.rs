//! Per-page analysis.
//!
//! For one page: load the document, walk every style rule of every attached
//! stylesheet, and for each atomic selector register the rule and, unless
//! some page already proved it used, query the document for a match.
//!
//! Within one style rule, atomic selectors are tried in source order and
//! the first used one ends the rule: `.a, .b` stops at `.a` when `.a` is
//! already marked used or matches on this page.

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::document::{parse_page_url, DocumentProvider};
use crate::error::DeadcssResult;
use crate::registry::{Rule, RuleKey, RuleRegistry, INLINE_LABEL};
use crate::selector::{compile_query, parse_selector};

/// Counters describing one page's contribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    /// Page URL as analyzed
    pub url: String,
    /// Stylesheets attached to the page
    pub stylesheets: usize,
    /// Style rules walked across all stylesheets
    pub style_rules: usize,
    /// Atomic selectors registered
    pub selectors: usize,
    /// DOM queries issued
    pub queries: usize,
    /// Usage claims this page won
    pub claims: usize,
    /// Selectors skipped because they could not be compiled
    pub skipped: usize,
}

/// Analyzes pages into a shared [`RuleRegistry`].
pub struct PageAnalyzer<'a, P: DocumentProvider + ?Sized> {
    provider: &'a P,
    registry: &'a RuleRegistry,
}

impl<'a, P: DocumentProvider + ?Sized> PageAnalyzer<'a, P> {
    pub fn new(provider: &'a P, registry: &'a RuleRegistry) -> Self {
        Self { provider, registry }
    }

    /// Analyze one page.
    ///
    /// Errors are page-level (bad address, fetch failure) and leave the
    /// registry untouched; nothing is registered before the document loads.
    pub fn analyze(&self, input: &str) -> DeadcssResult<PageStats> {
        let url = parse_page_url(input)?;
        let page = url.as_str();
        let _span = info_span!("page", url = %page).entered();

        info!("analyzing page");
        let doc = self.provider.fetch_and_parse(&url)?;

        let mut stats = PageStats {
            url: page.to_string(),
            stylesheets: doc.stylesheets().len(),
            ..PageStats::default()
        };

        for sheet in doc.stylesheets() {
            let origin = sheet.origin.as_deref();

            for rule_text in sheet.style_rules() {
                stats.style_rules += 1;
                let Some(selector) = parse_selector(rule_text) else {
                    continue;
                };

                for atom in selector.atoms() {
                    let query = match compile_query(atom) {
                        Ok(q) => q,
                        Err(e) => {
                            warn!(stylesheet = origin.unwrap_or(INLINE_LABEL), error = %e, "selector skipped");
                            stats.skipped += 1;
                            continue;
                        }
                    };

                    stats.selectors += 1;
                    let rule = self.registry.get_or_insert(Rule::new(
                        RuleKey::new(origin, atom),
                        query.text(),
                        rule_text,
                    ));
                    if rule.is_used() {
                        break;
                    }

                    stats.queries += 1;
                    if let Some(element) = doc.query_first_match(&query) {
                        if rule.claim(page) {
                            stats.claims += 1;
                            debug!(selector = atom, element = %element, "usage claimed");
                        }
                        break;
                    }
                }
            }
        }

        info!(
            stylesheets = stats.stylesheets,
            rules = stats.style_rules,
            queries = stats.queries,
            claims = stats.claims,
            "page done"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StaticProvider;

    const PAGE: &str = "http://site.test/";

    fn provider(body: &str, css: &str) -> StaticProvider {
        StaticProvider::new()
            .with_page(
                PAGE,
                &format!(r#"<link rel="stylesheet" href="/s.css"><body>{body}</body>"#),
            )
            .with_stylesheet("http://site.test/s.css", css)
    }

    fn key(sel: &str) -> RuleKey {
        RuleKey::new(Some("http://site.test/s.css"), sel)
    }

    #[test]
    fn test_marks_used_and_unused() {
        let registry = RuleRegistry::new();
        let p = provider(r#"<div class="used"></div>"#, ".used {} .dead {}");
        let stats = PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        assert_eq!(stats.style_rules, 2);
        assert_eq!(stats.claims, 1);
        assert_eq!(registry.get(&key(".used")).unwrap().used_on(), Some(PAGE));
        assert!(!registry.get(&key(".dead")).unwrap().is_used());
    }

    #[test]
    fn test_first_match_ends_rule() {
        let registry = RuleRegistry::new();
        let p = provider(r#"<i class="b"></i><i class="c"></i>"#, ".a, .b, .c {}");
        let stats = PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        assert_eq!(stats.queries, 2);
        assert!(!registry.get(&key(".a")).unwrap().is_used());
        assert!(registry.get(&key(".b")).unwrap().is_used());
        // Never reached on this page
        assert!(registry.get(&key(".c")).is_none());
    }

    #[test]
    fn test_already_used_skips_query() {
        let registry = RuleRegistry::new();
        registry
            .get_or_insert(Rule::new(key(".x"), ".x", ".x"))
            .claim("http://earlier.test/");

        let p = provider(r#"<p class="x"></p>"#, ".x {}");
        let stats = PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        assert_eq!(stats.queries, 0);
        assert_eq!(stats.claims, 0);
        assert_eq!(registry.get(&key(".x")).unwrap().used_on(), Some("http://earlier.test/"));
    }

    #[test]
    fn test_pseudo_classes_stripped_before_query() {
        let registry = RuleRegistry::new();
        let p = provider(r#"<a class="btn"></a>"#, ".btn:hover {} .btn::after {}");
        PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        let hover = registry.get(&key(".btn:hover")).unwrap();
        assert!(hover.is_used());
        assert_eq!(hover.query_text(), ".btn");
        assert!(registry.get(&key(".btn::after")).unwrap().is_used());
    }

    #[test]
    fn test_bad_selector_skipped_siblings_continue() {
        let registry = RuleRegistry::new();
        let p = provider(r#"<b class="ok"></b>"#, "::-webkit-scrollbar, .ok {}");
        let stats = PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&key(".ok")).unwrap().is_used());
    }

    #[test]
    fn test_inline_and_media_rules() {
        let registry = RuleRegistry::new();
        let p = StaticProvider::new().with_page(
            PAGE,
            r#"<style>@media screen { .m {} } .n {}</style><div class="m"></div>"#,
        );
        PageAnalyzer::new(&p, &registry).analyze(PAGE).unwrap();

        assert!(registry.get(&RuleKey::new(None, ".m")).unwrap().is_used());
        assert!(!registry.get(&RuleKey::new(None, ".n")).unwrap().is_used());
    }

    #[test]
    fn test_fetch_failure_leaves_registry_empty() {
        let registry = RuleRegistry::new();
        let p = StaticProvider::new();
        assert!(PageAnalyzer::new(&p, &registry).analyze(PAGE).is_err());
        assert!(PageAnalyzer::new(&p, &registry).analyze("http://[bad").is_err());
        assert!(registry.is_empty());
    }
}
