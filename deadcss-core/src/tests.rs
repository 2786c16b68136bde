//! End-to-end test suite for deadcss-core.

use crate::*;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

const PAGE1: &str = "http://site.test/page1";
const PAGE2: &str = "http://site.test/page2";
const SHEET: &str = "http://site.test/site.css";

fn page(sheet_href: &str, body: &str) -> String {
    format!(r#"<html><head><link rel="stylesheet" href="{sheet_href}"></head><body>{body}</body></html>"#)
}

fn find<'a>(result: &'a AnalysisResult, sheet: Option<&str>, selector: &str) -> &'a RuleRecord {
    result
        .rules
        .iter()
        .find(|r| r.stylesheet.as_deref() == sheet && r.selector == selector)
        .unwrap_or_else(|| panic!("rule {selector} not registered"))
}

// Scenario: one dead rule across two pages
#[test]
fn test_two_pages_one_dead_rule() {
    let provider = StaticProvider::new()
        .with_page(PAGE1, &page("/page1.css", r#"<div class="used"></div>"#))
        .with_page(PAGE2, &page("/page2.css", r#"<div class="also-used"></div>"#))
        .with_stylesheet("http://site.test/page1.css", ".used {} .dead {}")
        .with_stylesheet("http://site.test/page2.css", ".also-used {}");

    let result = Deadcss::new([PAGE1, PAGE2]).analyze_with(&provider).unwrap();

    let unused: Vec<&str> = result.unused().iter().map(|r| r.selector.as_str()).collect();
    assert_eq!(unused, vec![".dead"]);
    assert_eq!(
        find(&result, Some("http://site.test/page1.css"), ".used").used_on.as_deref(),
        Some(PAGE1)
    );
    assert_eq!(
        find(&result, Some("http://site.test/page2.css"), ".also-used").used_on.as_deref(),
        Some(PAGE2)
    );
    assert!(result.failures.is_empty());
}

// Scenario: a shared stylesheet is used on the second page only
#[test]
fn test_shared_stylesheet_used_on_any_page() {
    let provider = StaticProvider::new()
        .with_page(PAGE1, &page("/site.css", "<p>nothing here</p>"))
        .with_page(PAGE2, &page("/site.css", r#"<nav class="menu"></nav>"#))
        .with_stylesheet(SHEET, ".menu {} .footer {}");

    let result = Deadcss::new([PAGE1, PAGE2]).analyze_with(&provider).unwrap();

    assert_eq!(result.rules.len(), 2);
    assert_eq!(find(&result, Some(SHEET), ".menu").used_on.as_deref(), Some(PAGE2));
    assert!(!find(&result, Some(SHEET), ".footer").is_used());
}

// Scenario: malformed and unreachable pages are isolated
#[test]
fn test_isolated_failures() {
    let provider = StaticProvider::new()
        .with_page(PAGE1, &page("/site.css", r#"<b class="a"></b>"#))
        .with_page(PAGE2, &page("/other.css", r#"<b class="b"></b>"#))
        .with_stylesheet(SHEET, ".a {}")
        .with_stylesheet("http://site.test/other.css", ".b {} .c {}");

    let result = Deadcss::new(["http://[not-a-url", PAGE1, PAGE2])
        .analyze_with(&provider)
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].url, "http://[not-a-url");
    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.rules.len(), 3);
    assert!(find(&result, Some(SHEET), ".a").is_used());
    assert!(find(&result, Some("http://site.test/other.css"), ".b").is_used());
}

// Identity: the same rule seen through many pages collapses to one entry
#[test]
fn test_rule_identity_across_pages() {
    let mut provider = StaticProvider::new().with_stylesheet(SHEET, ".x, .y {} .x {} .z {}");
    let urls: Vec<String> = (0..20).map(|i| format!("http://site.test/p{i}")).collect();
    for url in &urls {
        provider = provider.with_page(url, &page("/site.css", ""));
    }

    let result = Deadcss::new(urls).analyze_with(&provider).unwrap();

    let keys: HashSet<(Option<String>, String)> = result
        .rules
        .iter()
        .map(|r| (r.stylesheet.clone(), r.selector.clone()))
        .collect();
    assert_eq!(keys.len(), result.rules.len());
    assert_eq!(result.rules.len(), 3);
}

// Concurrency: many pages race to claim the same rules
#[test]
fn test_concurrent_claims_recorded_once() {
    let mut provider = StaticProvider::new().with_stylesheet(SHEET, ".hot {} .warm {} .cold {}");
    let urls: Vec<String> = (0..40).map(|i| format!("http://site.test/hot{i}")).collect();
    for (i, url) in urls.iter().enumerate() {
        let body = if i % 2 == 0 {
            r#"<i class="hot"></i><i class="warm"></i>"#
        } else {
            r#"<i class="hot"></i>"#
        };
        provider = provider.with_page(url, &page("/site.css", body));
    }

    let result = Deadcss::new(urls.clone()).analyze_with(&provider).unwrap();

    let claims: usize = result.pages.iter().map(|p| p.claims).sum();
    assert_eq!(claims, 2, "each used rule is claimed exactly once");

    let hot = find(&result, Some(SHEET), ".hot").used_on.clone().unwrap();
    assert!(urls.contains(&hot));
    let warm = find(&result, Some(SHEET), ".warm").used_on.clone().unwrap();
    let warm_index: usize = warm.trim_start_matches("http://site.test/hot").parse().unwrap();
    assert_eq!(warm_index % 2, 0, "only even pages contain .warm");
    assert!(!find(&result, Some(SHEET), ".cold").is_used());
}

// Soundness: unused rules match nothing, used rules match somewhere
#[test]
fn test_report_soundness() {
    let bodies = [
        r#"<ul class="list"><li class="item active"></li></ul>"#,
        r#"<form><input type="text" class="field"><button class="btn"></button></form>"#,
    ];
    let css = r#"
        .list > .item {}
        .item.active:hover {}
        .list .btn {}
        form .btn::before {}
        input[type="text"] {}
        input[type="radio"] {}
        @media print { .field {} }
    "#;
    let mut provider = StaticProvider::new().with_stylesheet(SHEET, css);
    let urls: Vec<String> = (0..bodies.len()).map(|i| format!("http://site.test/s{i}")).collect();
    for (url, body) in urls.iter().zip(bodies) {
        provider = provider.with_page(url, &page("/site.css", body));
    }

    let result = Deadcss::new(urls.clone()).analyze_with(&provider).unwrap();
    assert!(!result.rules.is_empty());

    let docs: Vec<Box<dyn Document>> = urls
        .iter()
        .map(|u| provider.fetch_and_parse(&Url::parse(u).unwrap()).ok().unwrap())
        .collect();

    for rule in &result.rules {
        let query = compile_query(&rule.selector).unwrap();
        let matched_somewhere = docs.iter().any(|d| d.query_first_match(&query).is_some());
        assert_eq!(
            matched_somewhere,
            rule.is_used(),
            "rule {} reported {}",
            rule.selector,
            if rule.is_used() { "used" } else { "unused" }
        );
    }

    let unused: Vec<&str> = result.unused().iter().map(|r| r.selector.as_str()).collect();
    assert_eq!(unused, vec![".list .btn", "input[type=\"radio\"]"]);
}

// Sorting: stylesheet first (inline first), then selector
#[test]
fn test_unused_report_sorted() {
    let provider = StaticProvider::new()
        .with_page(
            PAGE1,
            r#"<link rel="stylesheet" href="/b.css"><link rel="stylesheet" href="/a.css"><style>.zz {} .aa {}</style>"#,
        )
        .with_stylesheet("http://site.test/b.css", ".z {}")
        .with_stylesheet("http://site.test/a.css", ".b {} .a {}");

    let result = Deadcss::new([PAGE1]).analyze_with(&provider).unwrap();

    assert_eq!(
        plain_lines(&result),
        vec![
            "<inline>: .aa",
            "<inline>: .zz",
            "http://site.test/a.css: .a",
            "http://site.test/a.css: .b",
            "http://site.test/b.css: .z",
        ]
    );
}

// Repeated URLs are analyzed once
#[test]
fn test_duplicate_urls_analyzed_once() {
    let provider = StaticProvider::new()
        .with_page(PAGE1, &page("/site.css", r#"<p class="a"></p>"#))
        .with_stylesheet(SHEET, ".a {}");

    let result = Deadcss::new([PAGE1, "", PAGE1, " "]).analyze_with(&provider).unwrap();
    assert_eq!(result.urls, vec![PAGE1]);
    assert_eq!(result.pages.len(), 1);
}

fn setup_temp_site() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("deadcss_tests")
        .join(format!("{}_{}", std::process::id(), id));
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(dir.join("assets")).unwrap();
    dir
}

// Local files through the default provider
#[cfg(feature = "http")]
#[test]
fn test_local_site_end_to_end() {
    let dir = setup_temp_site();
    fs::write(
        dir.join("assets/site.css"),
        ".hero {} .hero__title:hover {} .legacy-banner {}",
    )
    .unwrap();
    fs::write(
        dir.join("index.html"),
        r#"<link rel="stylesheet" href="assets/site.css"><section class="hero"><h1 class="hero__title"></h1></section>"#,
    )
    .unwrap();
    fs::write(
        dir.join("about.html"),
        r#"<link rel="stylesheet" href="assets/site.css"><p>About</p>"#,
    )
    .unwrap();

    let index = dir.join("index.html").display().to_string();
    let about = Url::from_file_path(dir.join("about.html")).unwrap().to_string();
    let missing = dir.join("missing.html").display().to_string();

    let result = Deadcss::new([index, about, missing]).analyze().unwrap();

    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.failures.len(), 1);
    let unused: Vec<&str> = result.unused().iter().map(|r| r.selector.as_str()).collect();
    assert_eq!(unused, vec![".legacy-banner"]);

    fs::remove_dir_all(&dir).ok();
}
