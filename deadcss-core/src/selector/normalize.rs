//! Pseudo-class stripping and query compilation.
//!
//! Interaction states (`:hover`, `:focus`, `:active`) and generated content
//! (`::before`, `::after`) can never be observed by a static DOM existence
//! query. They are removed so that `.btn:hover` counts as used whenever a
//! `.btn` element exists.

use crate::error::{DeadcssError, DeadcssResult};

/// Substrings removed from a selector before querying, longest form first.
pub const STRIPPED_PSEUDOS: &[&str] = &[
    "::after", ":after", "::before", ":before", ":active", ":focus", ":hover",
];

/// Remove every [`STRIPPED_PSEUDOS`] substring (case-sensitive, literal).
///
/// Removal repeats until nothing changes, so a removal that splices a new
/// match together (`:ho:activever`) is also cleaned and
/// `normalize(normalize(s)) == normalize(s)` holds.
pub fn normalize(selector: &str) -> String {
    let mut current = selector.to_string();
    loop {
        let mut next = current.clone();
        for pseudo in STRIPPED_PSEUDOS {
            if next.contains(pseudo) {
                next = next.replace(pseudo, "");
            }
        }
        if next == current {
            return next.trim().to_string();
        }
        current = next;
    }
}

/// A selector compiled for DOM matching, with the text it was built from.
#[derive(Debug, Clone)]
pub struct QuerySelector {
    text: String,
    compiled: scraper::Selector,
}

impl QuerySelector {
    /// The normalized text this query was compiled from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn compiled(&self) -> &scraper::Selector {
        &self.compiled
    }
}

/// Normalize `selector` and compile the result into a [`QuerySelector`].
///
/// Fails with [`DeadcssError::Selector`] when the normalized text is empty
/// or uses syntax the matcher does not understand (vendor pseudo-elements,
/// unsupported pseudo-classes).
pub fn compile_query(selector: &str) -> DeadcssResult<QuerySelector> {
    let text = normalize(selector);
    if text.is_empty() {
        return Err(DeadcssError::selector(selector, "nothing left to match after normalization"));
    }
    let compiled = scraper::Selector::parse(&text)
        .map_err(|e| DeadcssError::selector(selector, e.to_string()))?;
    Ok(QuerySelector { text, compiled })
}
