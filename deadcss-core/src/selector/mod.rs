//! Selector lists and their decomposition into atomic selectors.
//!
//! A style rule's prelude such as `.a, .b > .c` is a *list* of selectors.
//! Usage is tracked per atomic selector (no top-level comma), so every list
//! is flattened before registration:
//!
//! ```text
//! ".a, .b > .c"  ──parse_selector──▶  List([Atomic(".a"), Atomic(".b > .c")])
//!                ──atoms()─────────▶  ".a", ".b > .c"
//! ```
//!
//! Commas nested inside functional pseudo-classes (`:is(.a, .b)`), attribute
//! values (`[title="a,b"]`) or escaped with a backslash are not list
//! separators.

pub mod normalize;

pub use normalize::{compile_query, normalize, QuerySelector};

/// A parsed selector: either a single atomic selector or a list of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// One selector with no top-level comma, stored in canonical text form
    Atomic(String),
    /// A comma-joined group; members may themselves be lists
    List(Vec<Selector>),
}

impl Selector {
    /// Lazily iterate the atomic selectors in source order.
    ///
    /// Nested lists are flattened depth-first. The iterator borrows the
    /// selector, so calling `atoms()` again restarts the sequence.
    pub fn atoms(&self) -> Atoms<'_> {
        Atoms { stack: vec![self] }
    }

    /// Number of atomic selectors contained.
    pub fn atom_count(&self) -> usize {
        match self {
            Selector::Atomic(_) => 1,
            Selector::List(items) => items.iter().map(Selector::atom_count).sum(),
        }
    }
}

/// Depth-first iterator over the atomic selectors of a [`Selector`].
#[derive(Debug, Clone)]
pub struct Atoms<'a> {
    stack: Vec<&'a Selector>,
}

impl<'a> Iterator for Atoms<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(sel) = self.stack.pop() {
            match sel {
                Selector::Atomic(text) => return Some(text.as_str()),
                // Reversed so the first member is popped first
                Selector::List(items) => self.stack.extend(items.iter().rev()),
            }
        }
        None
    }
}

/// Decompose a selector into its atomic selectors, in source order.
pub fn decompose(selector: &Selector) -> Vec<&str> {
    selector.atoms().collect()
}

/// Parse a selector list prelude into a [`Selector`].
///
/// A prelude without a top-level comma yields `Atomic`; otherwise a `List`
/// of atomic members. Empty members (`.a,,.b`) are dropped. Returns `None`
/// when nothing but whitespace and commas is present.
pub fn parse_selector(text: &str) -> Option<Selector> {
    let mut parts: Vec<Selector> = split_top_level(text, ',')
        .into_iter()
        .map(canonicalize)
        .filter(|s| !s.is_empty())
        .map(Selector::Atomic)
        .collect();

    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(Selector::List(parts)),
    }
}

/// Split `text` on `delim` where it appears outside brackets, parentheses,
/// quoted strings and escapes.
pub(crate) fn split_top_level(text: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            },
            _ if quote.is_some() => {}
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if c == delim && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Trim and collapse whitespace runs outside quoted strings to one space.
///
/// Two spellings of the same selector (`.a   > .b` and `.a > .b`) must map
/// to the same registry identity.
pub(crate) fn canonicalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut pending_space = false;

    for c in text.trim().chars() {
        if quote.is_none() && !escaped && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);

        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' || c == '\'' {
            match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            }
        }
    }
    out
}
