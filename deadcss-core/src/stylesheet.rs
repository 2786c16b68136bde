//! Stylesheet rule trees.
//!
//! Only selectors matter for usage tracking, so the parser keeps style rule
//! preludes and the nesting structure of grouping at-rules and skips every
//! declaration block. Grouping at-rules (`@media`, `@supports`, `@layer`, ...)
//! are walked recursively at any depth; other at-rules (`@keyframes`,
//! `@font-face`, `@import`, ...) contribute no selectors.

/// At-rules whose block contains further rules rather than declarations.
const GROUPING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "layer",
    "container",
    "document",
    "-moz-document",
    "scope",
    "starting-style",
];

/// A node in a stylesheet's rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleNode {
    /// A style rule; `selector` is the raw prelude (possibly a selector list)
    Style { selector: String },
    /// A grouping at-rule with nested rules
    Group {
        name: String,
        prelude: String,
        children: Vec<RuleNode>,
    },
    /// Any other at-rule, kept for diagnostics only
    Other { name: String },
}

/// A parsed stylesheet attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    /// URL the stylesheet was loaded from, `None` for inline `<style>`
    pub origin: Option<String>,
    /// Top-level rules in source order
    pub rules: Vec<RuleNode>,
}

impl Stylesheet {
    /// Parse stylesheet text.
    pub fn parse(origin: Option<String>, css: &str) -> Self {
        Self {
            origin,
            rules: parse_rules(css),
        }
    }

    /// All style rule preludes in source order, flattened across grouping
    /// at-rules regardless of depth.
    pub fn style_rules(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_style_rules(&self.rules, &mut out);
        out
    }
}

fn collect_style_rules<'a>(nodes: &'a [RuleNode], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            RuleNode::Style { selector } => out.push(selector),
            RuleNode::Group { children, .. } => collect_style_rules(children, out),
            RuleNode::Other { .. } => {}
        }
    }
}

/// Parse CSS text into a rule tree.
pub fn parse_rules(css: &str) -> Vec<RuleNode> {
    let stripped = strip_comments(css);
    let mut parser = RuleParser {
        src: &stripped,
        pos: 0,
    };
    parser.parse_list(false)
}

/// Remove `/* ... */` comments outside of strings. An unterminated comment
/// runs to the end of input.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == '\\' {
                    if let Some(n) = chars.next() {
                        out.push(n);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '/' && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                // Comments separate tokens
                out.push(' ');
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

struct RuleParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> RuleParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// `<!--` and `-->` are ignored between top-level rules.
    fn skip_html_comment_token(&mut self) -> bool {
        let src = self.src;
        let rest = &src[self.pos..];
        for token in ["<!--", "-->"] {
            if rest.starts_with(token) {
                self.pos += token.len();
                return true;
            }
        }
        false
    }

    /// Parse rules until end of input, or until the closing `}` of the
    /// enclosing block when `nested`.
    fn parse_list(&mut self, nested: bool) -> Vec<RuleNode> {
        let mut rules = Vec::new();
        loop {
            self.skip_whitespace();
            if !nested && self.skip_html_comment_token() {
                continue;
            }
            match self.peek() {
                None => break,
                Some(b'}') => {
                    self.pos += 1;
                    if nested {
                        break;
                    }
                    // Stray closing brace at top level
                }
                Some(b';') => self.pos += 1,
                Some(b'@') => {
                    self.pos += 1;
                    if let Some(rule) = self.parse_at_rule() {
                        rules.push(rule);
                    }
                }
                Some(_) => match self.read_prelude() {
                    (prelude, Some(b'{')) => {
                        self.skip_block();
                        let selector = prelude.trim();
                        if !selector.is_empty() {
                            rules.push(RuleNode::Style {
                                selector: selector.to_string(),
                            });
                        }
                    }
                    // `;` without a block is invalid; dropped
                    (_, Some(_)) => {}
                    (_, None) => break,
                },
            }
        }
        rules
    }

    fn parse_at_rule(&mut self) -> Option<RuleNode> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            self.pos += 1;
        }
        let name = self.src[start..self.pos].to_ascii_lowercase();

        match self.read_prelude() {
            (prelude, Some(b'{')) => {
                if GROUPING_AT_RULES.contains(&name.as_str()) {
                    let children = self.parse_list(true);
                    Some(RuleNode::Group {
                        name,
                        prelude: prelude.trim().to_string(),
                        children,
                    })
                } else {
                    self.skip_block();
                    Some(RuleNode::Other { name })
                }
            }
            (_, Some(_)) => Some(RuleNode::Other { name }),
            (_, None) => None,
        }
    }

    /// Read up to a top-level `{`, `;` or `}`; the terminator is consumed
    /// except for `}` which belongs to the enclosing block.
    fn read_prelude(&mut self) -> (&'a str, Option<u8>) {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(&b) = bytes.get(self.pos) {
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == q {
                    quote = None;
                }
                self.pos += 1;
                continue;
            }
            match b {
                b'\\' => self.pos += 1,
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'{' | b';' if depth == 0 => {
                    let prelude = &self.src[start..self.pos];
                    self.pos += 1;
                    return (prelude, Some(b));
                }
                b'}' if depth == 0 => return (&self.src[start..self.pos], Some(b)),
                _ => {}
            }
            self.pos += 1;
        }
        self.pos = bytes.len();
        (&self.src[start..], None)
    }

    /// Skip the remainder of a block whose `{` was already consumed.
    fn skip_block(&mut self) {
        let bytes = self.src.as_bytes();
        let mut depth = 1usize;
        let mut quote: Option<u8> = None;

        while let Some(&b) = bytes.get(self.pos) {
            self.pos += 1;
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'\\' => self.pos += 1,
                b'"' | b'\'' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
        self.pos = self.pos.min(bytes.len());
    }
}
