//! URL pattern matching.
//!
//! # Responsibilities
//! - Compile shell-style glob patterns once, at table build time
//! - Match a handler path against a compiled pattern
//!
//! # Design Decisions
//! - fnmatch semantics without flags: `*` also crosses `/`, no special
//!   treatment of leading dots
//! - Matching is case-sensitive
//! - No regex; iterative matcher with single-star backtracking, O(n·m) worst case
//! - Malformed classes (`[` without `]`) match a literal `[`
//! - A pattern ending in a lone `\` matches nothing, as with `fnmatch`

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    /// `?`
    AnyChar,
    /// `*`
    AnyRun,
    /// `[...]` / `[!...]` / `[^...]`
    Class { negated: bool, items: Vec<ClassItem> },
    /// Trailing `\` with nothing to escape.
    DanglingEscape,
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::AnyRun => true,
            Token::Class { negated, items } => {
                let hit = items.iter().any(|item| match *item {
                    ClassItem::Char(x) => x == c,
                    ClassItem::Range(lo, hi) => lo <= c && c <= hi,
                });
                hit != *negated
            }
            Token::DanglingEscape => false,
        }
    }
}

/// A compiled glob pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct GlobPattern {
    source: String,
    tokens: Vec<Token>,
}

impl GlobPattern {
    /// Compile a pattern. Every input compiles; a malformed one may simply
    /// never match.
    pub fn new(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let tokens = compile(&source);
        Self { source, tokens }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `path` matches this pattern.
    ///
    /// Walks `path` by byte offset so matching never allocates.
    pub fn matches(&self, path: &str) -> bool {
        let tokens = &self.tokens;

        let (mut p, mut t) = (0, 0);
        // Position of the last `*` and the byte offset it currently absorbs up to.
        let mut backtrack: Option<(usize, usize)> = None;

        while let Some(c) = path[t..].chars().next() {
            if p < tokens.len() {
                if tokens[p] == Token::AnyRun {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                if tokens[p].matches(c) {
                    p += 1;
                    t += c.len_utf8();
                    continue;
                }
            }
            match backtrack {
                Some((star, absorbed)) => {
                    let skipped = path[absorbed..].chars().next().map_or(1, char::len_utf8);
                    p = star + 1;
                    t = absorbed + skipped;
                    backtrack = Some((star, t));
                }
                None => return false,
            }
        }

        while p < tokens.len() && tokens[p] == Token::AnyRun {
            p += 1;
        }
        p == tokens.len()
    }
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobPattern").field(&self.source).finish()
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Consecutive stars are equivalent to one.
                if tokens.last() != Some(&Token::AnyRun) {
                    tokens.push(Token::AnyRun);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::AnyChar);
                i += 1;
            }
            '[' => match compile_class(&chars, i + 1) {
                Some((token, next)) => {
                    tokens.push(token);
                    i = next;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            '\\' => match chars.get(i + 1) {
                Some(&escaped) => {
                    tokens.push(Token::Literal(escaped));
                    i += 2;
                }
                None => {
                    tokens.push(Token::DanglingEscape);
                    i += 1;
                }
            },
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    tokens
}

/// Parse a bracket expression starting just after `[`.
/// Returns the token and the index after the closing `]`, or `None` if unterminated.
fn compile_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut items = Vec::new();
    let mut first = true;
    loop {
        let c = *chars.get(i)?;
        // A `]` right after the opening bracket is a member, not the terminator.
        if c == ']' && !first {
            return Some((Token::Class { negated, items }, i + 1));
        }
        first = false;

        let c = if c == '\\' {
            i += 1;
            *chars.get(i)?
        } else {
            c
        };

        if chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&n| n != ']') {
            let hi = match chars[i + 2] {
                '\\' => {
                    i += 1;
                    *chars.get(i + 2)?
                }
                n => n,
            };
            items.push(ClassItem::Range(c, hi));
            i += 3;
        } else {
            items.push(ClassItem::Char(c));
            i += 1;
        }
    }
}
