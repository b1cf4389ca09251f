//! Glob-style name matching (`*` matches any run, `?` matches one character).
//!
//! Used for layer patterns such as `"F.*"` and for string literals in rule
//! conditions. Matching is case-sensitive. A [`Pattern`] is compiled once
//! when it is built; matching never recompiles.

use std::fmt;

use globset::{Glob, GlobMatcher};
use log::debug;

/// True when `text` contains a wildcard metacharacter.
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?'])
}

/// A name pattern with its matcher built up front.
///
/// Text without `*` or `?` is a literal and only matches itself, as does
/// text that is not a valid glob.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl Pattern {
    pub fn new(source: &str) -> Self {
        let matcher = if has_wildcard(source) {
            match Glob::new(source) {
                Ok(glob) => Some(glob.compile_matcher()),
                Err(e) => {
                    debug!("'{source}' is not a valid glob ({e}); matching literally");
                    None
                }
            }
        } else {
            None
        };
        Self {
            source: source.to_string(),
            matcher,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_literal(&self) -> bool {
        self.matcher.is_none()
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Some(m) => m.is_match(text),
            None => self.source == text,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::new(source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
