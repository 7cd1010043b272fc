//! SQL `LIKE` patterns compiled to anchored regular expressions.

use std::fmt;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use super::Operator;
use crate::error::{Result, WhereError};

/// A SQL `LIKE` pattern.
///
/// `%` matches any substring (including the empty one), `_` matches exactly
/// one character and a backslash makes the next character literal. The match
/// covers the whole text. Compiled regexes are cached per case sensitivity.
#[derive(Clone, Default)]
pub struct LikePattern {
    source: String,
    sensitive: OnceLock<Regex>,
    insensitive: OnceLock<Regex>,
}

impl LikePattern {
    /// Creates a pattern from its SQL source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sensitive: OnceLock::new(),
            insensitive: OnceLock::new(),
        }
    }

    /// Creates the pattern a literal-text operator stands for.
    ///
    /// `startsWith`, `endsWith` and `substring` escape wildcards in `text`
    /// before adding their own; every other operator uses `text` verbatim.
    #[must_use]
    pub fn for_operator(op: Operator, text: &str) -> Self {
        match op {
            Operator::StartsWith => Self::new(format!("{}%", escape(text))),
            Operator::EndsWith => Self::new(format!("%{}", escape(text))),
            Operator::Substring => Self::new(format!("%{}%", escape(text))),
            _ => Self::new(text),
        }
    }

    /// Returns the SQL source of the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Tests `text` against the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`WhereError::InvalidPattern`] if the translated regex exceeds
    /// the regex engine's limits.
    pub fn is_match(&self, text: &str, case_insensitive: bool) -> Result<bool> {
        Ok(self.regex(case_insensitive)?.is_match(text))
    }

    fn regex(&self, case_insensitive: bool) -> Result<&Regex> {
        let cell = if case_insensitive {
            &self.insensitive
        } else {
            &self.sensitive
        };
        if let Some(regex) = cell.get() {
            return Ok(regex);
        }
        let compiled = RegexBuilder::new(&translate(&self.source))
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| WhereError::InvalidPattern {
                pattern: self.source.clone(),
                source,
            })?;
        Ok(cell.get_or_init(|| compiled))
    }
}

impl fmt::Debug for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LikePattern").field(&self.source).finish()
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl From<&str> for LikePattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

/// Escapes `%`, `_` and `\` so `text` matches only itself.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    let mut chars = pattern.chars();
    let mut buf = [0_u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                // A trailing backslash matches itself.
                let literal = chars.next().unwrap_or('\\');
                out.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(pattern: &str, text: &str) -> bool {
        LikePattern::new(pattern).is_match(text, false).unwrap()
    }

    #[test]
    fn test_percent_matches_any_suffix() {
        assert!(like("Boat%", "Boat-abc"));
        assert!(like("Boat%", "Boat"));
        assert!(!like("Boat%", "abc-Boat-123"));
    }

    #[test]
    fn test_percent_on_both_sides() {
        assert!(like("%boat%", "abc-boat-123"));
        assert!(!like("%boat%", "abc-Boat-123"));
    }

    #[test]
    fn test_underscore_matches_one_char() {
        assert!(like("B_at", "Boat"));
        assert!(!like("B_at", "Bat"));
        assert!(!like("B_at", "Booat"));
    }

    #[test]
    fn test_case_insensitive() {
        let pattern = LikePattern::new("Boat%");
        assert!(!pattern.is_match("boat-abc", false).unwrap());
        assert!(pattern.is_match("boat-abc", true).unwrap());
        // Both cached regexes stay independent.
        assert!(!pattern.is_match("boat-abc", false).unwrap());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(like("a.c", "a.c"));
        assert!(!like("a.c", "abc"));
        assert!(like("(x)+%", "(x)+y"));
    }

    #[test]
    fn test_backslash_escapes_wildcards() {
        assert!(like(r"100\%", "100%"));
        assert!(!like(r"100\%", "1000"));
        assert!(like(r"a\_b", "a_b"));
        assert!(!like(r"a\_b", "axb"));
    }

    #[test]
    fn test_multibyte_and_newlines() {
        assert!(like("这个%", "这个是应该被选中的。"));
        assert!(like("a%b", "a\nb"));
    }

    #[test]
    fn test_literal_operators_escape_wildcards() {
        let starts = LikePattern::for_operator(Operator::StartsWith, "50%");
        assert_eq!(starts.as_str(), r"50\%%");
        assert!(starts.is_match("50% off", false).unwrap());
        assert!(!starts.is_match("500 off", false).unwrap());

        let ends = LikePattern::for_operator(Operator::EndsWith, "_x");
        assert!(ends.is_match("a_x", false).unwrap());
        assert!(!ends.is_match("ax", false).unwrap());

        let inner = LikePattern::for_operator(Operator::Substring, "oat");
        assert!(inner.is_match("Boat-abc", false).unwrap());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r"a%b_c\d"), r"a\%b\_c\\d");
    }
}
