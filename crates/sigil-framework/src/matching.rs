//! Name/alias matching.
//!
//! Every lookup in Sigil (prefixes, top-level commands, sub-commands) goes
//! through a [`TokenSet`]: a name plus aliases ordered longest first, with an
//! optional case-insensitive comparison. Keeping the order fixed at
//! construction means an alias that is a prefix of a longer token can never
//! shadow it.

use std::cmp::Reverse;

/// Compares two tokens, folding case when `ignore_case` is set.
pub fn token_eq(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
    } else {
        a == b
    }
}

/// Returns the rest of `text` if it starts with `prefix`.
pub fn strip_token_prefix<'a>(text: &'a str, prefix: &str, ignore_case: bool) -> Option<&'a str> {
    if !ignore_case {
        return text.strip_prefix(prefix);
    }

    let mut chars = text.char_indices();
    let mut end = 0;
    for expected in prefix.chars() {
        let (index, actual) = chars.next()?;
        if expected != actual && !expected.to_lowercase().eq(actual.to_lowercase()) {
            return None;
        }
        end = index + actual.len_utf8();
    }
    Some(&text[end..])
}

/// Checks whether `candidate` names the entity `name` / `aliases`.
///
/// Standalone form of [`TokenSet::matches`] for callers that don't keep a set.
pub fn matches(candidate: &str, name: &str, aliases: &[String], ignore_case: bool) -> bool {
    TokenSet::new(name, aliases.iter().cloned(), ignore_case).matches(candidate)
}

/// A name and its aliases, ordered longest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    tokens: Vec<String>,
    ignore_case: bool,
}

impl TokenSet {
    /// Builds the set. Equal-length tokens keep their given order, with the
    /// name ahead of the aliases.
    pub fn new(
        name: impl Into<String>,
        aliases: impl IntoIterator<Item = String>,
        ignore_case: bool,
    ) -> Self {
        let mut tokens: Vec<String> = std::iter::once(name.into()).chain(aliases).collect();
        tokens.sort_by_key(|t| Reverse(t.chars().count()));
        Self {
            tokens,
            ignore_case,
        }
    }

    /// Builds a set from a plain list (e.g. configured prefixes).
    pub fn from_list(list: impl IntoIterator<Item = String>, ignore_case: bool) -> Self {
        let mut tokens: Vec<String> = list.into_iter().collect();
        tokens.sort_by_key(|t| Reverse(t.chars().count()));
        Self {
            tokens,
            ignore_case,
        }
    }

    /// The tokens, longest first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether comparisons fold case.
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Length in chars of the longest token.
    pub fn longest(&self) -> usize {
        self.tokens.first().map_or(0, |t| t.chars().count())
    }

    /// Whether `candidate` equals one of the tokens.
    pub fn matches(&self, candidate: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| token_eq(t, candidate, self.ignore_case))
    }

    /// Strips the longest token `text` starts with.
    pub fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.tokens
            .iter()
            .find_map(|t| strip_token_prefix(text, t, self.ignore_case))
    }

    /// Strips the longest token that `text` starts with *as a whole word*:
    /// the token must be followed by whitespace or the end of the text.
    pub fn strip_word<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.tokens.iter().find_map(|t| {
            strip_token_prefix(text, t, self.ignore_case)
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        })
    }

    /// Returns the first token shared with `other`.
    ///
    /// Two tokens collide when they compare equal under either set's case
    /// rule, since a case-insensitive sibling would accept the other's input.
    pub fn conflict_with<'a>(&'a self, other: &TokenSet) -> Option<&'a str> {
        let ignore_case = self.ignore_case || other.ignore_case;
        self.tokens
            .iter()
            .find(|mine| other.tokens.iter().any(|t| token_eq(mine, t, ignore_case)))
            .map(String::as_str)
    }
}
