//! Argument tokenizer.
//!
//! [`Arguments`] keeps both the raw trailing text of an invocation and its
//! whitespace-split tokens. Sub-command descent re-slices the raw text with
//! [`Arguments::rest`] so that the child sees exactly what followed its name.

use std::ops::Deref;

/// A single whitespace-delimited token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument(String);

impl Argument {
    /// The token as typed.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Parses the token as a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Parses the token as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }

    /// Interprets common yes/no spellings.
    pub fn as_bool(&self) -> Option<bool> {
        match self.0.to_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    /// Extracts the user id from a `<@id>` / `<@!id>` mention.
    pub fn as_user_mention(&self) -> Option<&str> {
        let inner = self.0.strip_prefix("<@")?.strip_suffix('>')?;
        let id = inner.strip_prefix('!').unwrap_or(inner);
        is_snowflake(id).then_some(id)
    }

    /// Extracts the channel id from a `<#id>` mention.
    pub fn as_channel_mention(&self) -> Option<&str> {
        let id = self.0.strip_prefix("<#")?.strip_suffix('>')?;
        is_snowflake(id).then_some(id)
    }
}

impl Deref for Argument {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_snowflake(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// The ordered tokens of an invocation plus the text they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    raw: String,
    tokens: Vec<Argument>,
}

impl Arguments {
    /// Tokenizes `raw` on whitespace. Surrounding whitespace is dropped from
    /// the stored raw text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            tokens: raw
                .split_whitespace()
                .map(|t| Argument(t.to_string()))
                .collect(),
        }
    }

    /// An empty argument list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The raw text the tokens were split from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token at `index`.
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.tokens.get(index)
    }

    /// The first token.
    pub fn first(&self) -> Option<&Argument> {
        self.tokens.first()
    }

    /// Iterates over the tokens in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.tokens.iter()
    }

    /// The arguments left after dropping the first `n` tokens.
    ///
    /// Works on the raw text, so spacing inside the remainder is preserved.
    pub fn rest(&self, n: usize) -> Self {
        let mut remaining = self.raw.as_str();
        for _ in 0..n {
            remaining = remaining.trim_start();
            remaining = match remaining.find(char::is_whitespace) {
                Some(end) => &remaining[end..],
                None => "",
            };
        }
        Self::parse(remaining)
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_any_whitespace() {
        let args = Arguments::parse("  set\tprefix \n !  ");
        assert_eq!(args.raw(), "set\tprefix \n !");
        let tokens: Vec<&str> = args.iter().map(Argument::raw).collect();
        assert_eq!(tokens, vec!["set", "prefix", "!"]);
    }

    #[test]
    fn test_empty() {
        let args = Arguments::parse("   ");
        assert!(args.is_empty());
        assert_eq!(args.raw(), "");
        assert!(args.first().is_none());
    }

    #[test]
    fn test_rest_preserves_inner_spacing() {
        let args = Arguments::parse("say hello   world");
        let rest = args.rest(1);
        assert_eq!(rest.raw(), "hello   world");
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_rest_past_end_is_empty() {
        let args = Arguments::parse("only");
        assert!(args.rest(1).is_empty());
        assert!(args.rest(5).is_empty());
    }

    #[test]
    fn test_typed_accessors() {
        let args = Arguments::parse("42 2.5 yes <@!123> <#456> <@abc>");
        assert_eq!(args.get(0).and_then(Argument::as_i64), Some(42));
        assert_eq!(args.get(1).and_then(Argument::as_f64), Some(2.5));
        assert_eq!(args.get(2).and_then(Argument::as_bool), Some(true));
        assert_eq!(args.get(3).and_then(Argument::as_user_mention), Some("123"));
        assert_eq!(
            args.get(4).and_then(Argument::as_channel_mention),
            Some("456")
        );
        assert_eq!(args.get(5).and_then(Argument::as_user_mention), None);
    }
}
