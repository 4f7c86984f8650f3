//! Case-insensitive text patterns and synonym sets.
//!
//! A [`SynonymSet`] is an ordered list of [`TextPattern`]s that all express one
//! intent ("dealer locator", "where to buy", ...). Order is priority: callers
//! try entries front to back and stop at the first one that matches.

use crate::result::{SleuthError, SleuthResult};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single case-insensitive text matcher
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Case-insensitive substring match
    Contains(String),
    /// Case-insensitive whole-string match (after trimming)
    Exact(String),
    /// Case-insensitive regular expression
    Regex(Regex),
}

impl TextPattern {
    /// Substring pattern
    #[must_use]
    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    /// Exact-text pattern
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Compile a case-insensitive regex pattern
    pub fn regex(source: &str) -> SleuthResult<Self> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|e| SleuthError::InvalidPattern {
                pattern: source.to_string(),
                message: e.to_string(),
            })
    }

    /// Alternation of literal phrases, e.g. `where to buy|dealer locator`
    pub fn any_of(phrases: &[&str]) -> SleuthResult<Self> {
        let source = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Self::regex(&source)
    }

    /// Test whether `text` matches
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Contains(needle) => contains_ignore_case(text, needle),
            Self::Exact(expected) => text.trim().eq_ignore_ascii_case(expected.trim()),
            Self::Regex(re) => re.is_match(text),
        }
    }

    /// Source form, used in diagnostics
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Contains(s) | Self::Exact(s) => s,
            Self::Regex(re) => re.as_str(),
        }
    }
}

impl fmt::Display for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(s) => write!(f, "~{s:?}"),
            Self::Exact(s) => write!(f, "={s:?}"),
            Self::Regex(re) => write!(f, "/{}/i", re.as_str()),
        }
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Contains(a), Self::Contains(b)) | (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Serialized form: a plain string is a substring pattern,
/// `{ regex: "..." }` or `{ exact: "..." }` select the other kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Plain(String),
    Regex { regex: String },
    Exact { exact: String },
}

impl Serialize for TextPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Self::Contains(s) => PatternRepr::Plain(s.clone()),
            Self::Exact(s) => PatternRepr::Exact { exact: s.clone() },
            Self::Regex(re) => PatternRepr::Regex {
                regex: re.as_str().to_string(),
            },
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextPattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PatternRepr::deserialize(deserializer)? {
            PatternRepr::Plain(s) => Ok(Self::Contains(s)),
            PatternRepr::Exact { exact } => Ok(Self::Exact(exact)),
            PatternRepr::Regex { regex } => Self::regex(&regex).map_err(serde::de::Error::custom),
        }
    }
}

/// Ordered, prioritized patterns for one semantic intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymSet {
    patterns: Vec<TextPattern>,
}

impl SynonymSet {
    /// Create from patterns in priority order
    #[must_use]
    pub fn new(patterns: Vec<TextPattern>) -> Self {
        Self { patterns }
    }

    /// Create from literal phrases, each a case-insensitive substring
    #[must_use]
    pub fn phrases(phrases: &[&str]) -> Self {
        Self::new(phrases.iter().map(|p| TextPattern::contains(*p)).collect())
    }

    /// Append a lower-priority pattern
    #[must_use]
    pub fn with(mut self, pattern: TextPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Patterns in priority order
    #[must_use]
    pub fn patterns(&self) -> &[TextPattern] {
        &self.patterns
    }

    /// First matching pattern index
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(text))
    }

    /// Number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl FromIterator<TextPattern> for SynonymSet {
    fn from_iter<I: IntoIterator<Item = TextPattern>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Case-insensitive substring test
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Collapse runs of whitespace into single spaces and trim
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
