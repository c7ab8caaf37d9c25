use std::fmt;

use serde::{Deserialize, Serialize};

/// The value side of a leaf rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// A boolean, used by boolean fields and by `exists` / `!exists`.
    Bool(bool),
    /// A scalar literal with quotes removed. Regex literals keep their
    /// `/.../` delimiters and flags.
    Text(String),
    /// The items of an `IN` list.
    List(Vec<String>),
}

impl RuleValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuleValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            RuleValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a regex literal such as `/ab+c/` or `/ab+c/i`.
    #[must_use]
    pub fn is_regex(&self) -> bool {
        self.as_text().is_some_and(is_regex_literal)
    }
}

/// Whether `s` has the shape of a regex literal: `/pattern/` or `/pattern/i`
/// with a non-empty pattern.
#[must_use]
pub fn is_regex_literal(s: &str) -> bool {
    let body = s.strip_suffix('i').unwrap_or(s);
    body.len() > 2 && body.starts_with('/') && body.ends_with('/') && !body.ends_with("\\/")
}

impl From<bool> for RuleValue {
    fn from(v: bool) -> Self {
        RuleValue::Bool(v)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::Text(v.to_owned())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::Text(v)
    }
}

impl From<Vec<String>> for RuleValue {
    fn from(v: Vec<String>) -> Self {
        RuleValue::List(v)
    }
}

impl From<&[&str]> for RuleValue {
    fn from(v: &[&str]) -> Self {
        RuleValue::List(v.iter().map(|&s| s.to_owned()).collect())
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Bool(v) => write!(f, "{v}"),
            RuleValue::Text(v) => write!(f, "{v}"),
            RuleValue::List(items) => write!(f, "({})", items.join(", ")),
        }
    }
}
