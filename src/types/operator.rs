use std::fmt;

use serde::{Deserialize, Serialize};

/// Operators of a leaf rule, as stored in the AST.
///
/// `!EXISTS` has no variant of its own: it is [`Operator::Exists`] with a
/// `false` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "!contains")]
    NotContains,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "!like")]
    NotLike,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "!in")]
    NotIn,
    #[serde(rename = "exists")]
    Exists,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::NotContains,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Exists,
    ];

    /// Interpret a surface token such as `>=`, `contains` or `!IN`.
    ///
    /// Keywords are case-insensitive. Both `EXISTS` and `!EXISTS` map to
    /// [`Operator::Exists`]; callers tell them apart by the leading `!`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Operator> {
        if token.eq_ignore_ascii_case("!exists") {
            return Some(Operator::Exists);
        }
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(token))
    }

    /// The lower-case name used in the AST interchange format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::NotContains => "!contains",
            Operator::Like => "like",
            Operator::NotLike => "!like",
            Operator::In => "in",
            Operator::NotIn => "!in",
            Operator::Exists => "exists",
        }
    }

    /// The canonical BQL spelling.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Operator::Contains => "CONTAINS",
            Operator::NotContains => "!CONTAINS",
            Operator::Like => "LIKE",
            Operator::NotLike => "!LIKE",
            Operator::In => "IN",
            Operator::NotIn => "!IN",
            Operator::Exists => "EXISTS",
            other => other.as_str(),
        }
    }

    /// Whether the operator carries a literal `!` prefix.
    #[must_use]
    pub fn is_negated(self) -> bool {
        self.as_str().starts_with('!')
    }

    /// The operator with its `!` prefix removed.
    #[must_use]
    pub fn positive(self) -> Operator {
        match self {
            Operator::Neq => Operator::Eq,
            Operator::NotContains => Operator::Contains,
            Operator::NotLike => Operator::Like,
            Operator::NotIn => Operator::In,
            other => other,
        }
    }

    /// The `!`-prefixed counterpart, if there is one.
    #[must_use]
    pub fn negated(self) -> Option<Operator> {
        match self {
            Operator::Eq => Some(Operator::Neq),
            Operator::Contains => Some(Operator::NotContains),
            Operator::Like => Some(Operator::NotLike),
            Operator::In => Some(Operator::NotIn),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_range(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }

    #[must_use]
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    #[must_use]
    pub fn is_text_match(self) -> bool {
        matches!(
            self.positive(),
            Operator::Contains | Operator::Like
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
