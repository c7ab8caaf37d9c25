use thiserror::Error;

use crate::types::{FieldType, Operator};

/// Errors produced when tokenizing or parsing BQL text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at offset {offset}: unexpected '{fragment}'")]
    Syntax { offset: usize, fragment: String },

    #[error("query is empty")]
    Empty,

    #[error("unexpected token '{token}' at index {index}")]
    Unconsumed { index: usize, token: String },

    #[error("incomplete query: expected more after index {index}")]
    Incomplete { index: usize },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("operator '{operator}' is not permitted for field '{field}'")]
    OperatorNotAllowed { field: String, operator: Operator },

    #[error("invalid value '{value}' for {field_type} field '{field}'")]
    InvalidValue {
        field: String,
        field_type: FieldType,
        value: String,
    },

    #[error("missing value after '{operator}' on field '{field}'")]
    MissingValue { field: String, operator: Operator },

    #[error("malformed quoted literal {literal}")]
    MalformedLiteral { literal: String },

    #[error("invalid regex literal {literal}: {reason}")]
    InvalidRegex { literal: String, reason: String },

    #[error("cyclic named query reference: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("parentheses nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("in named query '{name}': {source}")]
    NamedQuery {
        name: String,
        #[source]
        source: Box<ParseError>,
    },
}
