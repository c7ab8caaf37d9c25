use thiserror::Error;

/// Errors raised while building a [`FieldSpecRegistry`](super::FieldSpecRegistry)
/// from a field-spec resource.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("unknown field type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("unknown operator '{token}' for field '{field}'")]
    UnknownOperator { field: String, token: String },

    #[error("unknown operator '{token}' in operator map for type '{type_name}'")]
    UnknownMappedOperator { type_name: String, token: String },

    #[error("field spec declares no fields")]
    NoFields,

    #[error("invalid field name '{name}'")]
    InvalidFieldName { name: String },

    #[error("field '{name}' collides with the default full-text field")]
    ReservedFieldName { name: String },

    #[error("invalid field spec JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot build tokenizer for field names: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while lowering a [`Ruleset`](super::Ruleset) into the query DSL.
///
/// Parsed rulesets are already validated, so these only occur for trees that
/// were built by hand or deserialized from the interchange format.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("operator '{operator}' on field '{field}' requires {expected}")]
    ValueShape {
        field: String,
        operator: String,
        expected: &'static str,
    },

    #[error("'{value}' is not a number (field '{field}')")]
    InvalidNumber { field: String, value: String },

    #[error("'{value}' is not a date (field '{field}')")]
    InvalidDate { field: String, value: String },

    #[error("invalid regex literal '{literal}'")]
    InvalidRegex { literal: String },

    #[error("group has no rules")]
    EmptyGroup,
}
