use thiserror::Error;

use crate::parse::ParseError;
use crate::types::{CompileError, SpecError};

/// Unified error type covering spec loading, parsing, compilation and I/O.
///
/// Returned by the [`Bql`](crate::Bql) convenience methods that span more
/// than one stage, such as [`Bql::from_spec_file`](crate::Bql::from_spec_file)
/// and [`Bql::compile_text`](crate::Bql::compile_text).
#[derive(Debug, Error)]
pub enum BqlError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid ruleset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no ruleset supplied")]
    NullArgument,
}
