//! A boolean query language (BQL) engine for document search.
//!
//! Query text such as `(sign = aries & isAlive = true) | fname CONTAINS bob`
//! is tokenized and parsed into a [`Ruleset`] tree, which can be rendered back
//! to canonical text or compiled into an Elasticsearch-compatible boolean
//! query DSL document.
//!
//! Field names, types and permitted operators come from a per-domain field
//! spec loaded into a [`FieldSpecRegistry`]. Upper-case identifiers in query
//! text refer to stored named queries and are expanded at parse time through a
//! [`NamedQueryResolver`].

pub mod compile;
pub mod date;
mod engine;
mod error;
pub mod parse;
pub mod render;
pub mod resolve;
mod types;

pub use engine::Bql;
pub use error::BqlError;
pub use parse::{ParseError, Tokenizer};
pub use resolve::{MapResolver, NamedQuery, NamedQueryResolver, NoResolver};
pub use types::{
    default_operators, field, CompileError, Condition, FieldRule, FieldSpec, FieldSpecRegistry,
    FieldType, Group, Operator, Rule, RuleValue, Ruleset, SpecDocument, SpecError,
    DEFAULT_FULL_TEXT_FIELD,
};
