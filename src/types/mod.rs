mod error;
mod field_registry;
mod field_spec;
mod operator;
mod ruleset;
mod value;

pub use error::{CompileError, SpecError};
pub use field_registry::{default_operators, FieldSpecRegistry, DEFAULT_FULL_TEXT_FIELD};
pub use field_spec::{FieldSpec, FieldType, SpecDocument};
pub use operator::Operator;
pub use ruleset::{field, Condition, FieldRule, Group, Rule, Ruleset};
pub use value::{is_regex_literal, RuleValue};
