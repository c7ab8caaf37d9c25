use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::error::SpecError;
use super::field_spec::{FieldType, SpecDocument};
use super::operator::Operator;

/// Full-text field used when a spec does not name one.
pub const DEFAULT_FULL_TEXT_FIELD: &str = "_all";

const DEFAULT_DOMAIN: &str = "default";

/// Derived per-field facts.
#[derive(Debug, Clone)]
struct FieldEntry {
    field_type: FieldType,
    operators: BTreeSet<Operator>,
    ci_field: Option<String>,
    options: Vec<String>,
}

/// Lookup tables derived from a field-spec resource.
///
/// Built once; afterwards immutable and safe to share across threads. The
/// tokenizer, parser and compiler all read field names, types, permitted
/// operators and case-insensitive keyword subfields from here.
#[derive(Debug, Clone)]
pub struct FieldSpecRegistry {
    domain: String,
    default_field: String,
    fields: HashMap<String, FieldEntry>,
}

impl FieldSpecRegistry {
    /// Build the registry from a parsed resource.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] for unknown types or operator tokens, empty field
    /// tables, or field names that cannot be used in a query.
    pub fn from_document(doc: &SpecDocument) -> Result<Self, SpecError> {
        if doc.fields.is_empty() {
            return Err(SpecError::NoFields);
        }

        let mut type_defaults: HashMap<FieldType, BTreeSet<Operator>> = HashMap::new();
        for (type_name, tokens) in &doc.operator_map {
            let field_type: FieldType = type_name.parse()?;
            let ops = tokens
                .iter()
                .map(|token| {
                    Operator::from_token(token).ok_or_else(|| SpecError::UnknownMappedOperator {
                        type_name: type_name.clone(),
                        token: token.clone(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            type_defaults.insert(field_type, ops);
        }

        let default_field = doc
            .default_field
            .clone()
            .unwrap_or_else(|| DEFAULT_FULL_TEXT_FIELD.to_owned());

        let mut fields = HashMap::with_capacity(doc.fields.len());
        for (name, spec) in &doc.fields {
            if !is_field_name(name) {
                return Err(SpecError::InvalidFieldName { name: name.clone() });
            }
            if *name == default_field {
                return Err(SpecError::ReservedFieldName { name: name.clone() });
            }

            let field_type: FieldType = spec.field_type.parse()?;
            let operators = match &spec.operators {
                Some(tokens) => tokens
                    .iter()
                    .map(|token| {
                        Operator::from_token(token).ok_or_else(|| SpecError::UnknownOperator {
                            field: name.clone(),
                            token: token.clone(),
                        })
                    })
                    .collect::<Result<BTreeSet<_>, _>>()?,
                None => type_defaults
                    .get(&field_type)
                    .cloned()
                    .unwrap_or_else(|| default_operators(field_type)),
            };

            let ci_field = spec
                .ci_field
                .clone()
                .or_else(|| spec.has_ci_keyword.then(|| format!("{name}.ci_keyword")));

            fields.insert(
                name.clone(),
                FieldEntry {
                    field_type,
                    operators: pair_text_operators(operators),
                    ci_field,
                    options: spec.options.clone(),
                },
            );
        }

        let domain = doc
            .domain
            .clone()
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_owned());
        debug!(
            domain = %domain,
            fields = fields.len(),
            default_field = %default_field,
            "built field spec registry"
        );

        Ok(Self {
            domain,
            default_field,
            fields,
        })
    }

    /// Parse a JSON resource and build the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Json`] for malformed JSON, otherwise as
    /// [`from_document`](Self::from_document).
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let doc: SpecDocument = serde_json::from_str(json)?;
        Self::from_document(&doc)
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn is_valid_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Operators accepted after `field`, or `None` for unknown fields.
    #[must_use]
    pub fn allowed_operators(&self, field: &str) -> Option<&BTreeSet<Operator>> {
        self.fields.get(field).map(|entry| &entry.operators)
    }

    #[must_use]
    pub fn allows(&self, field: &str, operator: Operator) -> bool {
        self.allowed_operators(field)
            .is_some_and(|ops| ops.contains(&operator))
    }

    #[must_use]
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).map(|entry| entry.field_type)
    }

    /// The lower-cased keyword subfield declared for `field`, if any.
    #[must_use]
    pub fn ci_keyword_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|entry| entry.ci_field.as_deref())
    }

    /// Advisory category values.
    #[must_use]
    pub fn options(&self, field: &str) -> &[String] {
        self.fields
            .get(field)
            .map_or(&[][..], |entry| entry.options.as_slice())
    }

    #[must_use]
    pub fn default_full_text_field(&self) -> &str {
        &self.default_field
    }

    /// The exact-value keyword subfield of `field`.
    #[must_use]
    pub fn keyword_field(&self, field: &str) -> String {
        format!("{field}.keyword")
    }

    /// Keyword subfields searched by full-text regex queries, sorted.
    #[must_use]
    pub fn full_text_keyword_fields(&self) -> Vec<String> {
        let mut names: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, entry)| entry.field_type == FieldType::String)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names.into_iter().map(|n| self.keyword_field(n)).collect()
    }

    /// All valid field names, sorted.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Operators assumed for a type when neither the field nor the operator map
/// lists any.
#[must_use]
pub fn default_operators(field_type: FieldType) -> BTreeSet<Operator> {
    use Operator::*;
    let ops: &[Operator] = match field_type {
        FieldType::String => &[
            Eq,
            Neq,
            Contains,
            NotContains,
            Like,
            NotLike,
            In,
            NotIn,
            Exists,
        ],
        FieldType::Category => &[Eq, Neq, In, NotIn, Exists],
        FieldType::Boolean => &[Eq, Neq],
        FieldType::Date => &[Eq, Neq, Gt, Gte, Lt, Lte, Exists],
        FieldType::Number => &[Eq, Neq, Gt, Gte, Lt, Lte, In, NotIn, Exists],
    };
    ops.iter().copied().collect()
}

/// `contains` and `like` are interchangeable spellings; so are their negations.
fn pair_text_operators(mut ops: BTreeSet<Operator>) -> BTreeSet<Operator> {
    for (a, b) in [
        (Operator::Contains, Operator::Like),
        (Operator::NotContains, Operator::NotLike),
    ] {
        if ops.contains(&a) || ops.contains(&b) {
            ops.insert(a);
            ops.insert(b);
        }
    }
    ops
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !name.ends_with('.')
}
