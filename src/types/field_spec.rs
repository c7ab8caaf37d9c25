use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SpecError;

/// The value type of a field, which selects its default operators, its value
/// predicate and the shape of the compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    String,
    Boolean,
    Date,
    Number,
    Category,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::String,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Number,
        FieldType::Category,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Category => "category",
        }
    }
}

impl FromStr for FieldType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpecError::UnknownType {
                type_name: s.to_owned(),
            })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the `fields` table in a field-spec resource.
///
/// Types and operators are kept as raw strings here and validated when the
/// [`FieldSpecRegistry`](super::FieldSpecRegistry) is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<String>>,
    /// Explicit name of a lower-cased keyword subfield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_field: Option<String>,
    /// Shorthand for `ci_field = "<field>.ci_keyword"`.
    #[serde(default)]
    pub has_ci_keyword: bool,
    /// Enumerated category values. Advisory only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldSpec {
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: field_type.as_str().to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn operators(mut self, operators: &[&str]) -> Self {
        self.operators = Some(operators.iter().map(|&o| o.to_owned()).collect());
        self
    }

    #[must_use]
    pub fn ci_field(mut self, name: &str) -> Self {
        self.ci_field = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_ci_keyword(mut self) -> Self {
        self.has_ci_keyword = true;
        self
    }

    #[must_use]
    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|&o| o.to_owned()).collect();
        self
    }
}

/// A complete field-spec resource for one domain.
///
/// ```json
/// {
///   "domain": "people",
///   "fields": {
///     "fname": { "type": "string", "hasCiKeyword": true },
///     "dob":   { "type": "date" }
///   },
///   "operatorMap": { "category": ["=", "!=", "IN", "!IN"] }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub operator_map: BTreeMap<String, Vec<String>>,
}

impl SpecDocument {
    #[must_use]
    pub fn new(domain: &str) -> Self {
        Self {
            domain: Some(domain.to_owned()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_owned(), spec);
        self
    }

    #[must_use]
    pub fn default_field(mut self, name: &str) -> Self {
        self.default_field = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn type_operators(mut self, field_type: FieldType, operators: &[&str]) -> Self {
        self.operator_map.insert(
            field_type.as_str().to_owned(),
            operators.iter().map(|&o| o.to_owned()).collect(),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_from_str_is_case_insensitive() {
        assert_eq!("Date".parse::<FieldType>().unwrap(), FieldType::Date);
        assert_eq!("CATEGORY".parse::<FieldType>().unwrap(), FieldType::Category);
        assert!(matches!(
            "geo".parse::<FieldType>(),
            Err(SpecError::UnknownType { type_name }) if type_name == "geo"
        ));
    }

    #[test]
    fn deserialize_resource() {
        let doc: SpecDocument = serde_json::from_str(
            r#"{
                "domain": "people",
                "fields": {
                    "fname": { "type": "string", "ciField": "fname.lower" },
                    "sign": { "type": "category", "options": ["aries", "leo"], "hasCiKeyword": true },
                    "isAlive": { "type": "boolean" }
                },
                "operatorMap": { "number": [">", "<"] }
            }"#,
        )
        .unwrap();
        assert_eq!(doc.domain.as_deref(), Some("people"));
        assert_eq!(doc.fields.len(), 3);
        assert_eq!(doc.fields["fname"].ci_field.as_deref(), Some("fname.lower"));
        assert!(doc.fields["sign"].has_ci_keyword);
        assert_eq!(doc.fields["sign"].options, vec!["aries", "leo"]);
        assert!(doc.fields["isAlive"].operators.is_none());
        assert_eq!(doc.operator_map["number"], vec![">", "<"]);
    }

    #[test]
    fn builder_matches_deserialized() {
        let built = SpecDocument::new("people")
            .field("isAlive", FieldSpec::new(FieldType::Boolean));
        let parsed: SpecDocument = serde_json::from_str(
            r#"{ "domain": "people", "fields": { "isAlive": { "type": "boolean" } } }"#,
        )
        .unwrap();
        assert_eq!(built, parsed);
    }
}
