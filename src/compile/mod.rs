//! Lowering of a [`Ruleset`] into the search engine's boolean query DSL.

pub mod regexp;

use serde_json::{json, Value};
use tracing::trace;

use crate::date::{format_timestamp, DateLiteral};
use crate::types::{
    CompileError, Condition, FieldSpecRegistry, FieldType, Group, Operator, Rule, RuleValue,
    Ruleset, DEFAULT_FULL_TEXT_FIELD,
};

const SCRIPT_EQUALS: &str = "for (def v : doc[params.field]) { \
     if (v != null && v.toLowerCase() == params.value) { return true; } } return false;";

const SCRIPT_MEMBER: &str = "for (def v : doc[params.field]) { \
     if (v != null && params.values.contains(v.toLowerCase())) { return true; } } return false;";

/// Compile `ruleset` into a query DSL document.
///
/// # Errors
///
/// Returns [`CompileError`] for trees the parser would not have produced:
/// unknown fields, values of the wrong shape for their operator, unparsable
/// numbers or dates, untranslatable regex literals and empty groups.
pub fn compile(registry: &FieldSpecRegistry, ruleset: &Ruleset) -> Result<Value, CompileError> {
    let query = Compiler { registry }.ruleset(ruleset)?;
    trace!(rules = ruleset.rule_count(), "compiled ruleset");
    Ok(query)
}

struct Compiler<'r> {
    registry: &'r FieldSpecRegistry,
}

impl Compiler<'_> {
    fn ruleset(&self, ruleset: &Ruleset) -> Result<Value, CompileError> {
        match ruleset {
            Ruleset::Rule(rule) => self.leaf(rule, rule.operator),
            Ruleset::Group(group) => self.group(group),
        }
    }

    fn group(&self, group: &Group) -> Result<Value, CompileError> {
        if group.rules.is_empty() {
            return Err(CompileError::EmptyGroup);
        }
        let children = group
            .rules
            .iter()
            .map(|child| self.ruleset(child))
            .collect::<Result<Vec<_>, _>>()?;
        let combined = match group.condition {
            Condition::And => json!({ "bool": { "must": children } }),
            Condition::Or => json!({ "bool": { "should": children } }),
        };
        // Negation wraps the combined clause for both conditions, so a negated
        // AND means "not all of these".
        Ok(if group.not { must_not(combined) } else { combined })
    }

    fn leaf(&self, rule: &Rule, operator: Operator) -> Result<Value, CompileError> {
        match operator {
            Operator::Neq | Operator::NotContains | Operator::NotLike | Operator::NotIn => {
                Ok(must_not(self.leaf(rule, operator.positive())?))
            }
            Operator::Exists => self.exists(rule),
            Operator::Contains | Operator::Like => self.text_match(rule, operator),
            Operator::Eq => self.equals(rule),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                self.range(rule, operator)
            }
            Operator::In => self.membership(rule),
        }
    }

    fn field_type(&self, rule: &Rule) -> Result<FieldType, CompileError> {
        self.registry
            .field_type(&rule.field)
            .ok_or_else(|| CompileError::UnknownField {
                field: rule.field.clone(),
            })
    }

    fn is_full_text(&self, rule: &Rule) -> bool {
        rule.field == self.registry.default_full_text_field()
    }

    // -- exists -----------------------------------------------------------

    fn exists(&self, rule: &Rule) -> Result<Value, CompileError> {
        self.field_type(rule)?;
        let present = rule
            .value
            .as_bool()
            .ok_or_else(|| shape(rule, Operator::Exists, "a boolean"))?;
        let keyword = self.registry.keyword_field(&rule.field);
        let positive = json!({
            "bool": {
                "must": [
                    { "exists": { "field": rule.field } },
                    { "bool": { "must_not": { "term": { keyword: "" } } } }
                ]
            }
        });
        Ok(if present { positive } else { must_not(positive) })
    }

    // -- contains / like --------------------------------------------------

    fn text_match(&self, rule: &Rule, operator: Operator) -> Result<Value, CompileError> {
        let full_text = self.is_full_text(rule);
        if !full_text {
            self.field_type(rule)?;
        }
        let text = rule
            .value
            .as_text()
            .ok_or_else(|| shape(rule, operator, "a text value"))?;

        if rule.value.is_regex() {
            let pattern = regexp::translate(text).ok_or_else(|| CompileError::InvalidRegex {
                literal: text.to_owned(),
            })?;
            if !full_text {
                let keyword = self.registry.keyword_field(&rule.field);
                return Ok(json!({ "regexp": { keyword: pattern } }));
            }
            let clauses: Vec<Value> = self
                .registry
                .full_text_keyword_fields()
                .into_iter()
                .map(|keyword| json!({ "regexp": { keyword: pattern } }))
                .collect();
            if clauses.is_empty() {
                return Ok(json!({ "match_none": {} }));
            }
            return Ok(json!({ "bool": { "should": clauses } }));
        }

        let query = query_string_term(text);
        if full_text && rule.field == DEFAULT_FULL_TEXT_FIELD {
            return Ok(json!({ "query_string": { "query": query } }));
        }
        Ok(json!({ "query_string": { "query": query, "default_field": rule.field } }))
    }

    // -- = ------------------------------------------------------------------

    fn equals(&self, rule: &Rule) -> Result<Value, CompileError> {
        match self.field_type(rule)? {
            FieldType::Boolean => {
                let value = boolean(rule, Operator::Eq, &rule.value)?;
                Ok(json!({ "term": { rule.field.as_str(): value } }))
            }
            FieldType::Date => {
                let text = scalar(rule, Operator::Eq)?;
                let (start, end) = interval(rule, &text)?;
                Ok(json!({ "range": { rule.field.as_str(): { "gte": start, "lt": end } } }))
            }
            FieldType::Number => {
                let text = scalar(rule, Operator::Eq)?;
                Ok(json!({ "term": { rule.field.as_str(): number(rule, &text)? } }))
            }
            FieldType::String | FieldType::Category => {
                let text = scalar(rule, Operator::Eq)?;
                Ok(self.case_insensitive_equals(rule, &text))
            }
        }
    }

    fn case_insensitive_equals(&self, rule: &Rule, text: &str) -> Value {
        let lowered = text.to_lowercase();
        if let Some(ci) = self.registry.ci_keyword_field(&rule.field) {
            return json!({ "term": { ci: lowered } });
        }
        json!({
            "bool": {
                "must": [
                    { "match": { rule.field.as_str(): { "query": text, "operator": "and" } } },
                    script(
                        SCRIPT_EQUALS,
                        json!({ "field": self.registry.keyword_field(&rule.field), "value": lowered }),
                    )
                ]
            }
        })
    }

    // -- > >= < <= ----------------------------------------------------------

    fn range(&self, rule: &Rule, operator: Operator) -> Result<Value, CompileError> {
        let field_type = self.field_type(rule)?;
        let text = scalar(rule, operator)?;
        let as_date = match field_type {
            FieldType::Date => true,
            FieldType::Number => false,
            _ => DateLiteral::parse(&text).is_some(),
        };

        if as_date {
            let (start, end) = interval(rule, &text)?;
            let bound = match operator {
                Operator::Gt => json!({ "gte": end }),
                Operator::Gte => json!({ "gte": start }),
                Operator::Lt => json!({ "lt": start }),
                _ => json!({ "lt": end }),
            };
            return Ok(json!({ "range": { rule.field.as_str(): bound } }));
        }

        let key = match operator {
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            _ => "lte",
        };
        let value = number(rule, &text)?;
        Ok(json!({ "range": { rule.field.as_str(): { key: value } } }))
    }

    // -- in -------------------------------------------------------------------

    fn membership(&self, rule: &Rule) -> Result<Value, CompileError> {
        let field_type = self.field_type(rule)?;
        let items = rule
            .value
            .as_list()
            .ok_or_else(|| shape(rule, Operator::In, "a list"))?;
        let field = rule.field.as_str();

        match field_type {
            FieldType::Boolean => {
                let values = items
                    .iter()
                    .map(|item| boolean(rule, Operator::In, &RuleValue::Text(item.clone())))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "terms": { field: values } }))
            }
            FieldType::Number => {
                let values = items
                    .iter()
                    .map(|item| number(rule, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "terms": { field: values } }))
            }
            FieldType::Date => {
                let ranges = items
                    .iter()
                    .map(|item| -> Result<Value, CompileError> {
                        let (start, end) = interval(rule, item)?;
                        Ok(json!({ "range": { field: { "gte": start, "lt": end } } }))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "bool": { "should": ranges } }))
            }
            FieldType::String | FieldType::Category => {
                let lowered: Vec<String> = items.iter().map(|item| item.to_lowercase()).collect();
                if let Some(ci) = self.registry.ci_keyword_field(field) {
                    return Ok(json!({ "terms": { ci: lowered } }));
                }
                Ok(json!({
                    "bool": {
                        "must": [
                            { "match": { field: { "query": items.join(" "), "operator": "or" } } },
                            script(
                                SCRIPT_MEMBER,
                                json!({ "field": self.registry.keyword_field(field), "values": lowered }),
                            )
                        ]
                    }
                }))
            }
        }
    }
}

fn must_not(query: Value) -> Value {
    json!({ "bool": { "must_not": query } })
}

fn script(source: &str, params: Value) -> Value {
    json!({
        "script": {
            "script": { "source": source, "lang": "painless", "params": params }
        }
    })
}

fn shape(rule: &Rule, operator: Operator, expected: &'static str) -> CompileError {
    CompileError::ValueShape {
        field: rule.field.clone(),
        operator: operator.to_string(),
        expected,
    }
}

/// The rule's value as a single scalar. Booleans read as `true`/`false`.
fn scalar(rule: &Rule, operator: Operator) -> Result<String, CompileError> {
    match &rule.value {
        RuleValue::Text(text) => Ok(text.clone()),
        RuleValue::Bool(b) => Ok(b.to_string()),
        RuleValue::List(_) => Err(shape(rule, operator, "a single value")),
    }
}

fn boolean(rule: &Rule, operator: Operator, value: &RuleValue) -> Result<bool, CompileError> {
    match value {
        RuleValue::Bool(b) => Ok(*b),
        RuleValue::Text(t) if t.eq_ignore_ascii_case("true") => Ok(true),
        RuleValue::Text(t) if t.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(shape(rule, operator, "a boolean")),
    }
}

/// Integers stay integral in the output; anything else goes through `f64`.
fn number(rule: &Rule, text: &str) -> Result<Value, CompileError> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Value::from(n)),
        _ => Err(CompileError::InvalidNumber {
            field: rule.field.clone(),
            value: text.to_owned(),
        }),
    }
}

/// Formatted `[start, end)` bounds of a date literal.
fn interval(rule: &Rule, text: &str) -> Result<(String, String), CompileError> {
    let invalid = || CompileError::InvalidDate {
        field: rule.field.clone(),
        value: text.to_owned(),
    };
    let literal = DateLiteral::parse(text).ok_or_else(invalid)?;
    let end = literal.end().ok_or_else(invalid)?;
    Ok((format_timestamp(literal.start()), format_timestamp(end)))
}

/// Quote a `query_string` term unless it is a single plain word (wildcards
/// allowed).
fn query_string_term(text: &str) -> String {
    let plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '*' | '?'));
    if plain {
        return text.to_owned();
    }
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
