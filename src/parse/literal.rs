use tracing::debug;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, repeat, separated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, take_till, take_while};

use super::error::ParseError;
use crate::date::DateLiteral;
use crate::types::{is_regex_literal, FieldSpecRegistry, FieldType, Operator, RuleValue};

// -- Literals ---------------------------------------------------------------

/// Strip the quotes from a quoted literal and resolve `\"` and `\\`.
/// Unquoted text is returned unchanged.
pub(crate) fn unquote(raw: &str) -> Result<String, ParseError> {
    let Some(inner) = raw.strip_prefix('"') else {
        return Ok(raw.to_owned());
    };
    let malformed = || ParseError::MalformedLiteral {
        literal: raw.to_owned(),
    };
    let inner = inner.strip_suffix('"').ok_or_else(malformed)?;
    let trailing = inner.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        return Err(malformed());
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(esc @ ('"' | '\\')) => out.push(esc),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(malformed()),
        }
    }
    Ok(out)
}

/// Split a regex literal into its pattern and case-insensitive flag.
pub(crate) fn regex_parts(literal: &str) -> Option<(&str, bool)> {
    if !is_regex_literal(literal) {
        return None;
    }
    let (body, insensitive) = match literal.strip_suffix('i') {
        Some(body) => (body, true),
        None => (literal, false),
    };
    Some((&body[1..body.len() - 1], insensitive))
}

/// Check that a regex literal's pattern compiles.
pub(crate) fn check_regex(literal: &str) -> Result<(), ParseError> {
    let invalid = |reason: String| ParseError::InvalidRegex {
        literal: literal.to_owned(),
        reason,
    };
    let (pattern, insensitive) =
        regex_parts(literal).ok_or_else(|| invalid("not a /pattern/ literal".to_owned()))?;
    regex::RegexBuilder::new(pattern)
        .case_insensitive(insensitive)
        .build()
        .map(|_| ())
        .map_err(|e| invalid(e.to_string()))
}

// -- IN lists -----------------------------------------------------------------

fn escaped_run(stop: char) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        alt((
            ('\\', any).void(),
            take_while(1.., |c: char| c != stop && c != '\\').void(),
        ))
        .parse_next(input)
    }
}

fn quoted_item<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    let body = |input: &mut &'i str| -> ModalResult<()> { repeat(0.., escaped_run('"')).parse_next(input) };
    ('"', body, '"').take().parse_next(input)
}

fn regex_item<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    let body = |input: &mut &'i str| -> ModalResult<()> { repeat(1.., escaped_run('/')).parse_next(input) };
    ('/', body, '/', opt('i')).take().parse_next(input)
}

fn bare_item<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_till(1.., |c: char| c.is_whitespace() || ",()\"&|!=<>".contains(c)).parse_next(input)
}

fn list_item<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    delimited(multispace0, alt((quoted_item, regex_item, bare_item)), multispace0).parse_next(input)
}

fn list<'i>(input: &mut &'i str) -> ModalResult<Vec<&'i str>> {
    delimited('(', separated(1.., list_item, ','), ')').parse_next(input)
}

/// The raw items of a parenthesized `IN` list token, or `None` if the token
/// is not a list.
pub(crate) fn split_list(raw: &str) -> Option<Vec<&str>> {
    list.parse(raw).ok()
}

// -- Values -------------------------------------------------------------------

/// Build the value of `field OP raw`, applying the field type's predicate.
pub(crate) fn field_value(
    registry: &FieldSpecRegistry,
    field: &str,
    operator: Operator,
    raw: &str,
) -> Result<RuleValue, ParseError> {
    let field_type = registry
        .field_type(field)
        .ok_or_else(|| ParseError::UnknownField {
            field: field.to_owned(),
        })?;

    if operator.is_membership() {
        let invalid = || ParseError::InvalidValue {
            field: field.to_owned(),
            field_type,
            value: raw.to_owned(),
        };
        let items = split_list(raw).ok_or_else(invalid)?;
        let values = items
            .into_iter()
            .map(|item| -> Result<String, ParseError> {
                let text = unquote(item)?;
                match scalar_value(registry, field, field_type, &text)? {
                    RuleValue::Bool(b) => Ok(b.to_string()),
                    _ => Ok(text),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(RuleValue::List(values));
    }

    if operator.is_text_match() && is_regex_literal(raw) {
        check_regex(raw)?;
        return Ok(RuleValue::Text(raw.to_owned()));
    }

    let text = unquote(raw)?;
    scalar_value(registry, field, field_type, &text)
}

fn scalar_value(
    registry: &FieldSpecRegistry,
    field: &str,
    field_type: FieldType,
    text: &str,
) -> Result<RuleValue, ParseError> {
    let valid = match field_type {
        FieldType::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                return Ok(RuleValue::Bool(true));
            }
            if text.eq_ignore_ascii_case("false") {
                return Ok(RuleValue::Bool(false));
            }
            false
        }
        FieldType::Date => DateLiteral::parse(text).is_some(),
        FieldType::Number => text.parse::<f64>().is_ok_and(f64::is_finite),
        FieldType::String => !text.is_empty(),
        FieldType::Category => {
            let options = registry.options(field);
            if !options.is_empty() && !options.iter().any(|o| o.eq_ignore_ascii_case(text)) {
                debug!(field, value = text, "value is not one of the declared category options");
            }
            true
        }
    };
    if !valid {
        return Err(ParseError::InvalidValue {
            field: field.to_owned(),
            field_type,
            value: text.to_owned(),
        });
    }
    Ok(RuleValue::Text(text.to_owned()))
}

/// Build the value of a bare full-text term.
pub(crate) fn full_text_value(registry: &FieldSpecRegistry, raw: &str) -> Result<(Operator, RuleValue), ParseError> {
    if is_regex_literal(raw) {
        check_regex(raw)?;
        return Ok((Operator::Like, RuleValue::Text(raw.to_owned())));
    }
    let text = unquote(raw)?;
    if text.is_empty() {
        return Err(ParseError::InvalidValue {
            field: registry.default_full_text_field().to_owned(),
            field_type: FieldType::String,
            value: text,
        });
    }
    Ok((Operator::Contains, RuleValue::Text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSpec, SpecDocument};

    fn registry() -> FieldSpecRegistry {
        FieldSpecRegistry::from_document(
            &SpecDocument::new("people")
                .field("fname", FieldSpec::new(FieldType::String))
                .field("isAlive", FieldSpec::new(FieldType::Boolean))
                .field("dob", FieldSpec::new(FieldType::Date))
                .field("age", FieldSpec::new(FieldType::Number))
                .field("sign", FieldSpec::new(FieldType::Category).options(&["aries"])),
        )
        .unwrap()
    }

    #[test]
    fn unquote_escapes() {
        assert_eq!(unquote(r#""a \"b\" c""#).unwrap(), r#"a "b" c"#);
        assert_eq!(unquote(r#""back\\slash""#).unwrap(), r"back\slash");
        assert_eq!(unquote(r#""keep \d""#).unwrap(), r"keep \d");
        assert_eq!(unquote("bare").unwrap(), "bare");
    }

    #[test]
    fn unquote_rejects_escaped_closing_quote() {
        assert!(matches!(
            unquote(r#""abc\""#),
            Err(ParseError::MalformedLiteral { .. })
        ));
        assert!(matches!(unquote("\"abc"), Err(ParseError::MalformedLiteral { .. })));
    }

    #[test]
    fn regex_parts_and_check() {
        assert_eq!(regex_parts("/ab+c/i"), Some(("ab+c", true)));
        assert_eq!(regex_parts("/ab+c/"), Some(("ab+c", false)));
        assert!(check_regex("/ab+c/").is_ok());
        assert!(matches!(
            check_regex("/ab(c/"),
            Err(ParseError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn split_list_items() {
        assert_eq!(
            split_list(r#"(alice, "bob smith", /b.b/i)"#).unwrap(),
            vec!["alice", r#""bob smith""#, "/b.b/i"]
        );
        assert_eq!(split_list("( a )").unwrap(), vec!["a"]);
        assert!(split_list("(a,)").is_none());
        assert!(split_list("a, b").is_none());
    }

    #[test]
    fn membership_values() {
        let reg = registry();
        let value = field_value(&reg, "fname", Operator::In, r#"(alice, "bob smith")"#).unwrap();
        assert_eq!(
            value,
            RuleValue::List(vec!["alice".to_owned(), "bob smith".to_owned()])
        );
        let value = field_value(&reg, "isAlive", Operator::In, "(TRUE, false)").unwrap();
        assert_eq!(value, RuleValue::List(vec!["true".to_owned(), "false".to_owned()]));
        assert!(matches!(
            field_value(&reg, "fname", Operator::In, "alice"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn type_predicates() {
        let reg = registry();
        assert_eq!(
            field_value(&reg, "isAlive", Operator::Eq, "True").unwrap(),
            RuleValue::Bool(true)
        );
        assert!(field_value(&reg, "isAlive", Operator::Eq, "yes").is_err());
        assert!(field_value(&reg, "dob", Operator::Gte, "1990-05").is_ok());
        assert!(field_value(&reg, "dob", Operator::Gte, "1990-13").is_err());
        assert!(field_value(&reg, "age", Operator::Gt, "-2.5").is_ok());
        assert!(field_value(&reg, "age", Operator::Gt, "old").is_err());
        assert!(field_value(&reg, "fname", Operator::Eq, "\"\"").is_err());
    }

    #[test]
    fn category_options_are_advisory() {
        let reg = registry();
        assert_eq!(
            field_value(&reg, "sign", Operator::Eq, "ophiuchus").unwrap(),
            RuleValue::Text("ophiuchus".to_owned())
        );
    }

    #[test]
    fn regex_value_only_for_text_match() {
        let reg = registry();
        assert_eq!(
            field_value(&reg, "fname", Operator::Like, "/^bo/i").unwrap(),
            RuleValue::Text("/^bo/i".to_owned())
        );
        assert!(matches!(
            field_value(&reg, "fname", Operator::Contains, "/(/"),
            Err(ParseError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn full_text_operator_choice() {
        let reg = registry();
        assert_eq!(
            full_text_value(&reg, "/bo+/").unwrap(),
            (Operator::Like, RuleValue::Text("/bo+/".to_owned()))
        );
        assert_eq!(
            full_text_value(&reg, "\"hello world\"").unwrap(),
            (Operator::Contains, RuleValue::Text("hello world".to_owned()))
        );
    }
}
