//! Ruleset -> canonical BQL text.
//!
//! The output always parses back to the same tree under the registry it was
//! rendered with. Named-query expansions render as their name.

use crate::parse::grammar::is_named_ref;
use crate::parse::literal::check_regex;
use crate::types::{
    is_regex_literal, Condition, FieldSpecRegistry, Group, Operator, Rule, RuleValue, Ruleset,
};

/// Characters that force a scalar into quotes.
const SPECIAL: &[char] = &['"', '\\', '(', ')', '&', '|', '!', '=', '<', '>', ','];

/// Render `ruleset` as BQL text.
#[must_use]
pub fn render(registry: &FieldSpecRegistry, ruleset: &Ruleset) -> String {
    let mut out = String::new();
    node(registry, ruleset, &mut out);
    out
}

fn node(registry: &FieldSpecRegistry, ruleset: &Ruleset, out: &mut String) {
    if let Some(name) = ruleset.name() {
        out.push_str(name);
        return;
    }
    match ruleset {
        Ruleset::Rule(rule) => leaf(registry, rule, out),
        Ruleset::Group(group) if group.not => negation(registry, group, out),
        Ruleset::Group(group) => body(registry, group.condition, &group.rules, out),
    }
}

fn negation(registry: &FieldSpecRegistry, group: &Group, out: &mut String) {
    out.push('!');
    if group.is_negated_reference() {
        if let Some(name) = group.rules.first().and_then(Ruleset::name) {
            out.push_str(name);
            return;
        }
    }
    out.push('(');
    body(registry, group.condition, &group.rules, out);
    out.push(')');
}

fn body(registry: &FieldSpecRegistry, condition: Condition, rules: &[Ruleset], out: &mut String) {
    let separator = match condition {
        Condition::And => " & ",
        Condition::Or => " | ",
    };
    for (i, child) in rules.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        let wrap = rules.len() > 1 && is_plain_group(child);
        if wrap {
            out.push('(');
        }
        node(registry, child, out);
        if wrap {
            out.push(')');
        }
    }
}

fn is_plain_group(ruleset: &Ruleset) -> bool {
    matches!(ruleset, Ruleset::Group(g) if !g.not && g.name.is_none())
}

fn leaf(registry: &FieldSpecRegistry, rule: &Rule, out: &mut String) {
    if is_full_text(registry, rule) {
        if let RuleValue::Text(text) = &rule.value {
            // A bare regex literal reads back as LIKE, so a CONTAINS value of
            // that shape has to stay quoted.
            let allow_regex = rule.operator == Operator::Like;
            out.push_str(&scalar(registry, text, allow_regex));
            return;
        }
    }

    out.push_str(&rule.field);
    out.push(' ');
    if rule.operator == Operator::Exists {
        let present = rule.value.as_bool().unwrap_or(true);
        out.push_str(if present { "EXISTS" } else { "!EXISTS" });
        return;
    }
    out.push_str(rule.operator.token());
    out.push(' ');
    match &rule.value {
        RuleValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        RuleValue::Text(text) => {
            // Text-match operators validate bare regex literals on the way
            // back in; a quoted value that only looks like one stays quoted.
            let allow_regex = !rule.operator.is_text_match() || check_regex(text).is_ok();
            out.push_str(&scalar(registry, text, allow_regex));
        }
        RuleValue::List(items) => {
            let items: Vec<String> = items.iter().map(|item| scalar(registry, item, true)).collect();
            out.push('(');
            out.push_str(&items.join(", "));
            out.push(')');
        }
    }
}

fn is_full_text(registry: &FieldSpecRegistry, rule: &Rule) -> bool {
    rule.field == registry.default_full_text_field()
        && matches!(rule.operator, Operator::Contains | Operator::Like)
}

/// A scalar as it must be written so the tokenizer reads it back as one
/// value token with the same content.
fn scalar(registry: &FieldSpecRegistry, text: &str, allow_regex: bool) -> String {
    let regex = is_regex_literal(text);
    if regex && allow_regex {
        return text.to_owned();
    }
    let needs_quotes = regex
        || text.is_empty()
        || text.starts_with('/')
        || text.chars().any(|c| c.is_whitespace() || SPECIAL.contains(&c))
        || is_keyword(text)
        || registry.is_valid_field(text)
        || is_named_ref(text);
    if !needs_quotes {
        return text.to_owned();
    }
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn is_keyword(text: &str) -> bool {
    ["contains", "like", "exists", "in"]
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{field, FieldSpec, FieldType, SpecDocument};

    fn registry() -> FieldSpecRegistry {
        FieldSpecRegistry::from_document(
            &SpecDocument::new("people")
                .field("fname", FieldSpec::new(FieldType::String))
                .field("sign", FieldSpec::new(FieldType::Category))
                .field("isAlive", FieldSpec::new(FieldType::Boolean)),
        )
        .unwrap()
    }

    fn text(rs: &Ruleset) -> String {
        render(&registry(), rs)
    }

    #[test]
    fn leaf_rules() {
        assert_eq!(text(&field("sign").eq("aries")), "sign = aries");
        assert_eq!(text(&field("isAlive").neq(true)), "isAlive != true");
        assert_eq!(text(&field("fname").contains("bob")), "fname CONTAINS bob");
        assert_eq!(text(&field("fname").exists()), "fname EXISTS");
        assert_eq!(text(&field("fname").like("/^bo/i")), "fname LIKE /^bo/i");
        assert_eq!(text(&field("fname").contains("/a(/")), r#"fname CONTAINS "/a(/""#);
        assert_eq!(text(&field("fname").not_exists()), "fname !EXISTS");
        assert_eq!(text(&field("fname").eq("/a/b")), r#"fname = "/a/b""#);
        assert_eq!(text(&field("fname").like("/a/b")), r#"fname LIKE "/a/b""#);
        assert_eq!(text(&field("fname").eq("sign-up")), "fname = sign-up");
    }

    #[test]
    fn lists_quote_selectively() {
        let rs = field("fname").not_in(&["alice", "bob smith"]);
        assert_eq!(text(&rs), r#"fname !IN (alice, "bob smith")"#);
    }

    #[test]
    fn scalar_quoting() {
        let reg = registry();
        assert_eq!(scalar(&reg, "plain", true), "plain");
        assert_eq!(scalar(&reg, "", true), r#""""#);
        assert_eq!(scalar(&reg, r#"say "hi""#, true), r#""say \"hi\"""#);
        assert_eq!(scalar(&reg, r"a\b", true), r#""a\\b""#);
        assert_eq!(scalar(&reg, "a&b", true), r#""a&b""#);
        assert_eq!(scalar(&reg, "Contains", true), r#""Contains""#);
        assert_eq!(scalar(&reg, "sign", true), r#""sign""#);
        assert_eq!(scalar(&reg, "LEOS", true), r#""LEOS""#);
        assert_eq!(scalar(&reg, "/a b/i", true), "/a b/i");
    }

    #[test]
    fn full_text_renders_bare() {
        let rs = Ruleset::Rule(Rule::new("_all", Operator::Contains, "hello world"));
        assert_eq!(text(&rs), r#""hello world""#);
        let rs = Ruleset::Rule(Rule::new("_all", Operator::Like, "/he.*o/i"));
        assert_eq!(text(&rs), "/he.*o/i");
        let rs = Ruleset::Rule(Rule::new("_all", Operator::Contains, "/he.*o/"));
        assert_eq!(text(&rs), r#""/he.*o/""#);
    }

    #[test]
    fn nested_groups_are_parenthesized() {
        let rs = field("sign")
            .eq("aries")
            .and(field("isAlive").eq(true))
            .or(field("sign").eq("leo"));
        assert_eq!(text(&rs), "(sign = aries & isAlive = true) | sign = leo");
    }

    #[test]
    fn single_child_group_is_not_wrapped() {
        let inner = field("sign").eq("aries").or(field("sign").eq("leo"));
        let rs = Ruleset::Group(Group::new(Condition::And, vec![inner]));
        assert_eq!(text(&rs), "sign = aries | sign = leo");
    }

    #[test]
    fn negation_forms() {
        assert_eq!(text(&!field("sign").eq("aries")), "!(sign = aries)");
        let rs = !field("sign").eq("aries").and(field("isAlive").eq(true));
        assert_eq!(text(&rs), "!(sign = aries & isAlive = true)");
        let rs = !field("sign").eq("leo").named("LEOS");
        assert_eq!(text(&rs), "!LEOS");
    }

    #[test]
    fn named_nodes_render_as_name() {
        let rs = field("sign")
            .eq("leo")
            .named("LEOS")
            .and(field("isAlive").eq(true));
        assert_eq!(text(&rs), "LEOS & isAlive = true");
    }
}
