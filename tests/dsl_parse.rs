use bql::{field, Bql, Condition, MapResolver, Operator, ParseError, Rule, RuleValue, Ruleset};

fn bql() -> Bql {
    Bql::from_spec_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/people.json")).unwrap()
}

#[test]
fn mixed_connectors_require_grouping() {
    let bql = bql();
    assert!(bql.parse("sign = aries & isAlive = true | sign = leo").is_err());

    let rs = bql.parse("(sign = aries & isAlive = true) | sign = leo").unwrap();
    let group = rs.as_group().unwrap();
    assert_eq!(group.condition, Condition::Or);
    assert!(!group.not);
    assert_eq!(group.rules.len(), 2);

    let inner = group.rules[0].as_group().unwrap();
    assert_eq!(inner.condition, Condition::And);
    assert_eq!(
        inner.rules,
        vec![field("sign").eq("aries"), field("isAlive").eq(true)]
    );
    assert_eq!(group.rules[1], field("sign").eq("leo"));
}

#[test]
fn negation_requires_grouping() {
    let bql = bql();
    assert!(bql.parse("!sign = aries").is_err());

    let rs = bql.parse("!(sign = aries)").unwrap();
    let group = rs.as_group().unwrap();
    assert_eq!(group.condition, Condition::Or);
    assert!(group.not);
    assert_eq!(group.rules, vec![field("sign").eq("aries")]);
}

#[test]
fn membership_list() {
    let rs = bql().parse(r#"fname IN (alice, "bob smith")"#).unwrap();
    let rule = rs.as_rule().unwrap();
    assert_eq!(rule.field, "fname");
    assert_eq!(rule.operator, Operator::In);
    assert_eq!(
        rule.value,
        RuleValue::List(vec!["alice".to_owned(), "bob smith".to_owned()])
    );
}

#[test]
fn interchange_shape_of_parsed_membership() {
    let rs = bql().parse(r#"fname IN (alice, "bob smith")"#).unwrap();
    assert_eq!(
        serde_json::to_value(&rs).unwrap(),
        serde_json::json!({ "field": "fname", "operator": "in", "value": ["alice", "bob smith"] })
    );
}

#[test]
fn operators_are_case_insensitive() {
    let bql = bql();
    assert_eq!(
        bql.parse("fname contains bob").unwrap(),
        bql.parse("fname CONTAINS bob").unwrap()
    );
    assert_eq!(
        bql.parse("sign !in (leo)").unwrap(),
        field("sign").not_in(&["leo"])
    );
}

#[test]
fn full_text_terms_mix_with_rules() {
    let rs = bql().parse(r#"hello & "big world" & /^wo+/i"#).unwrap();
    let rules = &rs.as_group().unwrap().rules;
    assert_eq!(rules[0], Ruleset::Rule(Rule::new("_all", Operator::Contains, "hello")));
    assert_eq!(rules[1], Ruleset::Rule(Rule::new("_all", Operator::Contains, "big world")));
    assert_eq!(rules[2], Ruleset::Rule(Rule::new("_all", Operator::Like, "/^wo+/i")));
}

#[test]
fn per_field_operator_lists() {
    let bql = bql();
    assert!(bql.parse("nickname = bo").is_ok());
    assert!(bql.parse("nickname !EXISTS").is_ok());
    assert!(matches!(
        bql.parse("nickname CONTAINS bo"),
        Err(ParseError::OperatorNotAllowed { .. })
    ));
    // Operator map narrows category fields.
    assert!(matches!(
        bql.parse("sign > leo"),
        Err(ParseError::OperatorNotAllowed { .. })
    ));
}

#[test]
fn value_predicates_by_type() {
    let bql = bql();
    assert!(bql.parse("dob = 1990-05-17T08:30").is_ok());
    assert!(bql.parse("dob = 1990-02-30").is_err());
    assert!(bql.parse("age >= 21.5").is_ok());
    assert!(bql.parse("age >= twenty").is_err());
    assert!(bql.parse("isAlive = FALSE").is_ok());
    assert!(bql.parse("isAlive = no").is_err());
    // Category options are not enforced.
    assert!(bql.parse("sign = ophiuchus").is_ok());
}

#[test]
fn malformed_literals() {
    let bql = bql();
    assert!(matches!(
        bql.parse(r#"fname = "unterminated"#),
        Err(ParseError::Syntax { .. })
    ));
    assert!(matches!(
        bql.parse("fname LIKE /a(b/"),
        Err(ParseError::InvalidRegex { .. })
    ));
}

#[test]
fn unknown_field_with_operator() {
    assert!(matches!(
        bql().parse("middle = x"),
        Err(ParseError::UnknownField { field }) if field == "middle"
    ));
}

#[test]
fn named_queries_expand() {
    let bql = bql();
    let resolver = MapResolver::new()
        .with("people", "FIRE_SIGNS", "sign IN (aries, leo, sagittarius)")
        .with("people", "LIVING", "isAlive = true");

    let rs = bql
        .parse_with("LIVING & !FIRE_SIGNS", &resolver, None)
        .unwrap();
    assert_eq!(bql.render(&rs), "LIVING & !FIRE_SIGNS");

    let group = rs.as_group().unwrap();
    assert_eq!(group.rules[0], field("isAlive").eq(true).named("LIVING"));
    assert!(group.rules[1].as_group().unwrap().is_negated_reference());
}

#[test]
fn named_queries_from_other_domains_are_invisible() {
    let bql = bql();
    let resolver = MapResolver::new().with("planets", "LIVING", "isAlive = true");
    let rs = bql.parse_with("LIVING", &resolver, None).unwrap();
    assert_eq!(rs, Ruleset::Rule(Rule::new("_all", Operator::Contains, "LIVING")));
}

#[test]
fn cyclic_named_queries_are_rejected() {
    let bql = bql();
    let resolver = MapResolver::new()
        .with("people", "PING", "PONG | sign = leo")
        .with("people", "PONG", "!PING");
    let err = bql.parse_with("isAlive = true & PING", &resolver, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cyclic named query reference: PING -> PONG -> PING"
    );
}

#[test]
fn field_names_are_not_references() {
    let bql = Bql::from_spec_str(r#"{ "fields": { "ID": { "type": "number" } } }"#).unwrap();
    let resolver = |_: &str, _: Option<&str>, _: &str| -> Option<bql::NamedQuery> {
        panic!("field tokens must not be resolved")
    };
    let rs = bql.parse_with("ID = 7", &resolver, None).unwrap();
    assert_eq!(rs, field("ID").eq("7"));
}
