use std::ops::Not;

use serde::{Deserialize, Serialize};

use super::operator::Operator;
use super::value::RuleValue;

/// How the children of a [`Group`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    And,
    Or,
}

impl Condition {
    /// The BQL connector for this condition.
    #[must_use]
    pub fn connector(self) -> &'static str {
        match self {
            Condition::And => "&",
            Condition::Or => "|",
        }
    }

    #[must_use]
    pub fn from_connector(token: &str) -> Option<Condition> {
        match token {
            "&" => Some(Condition::And),
            "|" => Some(Condition::Or),
            _ => None,
        }
    }
}

/// A leaf rule: `field OP value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: Operator,
    pub value: RuleValue,
    /// Set when this rule is the expansion of a named query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A boolean combination of child rulesets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub condition: Condition,
    pub rules: Vec<Ruleset>,
    #[serde(default)]
    pub not: bool,
    /// Set when this group is the expansion of a named query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The query AST: either a leaf [`Rule`] or a [`Group`] of rulesets.
///
/// Produced by the parser and consumed read-only by the renderer and the
/// compiler. The serde representation is the interchange shape
/// `{ field?, operator?, value?, condition?, not, rules?, name? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ruleset {
    Group(Group),
    Rule(Rule),
}

impl Rule {
    #[must_use]
    pub fn new(field: &str, operator: Operator, value: impl Into<RuleValue>) -> Self {
        Self {
            field: field.to_owned(),
            operator,
            value: value.into(),
            name: None,
        }
    }
}

impl Group {
    #[must_use]
    pub fn new(condition: Condition, rules: Vec<Ruleset>) -> Self {
        Self {
            condition,
            rules,
            not: false,
            name: None,
        }
    }

    /// Whether this group stands for a negated named-query reference, which
    /// renders as `!NAME`.
    #[must_use]
    pub fn is_negated_reference(&self) -> bool {
        self.not && matches!(self.rules.as_slice(), [only] if only.name().is_some())
    }
}

impl Ruleset {
    /// The named query this node was expanded from, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Ruleset::Rule(rule) => rule.name.as_deref(),
            Ruleset::Group(group) => group.name.as_deref(),
        }
    }

    /// Tag this node as the expansion of the named query `name`.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        match &mut self {
            Ruleset::Rule(rule) => rule.name = Some(name.to_owned()),
            Ruleset::Group(group) => group.name = Some(name.to_owned()),
        }
        self
    }

    #[must_use]
    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Ruleset::Rule(rule) => Some(rule),
            Ruleset::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Ruleset::Group(group) => Some(group),
            Ruleset::Rule(_) => None,
        }
    }

    #[must_use]
    pub fn and(self, other: Ruleset) -> Ruleset {
        self.combine(Condition::And, other)
    }

    #[must_use]
    pub fn or(self, other: Ruleset) -> Ruleset {
        self.combine(Condition::Or, other)
    }

    /// Append to an open chain of the same condition, or start a new group.
    fn combine(self, condition: Condition, other: Ruleset) -> Ruleset {
        match self {
            Ruleset::Group(mut group)
                if group.condition == condition && !group.not && group.name.is_none() =>
            {
                group.rules.push(other);
                Ruleset::Group(group)
            }
            first => Ruleset::Group(Group::new(condition, vec![first, other])),
        }
    }

    /// Count of leaf rules in the tree.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        match self {
            Ruleset::Rule(_) => 1,
            Ruleset::Group(group) => group.rules.iter().map(Ruleset::rule_count).sum(),
        }
    }
}

impl Not for Ruleset {
    type Output = Ruleset;

    /// Negate in the shape the parser produces for `!( ... )`: a plain group
    /// takes the flag itself, anything else is wrapped in a negated OR group.
    fn not(self) -> Ruleset {
        match self {
            Ruleset::Group(mut group) if !group.not && group.name.is_none() => {
                group.not = true;
                Ruleset::Group(group)
            }
            other => {
                let mut group = Group::new(Condition::Or, vec![other]);
                group.not = true;
                Ruleset::Group(group)
            }
        }
    }
}

impl From<Rule> for Ruleset {
    fn from(rule: Rule) -> Self {
        Ruleset::Rule(rule)
    }
}

impl From<Group> for Ruleset {
    fn from(group: Group) -> Self {
        Ruleset::Group(group)
    }
}

/// Intermediate builder for leaf rules.
/// Created by [`field()`]; a comparison method produces the [`Ruleset`].
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
}

impl FieldRule {
    fn op(self, operator: Operator, value: impl Into<RuleValue>) -> Ruleset {
        Ruleset::Rule(Rule::new(&self.field, operator, value))
    }

    #[must_use]
    pub fn eq(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Eq, value)
    }

    #[must_use]
    pub fn neq(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Neq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Lte, value)
    }

    #[must_use]
    pub fn contains(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Contains, value)
    }

    #[must_use]
    pub fn like(self, value: impl Into<RuleValue>) -> Ruleset {
        self.op(Operator::Like, value)
    }

    #[must_use]
    pub fn is_in(self, values: &[&str]) -> Ruleset {
        self.op(Operator::In, values)
    }

    #[must_use]
    pub fn not_in(self, values: &[&str]) -> Ruleset {
        self.op(Operator::NotIn, values)
    }

    #[must_use]
    pub fn exists(self) -> Ruleset {
        self.op(Operator::Exists, true)
    }

    #[must_use]
    pub fn not_exists(self) -> Ruleset {
        self.op(Operator::Exists, false)
    }
}

#[must_use]
pub fn field(name: &str) -> FieldRule {
    FieldRule {
        field: name.to_owned(),
    }
}
