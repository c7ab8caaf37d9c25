use std::cell::Cell;

use tracing::{debug, trace};

use super::error::ParseError;
use super::literal;
use super::tokenizer::Tokenizer;
use crate::resolve::NamedQueryResolver;
use crate::types::{Condition, FieldSpecRegistry, Group, Operator, Rule, RuleValue, Ruleset};

/// Result of one production attempt: `None` means "did not match here, try
/// the next alternative"; errors abort the whole parse.
type Step = Result<Option<(usize, Ruleset)>, ParseError>;

/// Deepest parenthesized nesting accepted in one query text.
pub(crate) const MAX_NESTING: usize = 128;

/// The tokens of one query text plus the furthest index any production
/// consumed, used to place the error when nothing matches.
struct Tokens<'t> {
    items: Vec<&'t str>,
    furthest: Cell<usize>,
    depth: Cell<usize>,
}

impl<'t> Tokens<'t> {
    fn get(&self, index: usize) -> Option<&'t str> {
        self.items.get(index).copied()
    }

    fn reach(&self, index: usize) {
        if index > self.furthest.get() {
            self.furthest.set(index);
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn enter(&self) -> Result<(), ParseError> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING {
            return Err(ParseError::TooDeep { limit: MAX_NESTING });
        }
        self.depth.set(depth + 1);
        Ok(())
    }

    fn leave(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Recursive-descent parser over a token slice.
///
/// ```text
/// ruleset    := operand (CONNECTOR operand)*     one connector kind per chain
///             | '!' groupOrRef
/// operand    := groupOrRef | rule
/// groupOrRef := ['!'] ( NAMED_REF | '(' ruleset ')' )
/// rule       := FIELD OP value | FIELD EXISTS | FIELD !EXISTS | bare value
/// ```
pub(crate) struct Parser<'p> {
    pub(crate) registry: &'p FieldSpecRegistry,
    pub(crate) tokenizer: &'p Tokenizer,
    pub(crate) resolver: &'p dyn NamedQueryResolver,
    pub(crate) owner: Option<&'p str>,
}

impl Parser<'_> {
    pub(crate) fn parse(&self, text: &str) -> Result<Ruleset, ParseError> {
        self.parse_text(text, &mut Vec::new())
    }

    /// `stack` holds the named queries currently being expanded.
    fn parse_text(&self, text: &str, stack: &mut Vec<String>) -> Result<Ruleset, ParseError> {
        let tokens = Tokens {
            items: self.tokenizer.tokenize(text)?,
            furthest: Cell::new(0),
            depth: Cell::new(0),
        };

        match self.ruleset(&tokens, 0, stack)? {
            Some((end, node)) if end == tokens.len() => Ok(node),
            Some((end, _)) => Err(unconsumed(&tokens, end)),
            None => Err(unconsumed(&tokens, tokens.furthest.get())),
        }
    }

    fn ruleset(&self, tokens: &Tokens<'_>, index: usize, stack: &mut Vec<String>) -> Step {
        let Some((mut next, first)) = self.operand(tokens, index, stack)? else {
            return self.not_form(tokens, index, stack);
        };
        let Some(condition) = tokens.get(next).and_then(Condition::from_connector) else {
            return Ok(Some((next, first)));
        };

        let mut rules = vec![first];
        while tokens.get(next).and_then(Condition::from_connector) == Some(condition) {
            match self.operand(tokens, next + 1, stack)? {
                Some((after, node)) => {
                    rules.push(node);
                    next = after;
                }
                None => break,
            }
        }

        if rules.len() == 1 {
            return Ok(rules.pop().map(|only| (next, only)));
        }
        Ok(Some((next, Ruleset::Group(Group::new(condition, rules)))))
    }

    /// `!` applied to a group or reference that may carry its own `!`.
    fn not_form(&self, tokens: &Tokens<'_>, index: usize, stack: &mut Vec<String>) -> Step {
        if tokens.get(index) != Some("!") {
            return Ok(None);
        }
        Ok(self
            .group_or_ref(tokens, index + 1, stack)?
            .map(|(end, node)| (end, !node)))
    }

    fn operand(&self, tokens: &Tokens<'_>, index: usize, stack: &mut Vec<String>) -> Step {
        if let Some(found) = self.group_or_ref(tokens, index, stack)? {
            return Ok(Some(found));
        }
        self.rule(tokens, index)
    }

    fn group_or_ref(&self, tokens: &Tokens<'_>, index: usize, stack: &mut Vec<String>) -> Step {
        let (negated, start) = match tokens.get(index) {
            Some("!") => (true, index + 1),
            _ => (false, index),
        };
        let Some(token) = tokens.get(start) else {
            return Ok(None);
        };

        if token == "(" {
            tokens.enter()?;
            let inner = self.ruleset(tokens, start + 1, stack);
            tokens.leave();
            let Some((end, inner)) = inner? else {
                return Ok(None);
            };
            if tokens.get(end) != Some(")") {
                return Ok(None);
            }
            tokens.reach(end + 1);
            let node = if negated { !inner } else { inner };
            return Ok(Some((end + 1, node)));
        }

        if is_named_ref(token) && !self.registry.is_valid_field(token) {
            let Some(expanded) = self.expand(token, stack)? else {
                return Ok(None);
            };
            tokens.reach(start + 1);
            let node = if negated { !expanded } else { expanded };
            return Ok(Some((start + 1, node)));
        }

        Ok(None)
    }

    /// Resolve and parse a named query. A miss is not an error; the caller
    /// falls through to its next alternative.
    fn expand(&self, name: &str, stack: &mut Vec<String>) -> Result<Option<Ruleset>, ParseError> {
        if stack.iter().any(|seen| seen == name) {
            let mut path = stack.clone();
            path.push(name.to_owned());
            debug!(path = ?path, "cyclic named query reference");
            return Err(ParseError::CyclicReference { path });
        }

        let domain = self.registry.domain();
        let Some(query) = self.resolver.resolve(name, self.owner, domain) else {
            trace!(name, owner = ?self.owner, domain, "named query not found");
            return Ok(None);
        };
        debug!(name, text = %query.text, "expanding named query");

        stack.push(name.to_owned());
        let parsed = self.parse_text(&query.text, stack);
        stack.pop();

        match parsed {
            Ok(node) => Ok(Some(node.named(name))),
            Err(err @ ParseError::CyclicReference { .. }) => Err(err),
            Err(source) => Err(ParseError::NamedQuery {
                name: name.to_owned(),
                source: Box::new(source),
            }),
        }
    }

    fn rule(&self, tokens: &Tokens<'_>, index: usize) -> Step {
        let Some(token) = tokens.get(index) else {
            return Ok(None);
        };
        if self.registry.is_valid_field(token) {
            return self.field_rule(tokens, index, token);
        }
        if is_structural(token) {
            return Ok(None);
        }
        if tokens.get(index + 1).and_then(Operator::from_token).is_some() {
            return Err(ParseError::UnknownField {
                field: token.to_owned(),
            });
        }

        let (operator, value) = literal::full_text_value(self.registry, token)?;
        tokens.reach(index + 1);
        let field = self.registry.default_full_text_field();
        Ok(Some((index + 1, Rule::new(field, operator, value).into())))
    }

    fn field_rule(&self, tokens: &Tokens<'_>, index: usize, field: &str) -> Step {
        let Some(op_token) = tokens.get(index + 1) else {
            return Ok(None);
        };
        let Some(operator) = Operator::from_token(op_token) else {
            return Ok(None);
        };
        if !self.registry.allows(field, operator) {
            return Err(ParseError::OperatorNotAllowed {
                field: field.to_owned(),
                operator,
            });
        }

        if operator == Operator::Exists {
            tokens.reach(index + 2);
            let present = !op_token.starts_with('!');
            let rule = Rule::new(field, operator, RuleValue::Bool(present));
            return Ok(Some((index + 2, rule.into())));
        }

        let Some(raw) = tokens.get(index + 2).filter(|t| !is_structural(t)) else {
            return Err(ParseError::MissingValue {
                field: field.to_owned(),
                operator,
            });
        };
        let value = literal::field_value(self.registry, field, operator, raw)?;
        tokens.reach(index + 3);
        Ok(Some((index + 3, Rule::new(field, operator, value).into())))
    }
}

/// Punctuation, connectors and operators: tokens that can never be a value.
fn is_structural(token: &str) -> bool {
    matches!(token, "(" | ")" | "&" | "|" | "!") || Operator::from_token(token).is_some()
}

/// An identifier with at least one upper-case letter and otherwise only
/// upper-case letters, digits and underscores.
pub(crate) fn is_named_ref(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn unconsumed(tokens: &Tokens<'_>, index: usize) -> ParseError {
    match tokens.get(index) {
        Some(token) => ParseError::Unconsumed {
            index,
            token: token.to_owned(),
        },
        None => ParseError::Incomplete {
            index: tokens.len().saturating_sub(1),
        },
    }
}
