use regex::Regex;
use tracing::trace;

use super::error::ParseError;
use crate::types::FieldSpecRegistry;

/// What may follow a field name or keyword operator for it to count as one.
const BOUNDARY: &str = r#"(?:[\s()"&|!=<>,]|$)"#;

/// One item of an `IN` list: quoted string, regex literal or bare word.
const LIST_ITEM: &str = r#"(?:"(?:[^"\\]|\\.)*"|/(?:[^/\\]|\\.)+/i?|[^\s,()"&|!=<>]+)"#;

/// Splits BQL text into tokens with a single alternation built from the
/// registry's field names.
///
/// Alternatives are tried in order at each position, so literals win over
/// bare words and an `IN` keyword followed by a parenthesized list is captured
/// before the list's parenthesis could be taken as a group. Field names and
/// keyword operators only count when a delimiter or the end of input follows,
/// so `sign-up` is one word even when `sign` is a field.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    /// Compile the token pattern for the fields in `registry`.
    ///
    /// # Errors
    ///
    /// Returns the regex build error if the composed pattern is rejected.
    pub fn new(registry: &FieldSpecRegistry) -> Result<Self, regex::Error> {
        let mut names: Vec<&str> = registry.fields();
        // Longest first so a field is never shadowed by one of its prefixes.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let fields = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = [
            format!(r"(?P<inop>(?i:!?in))\s*(?P<inlist>\(\s*{LIST_ITEM}(?:\s*,\s*{LIST_ITEM})*\s*\))"),
            r"(?P<paren>[()])".to_owned(),
            r#"(?P<quoted>"(?:[^"\\]|\\.)*")"#.to_owned(),
            r"(?P<regex>/(?:[^/\\]|\\.)+/i?)".to_owned(),
            format!(r"(?P<field>\b(?:{fields})){BOUNDARY}"),
            format!(r"(?P<keyword>(?i:!?(?:contains|like|exists))){BOUNDARY}"),
            r"(?P<op>>=|<=|!=|=|>|<)".to_owned(),
            r"(?P<conn>[&|!])".to_owned(),
            r#"(?P<word>[^\s()"&|!=<>,]+)"#.to_owned(),
        ]
        .join("|");

        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Split `input` into tokens.
    ///
    /// # Errors
    ///
    /// [`ParseError::Syntax`] if any non-whitespace text is not covered by a
    /// token, [`ParseError::Empty`] if no tokens are found.
    pub fn tokenize<'a>(&self, input: &'a str) -> Result<Vec<&'a str>, ParseError> {
        let mut tokens = Vec::new();
        let mut last_end = 0;

        // The boundary after a field or keyword is matched but not consumed.
        while let Some(caps) = self.pattern.captures_at(input, last_end) {
            let Some(whole) = caps.get(0).filter(|m| !m.is_empty()) else {
                break;
            };
            check_gap(input, last_end, whole.start())?;

            let bounded = caps
                .name("field")
                .or_else(|| caps.name("keyword"))
                .filter(|m| !m.is_empty());

            if let (Some(op), Some(list)) = (caps.name("inop"), caps.name("inlist")) {
                tokens.push(op.as_str());
                tokens.push(list.as_str());
                last_end = whole.end();
            } else if let Some(token) = bounded {
                tokens.push(token.as_str());
                last_end = token.end();
            } else {
                tokens.push(whole.as_str());
                last_end = whole.end();
            }
        }
        check_gap(input, last_end, input.len())?;

        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        trace!(count = tokens.len(), ?tokens, "tokenized query");
        Ok(tokens)
    }
}

/// Text between two tokens may only be whitespace.
fn check_gap(input: &str, start: usize, end: usize) -> Result<(), ParseError> {
    let gap = &input[start..end];
    let trimmed = gap.trim_start();
    if trimmed.is_empty() {
        return Ok(());
    }
    Err(ParseError::Syntax {
        offset: start + (gap.len() - trimmed.len()),
        fragment: trimmed.trim_end().to_owned(),
    })
}
