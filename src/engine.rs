use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::parse::grammar::Parser;
use crate::parse::{ParseError, Tokenizer};
use crate::resolve::{NamedQueryResolver, NoResolver};
use crate::types::{CompileError, FieldSpecRegistry, Ruleset, SpecDocument, SpecError};
use crate::BqlError;

/// A BQL engine for one domain: parse, render and compile against a single
/// field-spec registry.
///
/// The registry and tokenizer are built once and shared; clones are cheap and
/// an engine can be used from many threads at once.
///
/// ```
/// use bql::Bql;
///
/// let bql = Bql::from_spec_str(r#"{
///     "domain": "people",
///     "fields": {
///         "sign": { "type": "category" },
///         "isAlive": { "type": "boolean" }
///     }
/// }"#).unwrap();
///
/// let ruleset = bql.parse("sign = leo & isAlive = true").unwrap();
/// assert_eq!(bql.render(&ruleset), "sign = leo & isAlive = true");
/// let query = bql.compile(&ruleset).unwrap();
/// assert!(query["bool"]["must"].is_array());
/// ```
#[derive(Debug, Clone)]
pub struct Bql {
    registry: Arc<FieldSpecRegistry>,
    tokenizer: Arc<Tokenizer>,
}

impl Bql {
    /// Build an engine over an existing registry.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Pattern`] if the field names cannot be compiled
    /// into the token pattern.
    pub fn from_registry(registry: FieldSpecRegistry) -> Result<Self, SpecError> {
        let tokenizer = Tokenizer::new(&registry)?;
        Ok(Self {
            registry: Arc::new(registry),
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// # Errors
    ///
    /// Returns [`SpecError`] if the document is not a valid field spec.
    pub fn from_document(doc: &SpecDocument) -> Result<Self, SpecError> {
        Self::from_registry(FieldSpecRegistry::from_document(doc)?)
    }

    /// Build an engine from a JSON field-spec resource.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] for malformed JSON or an invalid spec.
    pub fn from_spec_str(json: &str) -> Result<Self, SpecError> {
        Self::from_registry(FieldSpecRegistry::from_json(json)?)
    }

    /// Read a JSON field-spec file and build an engine from it.
    ///
    /// # Errors
    ///
    /// Returns [`BqlError`] on I/O failure or an invalid spec.
    pub fn from_spec_file(path: impl AsRef<Path>) -> Result<Self, BqlError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_spec_str(&json)?)
    }

    #[must_use]
    pub fn registry(&self) -> &FieldSpecRegistry {
        &self.registry
    }

    /// Split `text` into tokens without parsing it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] or [`ParseError::Empty`].
    pub fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<&'a str>, ParseError> {
        self.tokenizer.tokenize(text)
    }

    /// Parse `text` with no named queries available.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for malformed text or rules that do not fit the
    /// registry.
    pub fn parse(&self, text: &str) -> Result<Ruleset, ParseError> {
        self.parse_with(text, &NoResolver, None)
    }

    /// Parse `text`, expanding upper-case references through `resolver` on
    /// behalf of `owner`.
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus [`ParseError::CyclicReference`] and
    /// [`ParseError::NamedQuery`] for problems inside named queries.
    pub fn parse_with(
        &self,
        text: &str,
        resolver: &dyn NamedQueryResolver,
        owner: Option<&str>,
    ) -> Result<Ruleset, ParseError> {
        Parser {
            registry: &self.registry,
            tokenizer: &self.tokenizer,
            resolver,
            owner,
        }
        .parse(text)
    }

    /// Render `ruleset` as canonical BQL text.
    #[must_use]
    pub fn render(&self, ruleset: &Ruleset) -> String {
        crate::render::render(&self.registry, ruleset)
    }

    /// Compile `ruleset` into a query DSL document.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for trees that do not fit the registry.
    pub fn compile(&self, ruleset: &Ruleset) -> Result<Value, CompileError> {
        crate::compile::compile(&self.registry, ruleset)
    }

    /// Parse and compile in one step.
    ///
    /// # Errors
    ///
    /// Returns [`BqlError::Parse`] or [`BqlError::Compile`].
    pub fn compile_text(&self, text: &str) -> Result<Value, BqlError> {
        let ruleset = self.parse(text)?;
        Ok(self.compile(&ruleset)?)
    }

    /// Render a ruleset given in its JSON interchange shape.
    ///
    /// # Errors
    ///
    /// Returns [`BqlError::NullArgument`] for `null` and [`BqlError::Json`]
    /// if the value is not a ruleset.
    pub fn render_json(&self, ruleset: &Value) -> Result<String, BqlError> {
        let ruleset = from_interchange(ruleset)?;
        Ok(self.render(&ruleset))
    }

    /// Compile a ruleset given in its JSON interchange shape.
    ///
    /// # Errors
    ///
    /// As [`render_json`](Self::render_json), plus [`BqlError::Compile`].
    pub fn compile_json(&self, ruleset: &Value) -> Result<Value, BqlError> {
        let ruleset = from_interchange(ruleset)?;
        Ok(self.compile(&ruleset)?)
    }
}

fn from_interchange(value: &Value) -> Result<Ruleset, BqlError> {
    if value.is_null() {
        return Err(BqlError::NullArgument);
    }
    Ok(Ruleset::deserialize(value)?)
}
