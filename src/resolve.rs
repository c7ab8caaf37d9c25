//! Lookup of named queries (macros) referenced from BQL text.
//!
//! Resolution is synchronous: the parser calls the resolver inline while it
//! walks the token stream. Back a resolver with a cache or an in-memory
//! snapshot if the named queries live in a remote store.

use std::collections::HashMap;

/// The stored BQL text of a named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub text: String,
}

impl NamedQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Looks up a named query by name, owner and domain.
///
/// Returning `None` is not an error: the parser then treats the token as a
/// plain full-text term.
pub trait NamedQueryResolver {
    fn resolve(&self, name: &str, owner: Option<&str>, domain: &str) -> Option<NamedQuery>;
}

/// Resolver that knows no named queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl NamedQueryResolver for NoResolver {
    fn resolve(&self, _name: &str, _owner: Option<&str>, _domain: &str) -> Option<NamedQuery> {
        None
    }
}

impl<F> NamedQueryResolver for F
where
    F: Fn(&str, Option<&str>, &str) -> Option<NamedQuery>,
{
    fn resolve(&self, name: &str, owner: Option<&str>, domain: &str) -> Option<NamedQuery> {
        self(name, owner, domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    domain: String,
    owner: Option<String>,
    name: String,
}

/// In-memory resolver keyed by domain, owner and name.
///
/// An owner's private query shadows a shared query of the same name.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    queries: HashMap<Key, NamedQuery>,
}

impl MapResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query visible to every owner in `domain`.
    pub fn insert(&mut self, domain: &str, name: &str, text: &str) {
        self.queries.insert(
            Key {
                domain: domain.to_owned(),
                owner: None,
                name: name.to_owned(),
            },
            NamedQuery::new(text),
        );
    }

    /// Register a query visible only to `owner`.
    pub fn insert_for_owner(&mut self, domain: &str, owner: &str, name: &str, text: &str) {
        self.queries.insert(
            Key {
                domain: domain.to_owned(),
                owner: Some(owner.to_owned()),
                name: name.to_owned(),
            },
            NamedQuery::new(text),
        );
    }

    #[must_use]
    pub fn with(mut self, domain: &str, name: &str, text: &str) -> Self {
        self.insert(domain, name, text);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, domain: &str, owner: &str, name: &str, text: &str) -> Self {
        self.insert_for_owner(domain, owner, name, text);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    fn get(&self, domain: &str, owner: Option<&str>, name: &str) -> Option<&NamedQuery> {
        self.queries.get(&Key {
            domain: domain.to_owned(),
            owner: owner.map(str::to_owned),
            name: name.to_owned(),
        })
    }
}

impl NamedQueryResolver for MapResolver {
    fn resolve(&self, name: &str, owner: Option<&str>, domain: &str) -> Option<NamedQuery> {
        owner
            .and_then(|owner| self.get(domain, Some(owner), name))
            .or_else(|| self.get(domain, None, name))
            .cloned()
    }
}
