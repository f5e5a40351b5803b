//! RDF terms: resources, literals and the object-position union.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource: an IRI or a blank node.
///
/// Resources appear in the subject and predicate positions of a
/// [`Statement`](crate::Statement) and name graphs ([`Context`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// A full IRI, stored in lexical form.
    Iri(String),
    /// A blank node with a store-local label.
    Blank(String),
}

impl Resource {
    /// Create an IRI resource.
    pub fn iri(value: impl Into<String>) -> Self {
        Resource::Iri(value.into())
    }

    /// Create a blank node resource.
    pub fn blank(label: impl Into<String>) -> Self {
        Resource::Blank(label.into())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Iri(iri) => write!(f, "<{}>", iri),
            Resource::Blank(label) => write!(f, "_:{}", label),
        }
    }
}

/// An RDF literal: lexical form plus optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// The lexical form of the value.
    pub lexical: String,
    /// Datatype IRI, if typed.
    pub datatype: Option<String>,
    /// Language tag, if tagged. Mutually exclusive with `datatype` in
    /// well-formed RDF; this layer stores whatever it is given.
    pub language: Option<String>,
}

impl Literal {
    /// A plain literal with neither datatype nor language tag.
    pub fn plain(lexical: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal.
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// A language-tagged literal.
    pub fn tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lexical)?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)?;
        } else if let Some(dt) = &self.datatype {
            write!(f, "^^<{}>", dt)?;
        }
        Ok(())
    }
}

/// The object position of a statement: a resource or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A resource object.
    Resource(Resource),
    /// A literal object.
    Literal(Literal),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Resource(r) => r.fmt(f),
            Term::Literal(l) => l.fmt(f),
        }
    }
}

impl From<Resource> for Term {
    fn from(r: Resource) -> Self {
        Term::Resource(r)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

/// A named graph identifier.
///
/// `None` in a [`Statement`](crate::Statement) context field means the
/// default graph.
pub type Context = Resource;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_display() {
        assert_eq!(Resource::iri("http://example.org/a").to_string(), "<http://example.org/a>");
        assert_eq!(Resource::blank("b1").to_string(), "_:b1");
    }

    #[test]
    fn literal_display_variants() {
        assert_eq!(Literal::plain("hi").to_string(), "\"hi\"");
        assert_eq!(Literal::tagged("hi", "en").to_string(), "\"hi\"@en");
        assert_eq!(
            Literal::typed("1", "http://www.w3.org/2001/XMLSchema#int").to_string(),
            "\"1\"^^<http://www.w3.org/2001/XMLSchema#int>"
        );
    }

    #[test]
    fn terms_round_trip_through_serde() {
        let term = Term::Literal(Literal::tagged("bonjour", "fr"));
        let json = serde_json::to_string(&term).unwrap();
        let back: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(term, back);
    }
}
