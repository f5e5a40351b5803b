//! Statements and the wildcard patterns used for reads and removes.

use crate::error::{ModelError, PatternField};
use crate::term::{Context, Resource, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete statement: every field fully specified.
///
/// Adds require a `Statement`; wildcard positions are only meaningful for
/// reads and removes, which take a [`StatementPattern`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Subject resource.
    pub subject: Resource,
    /// Predicate resource.
    pub predicate: Resource,
    /// Object term.
    pub object: Term,
    /// Graph this statement lives in; `None` is the default graph.
    pub context: Option<Context>,
}

impl Statement {
    /// Create a statement in the default graph.
    pub fn new(subject: Resource, predicate: Resource, object: impl Into<Term>) -> Self {
        Statement {
            subject,
            predicate,
            object: object.into(),
            context: None,
        }
    }

    /// Create a statement in a named graph.
    pub fn in_context(
        subject: Resource,
        predicate: Resource,
        object: impl Into<Term>,
        context: Context,
    ) -> Self {
        Statement {
            subject,
            predicate,
            object: object.into(),
            context: Some(context),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(context) = &self.context {
            write!(f, " {}", context)?;
        }
        Ok(())
    }
}

/// Selects which graph(s) a pattern applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextMatch {
    /// Match statements in any graph, named or default.
    #[default]
    Any,
    /// Match only statements in the default graph.
    Default,
    /// Match only statements in the named graph.
    Exactly(Context),
}

impl ContextMatch {
    /// Whether this selector matches a statement's context field.
    pub fn matches(&self, context: &Option<Context>) -> bool {
        match self {
            ContextMatch::Any => true,
            ContextMatch::Default => context.is_none(),
            ContextMatch::Exactly(c) => context.as_ref() == Some(c),
        }
    }
}

/// A wildcard statement pattern.
///
/// `None` in any position matches every value for that position. Patterns
/// drive reads and removes; they can never be added. Converting a pattern to
/// a concrete [`Statement`] with [`StatementPattern::require_concrete`] fails
/// on the first wildcard position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementPattern {
    /// Subject to match, or any subject.
    pub subject: Option<Resource>,
    /// Predicate to match, or any predicate.
    pub predicate: Option<Resource>,
    /// Object to match, or any object.
    pub object: Option<Term>,
    /// Graph selector.
    pub context: ContextMatch,
}

impl StatementPattern {
    /// The pattern matching every statement in every graph.
    pub fn any() -> Self {
        StatementPattern::default()
    }

    /// The pattern matching exactly one concrete statement.
    pub fn of_statement(statement: &Statement) -> Self {
        StatementPattern {
            subject: Some(statement.subject.clone()),
            predicate: Some(statement.predicate.clone()),
            object: Some(statement.object.clone()),
            context: match &statement.context {
                Some(c) => ContextMatch::Exactly(c.clone()),
                None => ContextMatch::Default,
            },
        }
    }

    /// Restrict this pattern to a named graph.
    pub fn in_context(mut self, context: Context) -> Self {
        self.context = ContextMatch::Exactly(context);
        self
    }

    /// Restrict this pattern to the default graph.
    pub fn in_default_graph(mut self) -> Self {
        self.context = ContextMatch::Default;
        self
    }

    /// Set the subject to match.
    pub fn with_subject(mut self, subject: Resource) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Set the predicate to match.
    pub fn with_predicate(mut self, predicate: Resource) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Set the object to match.
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Whether this pattern matches a concrete statement.
    pub fn matches(&self, statement: &Statement) -> bool {
        self.subject
            .as_ref()
            .map_or(true, |s| *s == statement.subject)
            && self
                .predicate
                .as_ref()
                .map_or(true, |p| *p == statement.predicate)
            && self.object.as_ref().map_or(true, |o| *o == statement.object)
            && self.context.matches(&statement.context)
    }

    /// Convert into a concrete statement, rejecting wildcard positions.
    ///
    /// This is the checkpoint for callers that receive possibly-wildcard
    /// fields (the RPC surface does): adds go through here, reads and
    /// removes do not. A [`ContextMatch::Any`] selector converts to the
    /// default graph, matching the convention that an add with no explicit
    /// graph targets the default graph.
    pub fn require_concrete(&self) -> Result<Statement, ModelError> {
        let subject = self
            .subject
            .clone()
            .ok_or(ModelError::Wildcard(PatternField::Subject))?;
        let predicate = self
            .predicate
            .clone()
            .ok_or(ModelError::Wildcard(PatternField::Predicate))?;
        let object = self
            .object
            .clone()
            .ok_or(ModelError::Wildcard(PatternField::Object))?;
        let context = match &self.context {
            ContextMatch::Any | ContextMatch::Default => None,
            ContextMatch::Exactly(c) => Some(c.clone()),
        };
        Ok(Statement {
            subject,
            predicate,
            object,
            context,
        })
    }
}

impl From<&Statement> for StatementPattern {
    fn from(statement: &Statement) -> Self {
        StatementPattern::of_statement(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    fn st(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(
            Resource::iri(s),
            Resource::iri(p),
            Literal::plain(o),
        )
    }

    #[test]
    fn any_pattern_matches_everything() {
        let pattern = StatementPattern::any();
        assert!(pattern.matches(&st("s", "p", "o")));
        assert!(pattern.matches(&Statement::in_context(
            Resource::iri("s"),
            Resource::iri("p"),
            Literal::plain("o"),
            Resource::iri("g"),
        )));
    }

    #[test]
    fn context_selectors() {
        let in_default = st("s", "p", "o");
        let in_named = Statement::in_context(
            Resource::iri("s"),
            Resource::iri("p"),
            Literal::plain("o"),
            Resource::iri("g"),
        );

        let default_only = StatementPattern::any().in_default_graph();
        assert!(default_only.matches(&in_default));
        assert!(!default_only.matches(&in_named));

        let named_only = StatementPattern::any().in_context(Resource::iri("g"));
        assert!(!named_only.matches(&in_default));
        assert!(named_only.matches(&in_named));
    }

    #[test]
    fn field_wildcards_match_any_value() {
        let pattern = StatementPattern::any().with_predicate(Resource::iri("p"));
        assert!(pattern.matches(&st("s1", "p", "o1")));
        assert!(pattern.matches(&st("s2", "p", "o2")));
        assert!(!pattern.matches(&st("s1", "q", "o1")));
    }

    #[test]
    fn require_concrete_rejects_each_wildcard_position() {
        let full = StatementPattern::of_statement(&st("s", "p", "o"));
        assert!(full.require_concrete().is_ok());

        let mut missing_subject = full.clone();
        missing_subject.subject = None;
        assert_eq!(
            missing_subject.require_concrete(),
            Err(ModelError::Wildcard(PatternField::Subject))
        );

        let mut missing_predicate = full.clone();
        missing_predicate.predicate = None;
        assert_eq!(
            missing_predicate.require_concrete(),
            Err(ModelError::Wildcard(PatternField::Predicate))
        );

        let mut missing_object = full;
        missing_object.object = None;
        assert_eq!(
            missing_object.require_concrete(),
            Err(ModelError::Wildcard(PatternField::Object))
        );
    }

    #[test]
    fn require_concrete_maps_any_context_to_default_graph() {
        let pattern = StatementPattern::of_statement(&st("s", "p", "o"));
        let statement = pattern.require_concrete().unwrap();
        assert_eq!(statement.context, None);
    }
}
