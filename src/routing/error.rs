//! Routing error taxonomy.
//!
//! # Design Decisions
//! - A request path that matches nothing is not an error (`Resolution::NotFound`)
//! - Collaborator failures stay distinct from "no route" so callers can tell
//!   an empty routing table from an unavailable content store

use thiserror::Error;

/// Errors raised while compiling a path template into a matcher.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Unbalanced or nested braces, or a placeholder without a keyword name.
    #[error("malformed placeholder in rule \"{pattern}\" at byte {position}")]
    MalformedPlaceholder { pattern: String, position: usize },

    /// A placeholder references a keyword the route family does not define.
    #[error("route \"{route_id}\" references unknown keyword \"{keyword}\"")]
    UnknownKeyword { route_id: String, keyword: String },

    /// The same keyword appears twice in one rule.
    #[error("route \"{route_id}\" uses keyword \"{keyword}\" more than once")]
    DuplicateKeyword { route_id: String, keyword: String },

    /// The synthesized pattern was rejected by the regex engine.
    #[error("route \"{route_id}\" produced an invalid pattern: {source}")]
    InvalidPattern {
        route_id: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised when a custom rule is checked against its route family.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule for route \"{route_id}\" is missing required keyword(s): {}", keywords.join(", "))]
    MissingKeywords {
        route_id: String,
        keywords: Vec<String>,
    },

    #[error("no default route family named \"{route_id}\"")]
    UnknownRoute { route_id: String },
}

/// Failure reported by an external collaborator (definition provider or
/// entity URL resolver).
#[derive(Debug, Clone, Error)]
#[error("{collaborator} unavailable: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }
}

/// Top-level routing error.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reverse build was asked for a route without one of its required values.
    #[error("missing required parameter \"{keyword}\" for route \"{route_id}\"")]
    MissingParameter { route_id: String, keyword: String },

    /// The entity resolver has no canonical URL for the entity.
    #[error("no canonical url for {entity} #{id}")]
    UnknownEntity { entity: String, id: String },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
