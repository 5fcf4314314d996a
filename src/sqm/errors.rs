use thiserror::Error;

use crate::domain_model::errors::DomainModelError;

/// Compile-time interpretation failures. Everything here aborts the current
/// compilation; nothing partial is ever published to shared caches.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    #[error("Unknown identification variable '{alias}' (declare it in FROM or JOIN)")]
    UnknownAlias { alias: String },
    #[error("Could not resolve attribute '{attribute}' of '{owner}' (in path '{path}')")]
    UnknownAttribute {
        owner: String,
        attribute: String,
        path: String,
    },
    #[error("Illegal attempt to dereference path '{path}': '{through}' is a terminal {kind} and cannot be navigated")]
    IllegalPathDereference {
        path: String,
        through: String,
        kind: String,
    },
    #[error("Illegal attempt to dereference an entity-type literal (TYPE(..) is terminal, in '{path}')")]
    EntityTypeLiteralDereference { path: String },
    #[error("Plural path '{path}' is only valid as a join target, not as an expression")]
    PluralPathNotAllowed { path: String },
    #[error("Join path '{path}' does not reference an association")]
    JoinPathNotAnAssociation { path: String },
    #[error("Duplicate identification variable '{alias}'")]
    DuplicateAlias { alias: String },
    #[error("Join depth {depth} exceeds the configured maximum of {max}")]
    JoinDepthExceeded { depth: usize, max: usize },
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("Function '{function}' expects {expected} arguments, but found {found}")]
    ArgumentCountMismatch {
        function: String,
        expected: String,
        found: usize,
    },
    #[error("Parameter {position} of function '{function}()' requires {expected}, but the argument is of type '{found}'")]
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: String,
        found: String,
    },
    #[error("Operand of '{operator}' must be numeric, but '{found}' is not")]
    NonNumericOperand { operator: String, found: String },
    #[error("Cannot determine the type of a bare NULL literal here (give it a typed context)")]
    UntypableNullLiteral,
    #[error("Expected a predicate, but found value expression '{found}'")]
    NotAPredicate { found: String },
    #[error("Expected a value expression, but found predicate-like construct")]
    NotAValueExpression,
    #[error("Cannot compare '{lhs}' with '{rhs}'")]
    IncomparableTypes { lhs: String, rhs: String },
    #[error("Assignment target '{path}' is not a writable basic or to-one attribute")]
    InvalidAssignmentTarget { path: String },
    #[error("INSERT target '{path}' must name an attribute of '{entity}'")]
    InvalidInsertTarget { entity: String, path: String },
    #[error("INSERT value tuple has {found} values but {expected} target columns")]
    InsertTupleArityMismatch { expected: usize, found: usize },
    #[error(transparent)]
    DomainModel(#[from] DomainModelError),
}
