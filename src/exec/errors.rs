use thiserror::Error;

use crate::type_registry::TypeRegistryError;

/// Failures during statement execution or row materialization. These abort
/// the current result sequence; they never touch shared caches, and the
/// core never retries a failed statement (retry policy belongs to the
/// connection layer).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("Statement execution failed: {0}")]
    Driver(String),
    #[error("Execution canceled")]
    Canceled,
    #[error("Row has {found} columns but the statement shape expects {expected}")]
    RowShapeMismatch { expected: usize, found: usize },
    #[error("No binding supplied for parameter {0}")]
    MissingParameterBinding(String),
    #[error(transparent)]
    Type(#[from] TypeRegistryError),
}
